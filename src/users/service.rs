use super::error::UserError;
use super::listing::ListParams;
use super::model::{NewUser, User, UserPatch, now_millis};
use super::pagination::{PageLimits, Pagination};
use super::stats::{DEFAULT_TOP_CITIES, UserStats, city_groups, status_groups};
use super::validation::{build_user, normalize_email};
use crate::Database;
use crate::collection::Collection;
use crate::document::Document;
use crate::query::{Filter, FindOptions, count_docs, find_docs, find_one, group_docs};
use crate::types::DocumentId;
use std::sync::Arc;

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub limits: PageLimits,
    pub top_cities: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { limits: PageLimits::default(), top_cities: DEFAULT_TOP_CITIES }
    }
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// User operations over the `users` collection.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<Collection>,
    settings: ServiceSettings,
}

fn parse_id(raw: &str) -> Result<DocumentId, UserError> {
    raw.parse().map_err(|_| UserError::not_found(raw))
}

fn to_user(doc: &Document) -> Result<User, UserError> {
    Ok(User::from_document(doc.id, &doc.data)?)
}

impl UserService {
    /// Binds to the `users` collection and makes sure `email` is uniquely indexed.
    ///
    /// # Errors
    /// `StoreUnavailable` if the database is closed; `Conflict` if stored data already holds
    /// duplicate emails.
    pub fn new(db: &Database, settings: ServiceSettings) -> Result<Self, UserError> {
        let users = db.collection(USERS_COLLECTION)?;
        users.ensure_unique_index("email")?;
        Ok(Self { users, settings })
    }

    #[must_use]
    pub const fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn email_owner(&self, email: &str) -> Result<Option<DocumentId>, UserError> {
        Ok(find_one(&self.users, &Filter::eq("email", email))?.map(|d| d.id))
    }

    pub async fn create_user(&self, input: NewUser) -> Result<User, UserError> {
        let now = now_millis();
        let user = build_user(input, DocumentId::new(), now, now)?;
        if self.email_owner(&user.email)?.is_some() {
            return Err(UserError::email_taken(user.email));
        }
        self.users.insert_document(Document::with_id(user.id, user.to_document()))?;
        log::info!("created user {} <{}>", user.id, user.email);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, UserError> {
        let doc_id = parse_id(id)?;
        let doc = self.users.find_document(&doc_id)?.ok_or_else(|| UserError::not_found(id))?;
        to_user(&doc)
    }

    /// Runs the page query and the count side by side, then assembles the summary.
    pub async fn list_users(&self, params: &ListParams) -> Result<UserPage, UserError> {
        let query = params.to_query(self.settings.limits)?;
        let opts = FindOptions {
            sort: Some(query.sort),
            skip: Some(query.window.skip()),
            limit: Some(query.window.limit),
        };
        let (find_col, count_col) = (self.users.clone(), self.users.clone());
        let (find_filter, count_filter) = (query.filter.clone(), query.filter);
        let (docs, total) = tokio::try_join!(
            tokio::task::spawn_blocking(move || find_docs(&find_col, &find_filter, &opts)),
            tokio::task::spawn_blocking(move || count_docs(&count_col, &count_filter)),
        )?;
        let users = docs?.iter().map(to_user).collect::<Result<Vec<_>, _>>()?;
        let pagination = Pagination::new(query.window, total?);
        log::debug!("listed {} of {} users (page {})", users.len(), pagination.total, pagination.page);
        Ok(UserPage { users, pagination })
    }

    /// Applies `patch`, re-validating the merged record. `createdAt` is kept; `updatedAt` moves.
    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User, UserError> {
        let current = self.get_user(id).await?;
        if let Some(email) = patch.email.as_deref().map(normalize_email)
            && email != current.email
            && self.email_owner(&email)?.is_some_and(|owner| owner != current.id)
        {
            return Err(UserError::email_in_use(email));
        }
        let merged = NewUser::from(&current).patched(patch);
        let updated = build_user(merged, current.id, current.created_at, now_millis())?;
        if !self.users.update_document(&current.id, updated.to_document()).map_err(UserError::on_update)? {
            return Err(UserError::not_found(id));
        }
        log::info!("updated user {}", updated.id);
        Ok(updated)
    }

    /// Removes the user and returns its identifier.
    pub async fn delete_user(&self, id: &str) -> Result<DocumentId, UserError> {
        let doc_id = parse_id(id)?;
        if !self.users.delete_document(&doc_id)? {
            return Err(UserError::not_found(id));
        }
        log::info!("deleted user {doc_id}");
        Ok(doc_id)
    }

    /// Status and city groupings, computed concurrently and merged.
    pub async fn stats(&self) -> Result<UserStats, UserError> {
        let (by_status, by_city) = (self.users.clone(), self.users.clone());
        let top = self.settings.top_cities;
        let (status_rows, city_rows) = tokio::try_join!(
            tokio::task::spawn_blocking(move || group_docs(&by_status, &Filter::True, &status_groups())),
            tokio::task::spawn_blocking(move || group_docs(&by_city, &Filter::True, &city_groups(top))),
        )?;
        Ok(UserStats::from_groups(&status_rows?, &city_rows?))
    }
}
