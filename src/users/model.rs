use crate::errors::DbError;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument, doc};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AGE: i32 = 18;
pub const DEFAULT_COUNTRY: &str = "USA";
pub const DEFAULT_AVATAR: &str = "https://ui-avatars.com/api/?name=Unknown&background=random";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::Active, Self::Inactive, Self::Suspended];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Moderator,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::User, Self::Admin, Self::Moderator];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
        }
    }
}

macro_rules! str_enum {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| format!("`{s}` is not a valid {}", $what))
            }
        }
    };
}

str_enum!(Status, "status");
str_enum!(Role, "role");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub zip_code: Option<String>,
}

/// A stored user record.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: DocumentId,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub address: Address,
    pub phone: Option<String>,
    pub avatar: String,
    pub status: Status,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// `"street, city, state zip, country"`; absent parts leave their slot empty.
    #[must_use]
    pub fn full_address(&self) -> String {
        let a = &self.address;
        format!(
            "{}, {}, {} {}, {}",
            a.street,
            a.city,
            a.state.as_deref().unwrap_or(""),
            a.zip_code.as_deref().unwrap_or(""),
            a.country
        )
        .trim()
        .to_string()
    }

    /// Document body as stored. The identifier lives on the store document, not in the body.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut address = doc! {
            "street": self.address.street.as_str(),
            "city": self.address.city.as_str(),
            "country": self.address.country.as_str(),
        };
        if let Some(state) = &self.address.state {
            address.insert("state", state.as_str());
        }
        if let Some(zip) = &self.address.zip_code {
            address.insert("zipCode", zip.as_str());
        }
        let mut d = doc! {
            "name": self.name.as_str(),
            "email": self.email.as_str(),
            "age": self.age,
            "address": address,
            "avatar": self.avatar.as_str(),
            "status": self.status.as_str(),
            "role": self.role.as_str(),
            "createdAt": to_bson_date(self.created_at),
            "updatedAt": to_bson_date(self.updated_at),
        };
        if let Some(phone) = &self.phone {
            d.insert("phone", phone.as_str());
        }
        d
    }

    /// Rebuilds a user from a stored body.
    ///
    /// # Errors
    /// `MalformedDocument` when a required field is missing or has the wrong type.
    pub fn from_document(id: DocumentId, d: &BsonDocument) -> Result<Self, DbError> {
        let address = match d.get("address") {
            Some(Bson::Document(a)) => a,
            _ => return Err(malformed(id, "address")),
        };
        Ok(Self {
            id,
            name: req_str(id, d, "name")?,
            email: req_str(id, d, "email")?,
            age: match d.get("age") {
                Some(Bson::Int32(n)) => *n,
                Some(Bson::Int64(n)) => i32::try_from(*n).map_err(|_| malformed(id, "age"))?,
                _ => return Err(malformed(id, "age")),
            },
            address: Address {
                street: req_str(id, address, "street")?,
                city: req_str(id, address, "city")?,
                state: opt_str(address, "state"),
                country: opt_str(address, "country").unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
                zip_code: opt_str(address, "zipCode"),
            },
            phone: opt_str(d, "phone"),
            avatar: opt_str(d, "avatar").unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            status: req_str(id, d, "status")?.parse().map_err(|_| malformed(id, "status"))?,
            role: req_str(id, d, "role")?.parse().map_err(|_| malformed(id, "role"))?,
            created_at: req_date(id, d, "createdAt")?,
            updated_at: req_date(id, d, "updatedAt")?,
        })
    }
}

fn malformed(id: DocumentId, field: &str) -> DbError {
    DbError::MalformedDocument(format!("{id}: bad or missing `{field}`"))
}

fn req_str(id: DocumentId, d: &BsonDocument, key: &str) -> Result<String, DbError> {
    d.get_str(key).map(str::to_string).map_err(|_| malformed(id, key))
}

fn opt_str(d: &BsonDocument, key: &str) -> Option<String> {
    d.get_str(key).ok().map(str::to_string)
}

fn req_date(id: DocumentId, d: &BsonDocument, key: &str) -> Result<DateTime<Utc>, DbError> {
    d.get_datetime(key)
        .ok()
        .and_then(|dt| DateTime::from_timestamp_millis(dt.timestamp_millis()))
        .ok_or_else(|| malformed(id, key))
}

/// Current time at the precision the store keeps.
#[must_use]
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

pub(crate) fn to_bson_date(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

/// Address fields as received; validation decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
}

/// Body of a create request. Every field is optional here so that validation can report all
/// missing ones at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub address: Option<AddressInput>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: Option<Status>,
    pub role: Option<Role>,
}

/// Partial update. Absent fields keep their current value; an `address` replaces the whole
/// address. Unknown fields (including `createdAt`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub address: Option<AddressInput>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: Option<Status>,
    pub role: Option<Role>,
}

impl From<&User> for NewUser {
    fn from(u: &User) -> Self {
        Self {
            name: Some(u.name.clone()),
            email: Some(u.email.clone()),
            age: Some(i64::from(u.age)),
            address: Some(AddressInput {
                street: Some(u.address.street.clone()),
                city: Some(u.address.city.clone()),
                state: u.address.state.clone(),
                country: Some(u.address.country.clone()),
                zip_code: u.address.zip_code.clone(),
            }),
            phone: u.phone.clone(),
            avatar: Some(u.avatar.clone()),
            status: Some(u.status),
            role: Some(u.role),
        }
    }
}

impl NewUser {
    /// Overlays `patch` on top of these fields.
    #[must_use]
    pub fn patched(self, patch: UserPatch) -> Self {
        Self {
            name: patch.name.or(self.name),
            email: patch.email.or(self.email),
            age: patch.age.or(self.age),
            address: patch.address.or(self.address),
            phone: patch.phone.or(self.phone),
            avatar: patch.avatar.or(self.avatar),
            status: patch.status.or(self.status),
            role: patch.role.or(self.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        let now = Utc::now();
        User {
            id: DocumentId::new(),
            name: "Ann Lee".into(),
            email: "ann@x.io".into(),
            age: 33,
            address: Address {
                street: "1 Main St".into(),
                city: "Austin".into(),
                state: Some("TX".into()),
                country: "USA".into(),
                zip_code: Some("73301".into()),
            },
            phone: None,
            avatar: DEFAULT_AVATAR.into(),
            status: Status::Inactive,
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn full_address_formats() {
        let mut u = sample();
        assert_eq!(u.full_address(), "1 Main St, Austin, TX 73301, USA");
        u.address.state = None;
        u.address.zip_code = None;
        assert_eq!(u.full_address(), "1 Main St, Austin,  , USA");
    }

    #[test]
    fn document_round_trip() {
        let u = sample();
        let d = u.to_document();
        assert_eq!(d.get_document("address").unwrap().get_str("zipCode").unwrap(), "73301");
        assert_eq!(d.get_str("status").unwrap(), "inactive");
        assert!(d.get("phone").is_none());
        let back = User::from_document(u.id, &d).unwrap();
        assert_eq!(back.name, u.name);
        assert_eq!(back.address, u.address);
        assert_eq!(back.role, Role::Admin);
        // bson datetimes keep millisecond precision
        assert_eq!(back.created_at.timestamp_millis(), u.created_at.timestamp_millis());
    }

    #[test]
    fn from_document_reports_missing_fields() {
        let err = User::from_document(DocumentId::new(), &doc! {"name": "x"}).unwrap_err();
        assert!(matches!(err, DbError::MalformedDocument(_)));
    }

    #[test]
    fn enums_parse_and_display() {
        assert_eq!("suspended".parse::<Status>().unwrap(), Status::Suspended);
        assert!("Active".parse::<Status>().is_err());
        assert_eq!(Role::Moderator.to_string(), "moderator");
    }

    #[test]
    fn patch_overlays_only_given_fields() {
        let base = NewUser::from(&sample());
        let merged = base.clone().patched(UserPatch { age: Some(40), ..UserPatch::default() });
        assert_eq!(merged.age, Some(40));
        assert_eq!(merged.name, base.name);
        assert_eq!(merged.address, base.address);
    }
}
