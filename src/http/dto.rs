use crate::users::{Address, FieldError, Pagination, User, UserPage, UserStats};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    pub street: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

/// A user as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub address: AddressDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub avatar: String,
    pub status: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
    pub full_address: String,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&Address> for AddressDto {
    fn from(a: &Address) -> Self {
        Self {
            street: a.street.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            country: a.country.clone(),
            zip_code: a.zip_code.clone(),
        }
    }
}

impl From<&User> for UserDto {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name.clone(),
            email: u.email.clone(),
            age: u.age,
            address: AddressDto::from(&u.address),
            phone: u.phone.clone(),
            avatar: u.avatar.clone(),
            status: u.status.to_string(),
            role: u.role.to_string(),
            created_at: timestamp(u.created_at),
            updated_at: timestamp(u.updated_at),
            full_address: u.full_address(),
        }
    }
}

/// `{success, message?, data}`
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub const fn ok(data: T) -> Self {
        Self { success: true, message: None, data }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: Some(message.into()), data }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<UserDto>,
}

impl From<&UserPage> for ListResponse {
    fn from(page: &UserPage) -> Self {
        Self {
            success: true,
            count: page.users.len(),
            pagination: page.pagination,
            data: page.users.iter().map(UserDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedDto {
    pub id: String,
}

pub type StatsResponse = Envelope<UserStats>;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self { success: false, error: error.into(), details }
    }
}
