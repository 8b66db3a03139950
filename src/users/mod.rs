//! User records: model, validation, listing queries, statistics and the service tying them
//! to the store.

pub mod error;
pub mod listing;
pub mod model;
pub mod pagination;
pub mod service;
pub mod stats;
pub mod validation;

pub use error::{FieldError, UserError};
pub use listing::{ListParams, ListQuery, build_filter, parse_sort};
pub use model::{Address, AddressInput, NewUser, Role, Status, User, UserPatch};
pub use pagination::{PageLimits, PageWindow, Pagination};
pub use service::{ServiceSettings, USERS_COLLECTION, UserPage, UserService};
pub use stats::{CityStat, StatusStat, UserStats};
