//! Programmatic form of the command line. Each command returns the JSON the REST API would
//! answer with, so scripted and HTTP use look the same.

use crate::http::dto::{DeletedDto, Envelope, ListResponse, UserDto};
use crate::users::{AddressInput, ListParams, NewUser, Role, Status, UserError, UserPatch, UserService};
use fake::Fake;
use fake::faker::address::en::{CityName, StateAbbr, StreetName};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum Command {
    List(ListParams),
    Stats,
    Get { id: String },
    Create { json: String },
    Update { id: String, json: String },
    Delete { id: String },
    Seed { count: usize },
}

fn parse_body<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, UserError> {
    serde_json::from_str(json).map_err(|e| UserError::validation("body", e.to_string()))
}

fn to_value<T: serde::Serialize>(v: &T) -> Result<Value, UserError> {
    serde_json::to_value(v).map_err(|e| UserError::store(e.to_string()))
}

/// One synthetic user; `n` keeps generated emails distinct.
#[must_use]
pub fn fake_user(n: usize) -> NewUser {
    let email: String = SafeEmail().fake();
    NewUser {
        name: Some(Name().fake()),
        email: Some(format!("{n}.{email}")),
        age: Some((18..90).fake::<i64>()),
        address: Some(AddressInput {
            street: Some(format!("{} {}", (1..9999).fake::<u32>(), StreetName().fake::<String>())),
            city: Some(CityName().fake()),
            state: Some(StateAbbr().fake()),
            country: None,
            zip_code: Some(format!("{:05}", (0..100_000).fake::<u32>())),
        }),
        phone: Some(PhoneNumber().fake()),
        avatar: None,
        status: Some(Status::ALL[(0..Status::ALL.len()).fake::<usize>()]),
        role: Some(Role::ALL[(0..Role::ALL.len()).fake::<usize>()]),
    }
}

/// Runs `cmd` against `service`.
///
/// # Errors
/// Whatever the underlying service call fails with; malformed JSON input is a validation error.
pub async fn run(service: &UserService, cmd: Command) -> Result<Value, UserError> {
    match cmd {
        Command::List(params) => {
            let page = service.list_users(&params).await?;
            to_value(&ListResponse::from(&page))
        }
        Command::Stats => to_value(&Envelope::ok(service.stats().await?)),
        Command::Get { id } => {
            let user = service.get_user(&id).await?;
            to_value(&Envelope::ok(UserDto::from(&user)))
        }
        Command::Create { json } => {
            let user = service.create_user(parse_body(&json)?).await?;
            to_value(&Envelope::with_message("User created successfully", UserDto::from(&user)))
        }
        Command::Update { id, json } => {
            let patch: UserPatch = parse_body(&json)?;
            let user = service.update_user(&id, patch).await?;
            to_value(&Envelope::with_message("User updated successfully", UserDto::from(&user)))
        }
        Command::Delete { id } => {
            let id = service.delete_user(&id).await?;
            to_value(&Envelope::with_message("User deleted successfully", DeletedDto { id: id.to_string() }))
        }
        Command::Seed { count } => {
            let mut created = 0usize;
            for n in 0..count {
                match service.create_user(fake_user(n)).await {
                    Ok(_) => created += 1,
                    // a rerun may collide with earlier seeds
                    Err(UserError::Conflict { email, .. }) => log::warn!("seed: skipping taken email {email}"),
                    Err(e) => return Err(e),
                }
            }
            log::info!("seeded {created} users");
            to_value(&serde_json::json!({"success": true, "data": {"created": created}}))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::users::ServiceSettings;
    use crate::users::validation::build_user;

    fn service() -> UserService {
        UserService::new(&Database::in_memory(), ServiceSettings::default()).unwrap()
    }

    #[test]
    fn fake_users_are_valid() {
        for n in 0..50 {
            let now = chrono::Utc::now();
            build_user(fake_user(n), crate::types::DocumentId::new(), now, now).unwrap();
        }
    }

    #[tokio::test]
    async fn seed_then_list_and_stats() {
        let svc = service();
        let out = run(&svc, Command::Seed { count: 12 }).await.unwrap();
        assert_eq!(out["data"]["created"], 12);
        let params = ListParams { limit: Some("5".into()), ..ListParams::default() };
        let list = run(&svc, Command::List(params)).await.unwrap();
        assert_eq!(list["count"], 5);
        assert_eq!(list["pagination"]["pages"], 3);
        let stats = run(&svc, Command::Stats).await.unwrap();
        assert_eq!(stats["data"]["totalUsers"], 12);
    }

    #[tokio::test]
    async fn create_update_delete_by_json() {
        let svc = service();
        let body = r#"{"name":"Zoe","email":"zoe@x.io","address":{"street":"1 A","city":"Oslo"}}"#;
        let created = run(&svc, Command::Create { json: body.into() }).await.unwrap();
        let id = created["data"]["_id"].as_str().unwrap().to_string();
        let updated = run(&svc, Command::Update { id: id.clone(), json: r#"{"age":44}"#.into() }).await.unwrap();
        assert_eq!(updated["data"]["age"], 44);
        let deleted = run(&svc, Command::Delete { id: id.clone() }).await.unwrap();
        assert_eq!(deleted["data"]["id"], id);
        assert!(matches!(run(&svc, Command::Get { id }).await, Err(UserError::NotFound { .. })));
        assert!(matches!(
            run(&svc, Command::Create { json: "{".into() }).await,
            Err(UserError::Validation(_))
        ));
    }
}
