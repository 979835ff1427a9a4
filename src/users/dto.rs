use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::User;

/// Public part of the user returned to other clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub profile_picture: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id(),
            username: u.username().to_string(),
            name: u.name().to_string(),
            profile_picture: u.profile_picture().map(str::to_string),
        }
    }
}

/// Full profile of the authenticated user.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub utor_id: String,
    pub email: String,
    pub profile_picture: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub group_ids: Vec<Uuid>,
    pub workout_count: usize,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        let mut group_ids: Vec<Uuid> = u.groups().iter().copied().collect();
        group_ids.sort();
        Self {
            id: u.id(),
            username: u.username().to_string(),
            name: u.name().to_string(),
            utor_id: u.utor_id().to_string(),
            email: u.email().to_string(),
            profile_picture: u.profile_picture().map(str::to_string),
            created_at: u.created_at(),
            group_ids,
            workout_count: u.workouts().len(),
        }
    }
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub utor_id: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_serialization_has_no_password() {
        let user = User::new("alice", "Alice A", "alice1", "alice@example.com", "hash123");
        let json = serde_json::to_string(&UserProfile::from(&user)).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(json.contains("\"profile_picture\":\"Default\""));
        assert!(json.contains("\"workout_count\":0"));
        assert!(!json.contains("hash123"));
    }

    #[test]
    fn public_user_hides_contact_details() {
        let user = User::new("alice", "Alice A", "alice1", "alice@example.com", "hash123");
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("\"username\":\"alice\""));
        assert!(!json.contains("alice@example.com"));
        assert!(!json.contains("alice1\""));
    }

    #[test]
    fn update_request_fields_are_optional() {
        let req: UpdateProfileRequest = serde_json::from_str(r#"{"name":"Alice B"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("Alice B"));
        assert!(req.username.is_none());
        assert!(req.profile_picture.is_none());
    }
}
