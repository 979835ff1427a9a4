use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::Group;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub members: Vec<Uuid>,
}

impl From<&Group> for GroupResponse {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id(),
            name: g.name().to_string(),
            created_at: g.created_at(),
            members: g.sorted_users(),
        }
    }
}

/// Group entry in a listing; members are not loaded.
#[derive(Debug, Serialize)]
pub struct GroupListItem {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Group> for GroupListItem {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id(),
            name: g.name().to_string(),
            created_at: g.created_at(),
        }
    }
}
