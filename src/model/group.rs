use std::collections::HashSet;

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::user::User;

/// A group of users. Membership is shared: a user may belong to many
/// groups and a group holds many users.
#[derive(Debug, Clone, FromRow)]
pub struct Group {
    id: Uuid,
    name: String,
    created_at: OffsetDateTime,
    // written only by User::add_group / User::remove_group
    #[sqlx(skip)]
    pub(super) users: HashSet<Uuid>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: OffsetDateTime::now_utc(),
            users: HashSet::new(),
        }
    }

    /// Attaches member ids read back from storage.
    pub(crate) fn with_members(mut self, users: impl IntoIterator<Item = Uuid>) -> Self {
        self.users = users.into_iter().collect();
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn users(&self) -> &HashSet<Uuid> {
        &self.users
    }

    /// Member ids in a stable order.
    pub fn sorted_users(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.users.iter().copied().collect();
        ids.sort();
        ids
    }

    pub fn add_user(&mut self, user: Option<&mut User>) {
        if let Some(user) = user {
            user.add_group(Some(self));
        }
    }

    pub fn remove_user(&mut self, user: Option<&mut User>) {
        if let Some(user) = user {
            user.remove_group(Some(self));
        }
    }
}
