use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::group::Group;
use super::workout::{Workout, WorkoutDraft};

pub const USERNAME_MAX_LEN: usize = 50;
pub const NAME_MAX_LEN: usize = 100;
pub const UTOR_ID_MAX_LEN: usize = 20;

/// Profile picture assigned to every account built through [`User::new`].
pub const DEFAULT_PROFILE_PICTURE: &str = "Default";

/// An application account.
///
/// The account owns its workouts outright and holds shared membership in
/// groups. Membership is only ever changed through [`User::add_group`] /
/// [`User::remove_group`] (or the mirrored pair on [`Group`]), which keep
/// both sides of the relation in step.
///
/// Uniqueness of `username`, `utor_id` and `email`, and the column lengths,
/// are enforced by the database, not here.
#[derive(Clone, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct User {
    id: Uuid,
    username: String,
    name: String,
    utor_id: String,
    email: String,
    #[serde(skip_serializing)]
    password_hash: String, // argon2 hash, not exposed in JSON
    profile_picture: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[sqlx(skip)]
    #[serde(skip)]
    workouts: Vec<Workout>,
    #[sqlx(skip)]
    #[serde(skip)]
    groups: HashSet<Uuid>,
}

impl Default for User {
    /// Empty record for row mapping and deserialization; only the
    /// creation timestamp is filled in.
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            username: String::new(),
            name: String::new(),
            utor_id: String::new(),
            email: String::new(),
            password_hash: String::new(),
            profile_picture: None,
            created_at: OffsetDateTime::now_utc(),
            workouts: Vec::new(),
            groups: HashSet::new(),
        }
    }
}

impl User {
    /// Builds a new account. `password_hash` must already be hashed.
    pub fn new(
        username: impl Into<String>,
        name: impl Into<String>,
        utor_id: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            name: name.into(),
            utor_id: utor_id.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            profile_picture: Some(DEFAULT_PROFILE_PICTURE.to_string()),
            created_at: OffsetDateTime::now_utc(),
            workouts: Vec::new(),
            groups: HashSet::new(),
        }
    }

    /// Attaches relations read back from storage.
    pub(crate) fn with_relations(
        mut self,
        workouts: Vec<Workout>,
        groups: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        debug_assert!(workouts.iter().all(|w| w.user_id() == self.id));
        self.workouts = workouts;
        self.groups = groups.into_iter().collect();
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn utor_id(&self) -> &str {
        &self.utor_id
    }

    pub fn set_utor_id(&mut self, utor_id: impl Into<String>) {
        self.utor_id = utor_id.into();
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
    }

    pub fn profile_picture(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }

    pub fn set_profile_picture(&mut self, profile_picture: Option<String>) {
        self.profile_picture = profile_picture;
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    /// Creates a workout owned by this account.
    pub fn add_workout(&mut self, draft: WorkoutDraft) -> &Workout {
        let idx = self.workouts.len();
        self.workouts.push(Workout::owned_by(self.id, draft));
        &self.workouts[idx]
    }

    pub fn workout_mut(&mut self, id: Uuid) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id() == id)
    }

    /// Detaches a workout. The returned workout is an orphan: saving this
    /// account deletes its row.
    pub fn remove_workout(&mut self, id: Uuid) -> Option<Workout> {
        let pos = self.workouts.iter().position(|w| w.id() == id)?;
        Some(self.workouts.remove(pos))
    }

    pub fn groups(&self) -> &HashSet<Uuid> {
        &self.groups
    }

    /// Joins `group`, recording the membership on both sides.
    /// `None` leaves everything untouched.
    pub fn add_group(&mut self, group: Option<&mut Group>) {
        let Some(group) = group else {
            return;
        };
        self.groups.insert(group.id());
        group.users.insert(self.id);
    }

    /// Leaves `group`, clearing the membership on both sides.
    /// `None` or a group this account is not in leaves everything untouched.
    pub fn remove_group(&mut self, group: Option<&mut Group>) {
        let Some(group) = group else {
            return;
        };
        self.groups.remove(&group.id());
        group.users.remove(&self.id);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user {} (username={}, name={}, utor_id={}, email={}, profile_picture={}, created_at={})",
            self.id,
            self.username,
            self.name,
            self.utor_id,
            self.email,
            self.profile_picture.as_deref().unwrap_or("-"),
            self.created_at,
        )
    }
}

// Hand-written so the password hash never ends up in logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("name", &self.name)
            .field("utor_id", &self.utor_id)
            .field("email", &self.email)
            .field("profile_picture", &self.profile_picture)
            .field("created_at", &self.created_at)
            .field("workouts", &self.workouts.len())
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}
