//! Domain records: accounts, their workouts, and shared groups.

mod exercise;
mod group;
mod user;
mod workout;

pub use exercise::{Exercise, ExerciseDraft};
pub use group::Group;
pub use user::{User, NAME_MAX_LEN, USERNAME_MAX_LEN, UTOR_ID_MAX_LEN};
pub use workout::{Workout, WorkoutDraft};
