use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::exercise::{Exercise, ExerciseDraft};

/// Input for a new or edited workout; see [`super::User::add_workout`].
#[derive(Debug, Clone)]
pub struct WorkoutDraft {
    pub title: String,
    pub notes: Option<String>,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub exercises: Vec<ExerciseDraft>,
}

/// A single training session. Belongs to exactly one user for its whole
/// lifetime; the owner is fixed when the workout is created.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Workout {
    id: Uuid,
    user_id: Uuid,
    title: String,
    notes: Option<String>,
    start_time: OffsetDateTime,
    end_time: OffsetDateTime,
    created_at: OffsetDateTime,
    #[sqlx(skip)]
    exercises: Vec<Exercise>,
}

fn build_exercises(workout_id: Uuid, drafts: Vec<ExerciseDraft>) -> Vec<Exercise> {
    drafts
        .into_iter()
        .zip(0..)
        .map(|(draft, position)| Exercise::for_workout(workout_id, position, draft))
        .collect()
}

impl Workout {
    pub(super) fn owned_by(user_id: Uuid, draft: WorkoutDraft) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            user_id,
            title: draft.title,
            notes: draft.notes,
            start_time: draft.start_time,
            end_time: draft.end_time,
            created_at: OffsetDateTime::now_utc(),
            exercises: build_exercises(id, draft.exercises),
        }
    }

    /// Attaches exercises read back from storage.
    pub(crate) fn with_exercises(mut self, mut exercises: Vec<Exercise>) -> Self {
        debug_assert!(exercises.iter().all(|e| e.workout_id() == self.id));
        exercises.sort_by_key(Exercise::position);
        self.exercises = exercises;
        self
    }

    /// Replaces everything but identity, owner and creation time. The
    /// previous exercises are dropped and deleted on the next save.
    pub fn update(&mut self, draft: WorkoutDraft) {
        self.title = draft.title;
        self.notes = draft.notes;
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.exercises = build_exercises(self.id, draft.exercises);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn start_time(&self) -> OffsetDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> OffsetDateTime {
        self.end_time
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).whole_minutes()
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(Exercise::volume).sum()
    }
}
