use sqlx::FromRow;
use uuid::Uuid;

/// Input for one exercise entry of a workout.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDraft {
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
}

/// One lift or movement logged inside a workout. Owned by the workout and
/// deleted with it.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Exercise {
    id: Uuid,
    workout_id: Uuid,
    name: String,
    sets: i32,
    reps: i32,
    weight: f64,
    position: i32,
}

impl Exercise {
    pub(super) fn for_workout(workout_id: Uuid, position: i32, draft: ExerciseDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            workout_id,
            name: draft.name,
            sets: draft.sets,
            reps: draft.reps,
            weight: draft.weight,
            position,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn workout_id(&self) -> Uuid {
        self.workout_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sets(&self) -> i32 {
        self.sets
    }

    pub fn reps(&self) -> i32 {
        self.reps
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Index within the workout, starting at 0.
    pub fn position(&self) -> i32 {
        self.position
    }

    /// sets x reps x weight
    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.reps) * self.weight
    }
}
