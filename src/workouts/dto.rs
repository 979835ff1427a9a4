use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{Exercise, Workout};

/// Body of both `POST /workouts` and `PUT /workouts/:id`.
#[derive(Debug, Deserialize)]
pub struct WorkoutRequest {
    pub title: String,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    #[serde(default)]
    pub exercises: Vec<ExerciseRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseRequest {
    #[serde(alias = "exercise")]
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct ExerciseResponse {
    pub id: Uuid,
    pub name: String,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
}

impl From<&Exercise> for ExerciseResponse {
    fn from(e: &Exercise) -> Self {
        Self {
            id: e.id(),
            name: e.name().to_string(),
            sets: e.sets(),
            reps: e.reps(),
            weight: e.weight(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkoutResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub duration_minutes: i64,
    pub exercises: Vec<ExerciseResponse>,
    pub total_volume: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Workout> for WorkoutResponse {
    fn from(w: &Workout) -> Self {
        Self {
            id: w.id(),
            user_id: w.user_id(),
            title: w.title().to_string(),
            notes: w.notes().map(str::to_string),
            start_time: w.start_time(),
            end_time: w.end_time(),
            duration_minutes: w.duration_minutes(),
            exercises: w.exercises().iter().map(ExerciseResponse::from).collect(),
            total_volume: w.total_volume(),
            created_at: w.created_at(),
        }
    }
}

/// Exercise name to the weights logged for it, oldest first.
pub type ProgressionResponse = BTreeMap<String, Vec<f64>>;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_rfc3339_and_defaults_exercises() {
        let req: WorkoutRequest = serde_json::from_str(
            r#"{"title":"Push","start_time":"2025-03-01T10:00:00Z","end_time":"2025-03-01T11:15:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.title, "Push");
        assert!(req.notes.is_none());
        assert!(req.exercises.is_empty());
        assert_eq!((req.end_time - req.start_time).whole_minutes(), 75);
    }

    #[test]
    fn exercise_accepts_either_field_name() {
        let a: ExerciseRequest =
            serde_json::from_str(r#"{"name":"Bench","sets":3,"reps":8,"weight":60}"#).unwrap();
        let b: ExerciseRequest =
            serde_json::from_str(r#"{"exercise":"Bench","sets":3,"reps":8,"weight":60}"#).unwrap();
        assert_eq!(a.name, b.name);
        assert_eq!(b.weight, 60.0);
    }

    #[test]
    fn pagination_is_clamped() {
        let p: Pagination = serde_json::from_str(r#"{"limit":5000,"offset":-3}"#).unwrap();
        assert_eq!(p.clamped(), (100, 0));
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.clamped(), (20, 0));
    }
}
