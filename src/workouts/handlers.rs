use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::CurrentUser,
    db,
    model::{ExerciseDraft, WorkoutDraft},
    state::AppState,
    users::repo as users_repo,
    validation::required_text,
};

use super::dto::{Pagination, ProgressionResponse, WorkoutRequest, WorkoutResponse};
use super::repo;

const TITLE_MAX_LEN: usize = 100;
const EXERCISE_NAME_MAX_LEN: usize = 100;

pub fn workout_routes() -> Router<AppState> {
    Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route(
            "/workouts/:id",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
        .route("/exercises/progression", get(exercise_progression))
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.into())
}

/// Checks a request body and turns it into a draft. Every exercise needs a
/// name and at least one set, one rep and one unit of weight.
pub fn validate_draft(body: WorkoutRequest) -> Result<WorkoutDraft, (StatusCode, String)> {
    let title = required_text("title", &body.title, Some(TITLE_MAX_LEN))?;
    if body.end_time < body.start_time {
        warn!("workout ends before it starts");
        return Err(bad_request("end_time must not be before start_time"));
    }

    let mut exercises = Vec::with_capacity(body.exercises.len());
    for e in body.exercises {
        let name = required_text("exercise name", &e.name, Some(EXERCISE_NAME_MAX_LEN))?;
        if e.sets < 1 || e.reps < 1 {
            return Err(bad_request(format!("{name}: sets and reps must be at least 1")));
        }
        if !e.weight.is_finite() || e.weight < 1.0 {
            return Err(bad_request(format!("{name}: weight must be at least 1")));
        }
        exercises.push(ExerciseDraft {
            name,
            sets: e.sets,
            reps: e.reps,
            weight: e.weight,
        });
    }

    Ok(WorkoutDraft {
        title,
        notes: body.notes.filter(|n| !n.trim().is_empty()),
        start_time: body.start_time,
        end_time: body.end_time,
        exercises,
    })
}

#[instrument(skip(state))]
pub async fn list_workouts(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<WorkoutResponse>>, (StatusCode, String)> {
    let (limit, offset) = p.clamped();
    let workouts = repo::list_by_user(&state.db, user_id, limit, offset).await?;
    Ok(Json(workouts.iter().map(WorkoutResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_workout(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkoutResponse>, (StatusCode, String)> {
    let workout = repo::find(&state.db, user_id, id).await?;
    Ok(Json(WorkoutResponse::from(&workout)))
}

#[instrument(skip(state, body))]
pub async fn create_workout(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Json(body): Json<WorkoutRequest>,
) -> Result<(StatusCode, HeaderMap, Json<WorkoutResponse>), (StatusCode, String)> {
    let draft = validate_draft(body)?;

    let mut tx = db::begin(&state.db).await?;
    let mut user = users_repo::load(&mut tx, user_id).await?;
    let response = WorkoutResponse::from(user.add_workout(draft));
    users_repo::save(&mut tx, &user).await?;
    db::commit(tx).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/workouts/{}", response.id)) {
        headers.insert(axum::http::header::LOCATION, location);
    }

    info!(user_id = %user_id, workout_id = %response.id, "workout created");
    Ok((StatusCode::CREATED, headers, Json(response)))
}

/// Replaces a workout's details and exercises. Identity, owner and
/// creation time are kept.
#[instrument(skip(state, body))]
pub async fn update_workout(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<WorkoutRequest>,
) -> Result<Json<WorkoutResponse>, (StatusCode, String)> {
    let draft = validate_draft(body)?;

    let mut tx = db::begin(&state.db).await?;
    let mut user = users_repo::load(&mut tx, user_id).await?;
    let Some(workout) = user.workout_mut(id) else {
        return Err((StatusCode::NOT_FOUND, "Workout not found".into()));
    };
    workout.update(draft);
    let response = WorkoutResponse::from(&*workout);
    users_repo::save(&mut tx, &user).await?;
    db::commit(tx).await?;

    info!(user_id = %user_id, workout_id = %id, "workout updated");
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn delete_workout(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut tx = db::begin(&state.db).await?;
    let mut user = users_repo::load(&mut tx, user_id).await?;
    if user.remove_workout(id).is_none() {
        return Err((StatusCode::NOT_FOUND, "Workout not found".into()));
    }
    users_repo::save(&mut tx, &user).await?;
    db::commit(tx).await?;

    info!(user_id = %user_id, workout_id = %id, "workout removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Weight history per exercise for the caller's workouts.
#[instrument(skip(state))]
pub async fn exercise_progression(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
) -> Result<Json<ProgressionResponse>, (StatusCode, String)> {
    let progression = repo::progression(&state.db, user_id).await?;
    Ok(Json(progression))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> WorkoutRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn reversed_times_are_rejected() {
        let err = validate_draft(body(
            r#"{"title":"Push","start_time":"2025-03-01T11:00:00Z","end_time":"2025-03-01T10:00:00Z"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("end_time"));
    }

    #[test]
    fn blank_notes_are_dropped_and_title_trimmed() {
        let draft = validate_draft(body(
            r#"{"title":"  Push ","notes":"   ","start_time":"2025-03-01T10:00:00Z","end_time":"2025-03-01T11:00:00Z"}"#,
        ))
        .unwrap();
        assert_eq!(draft.title, "Push");
        assert!(draft.notes.is_none());
    }

    #[test]
    fn exercises_need_name_and_positive_numbers() {
        let zero_sets = body(
            r#"{"title":"Legs","start_time":"2025-03-01T10:00:00Z","end_time":"2025-03-01T11:00:00Z",
                "exercises":[{"name":"Squat","sets":0,"reps":5,"weight":100}]}"#,
        );
        assert_eq!(validate_draft(zero_sets).unwrap_err().0, StatusCode::BAD_REQUEST);

        let no_weight = body(
            r#"{"title":"Legs","start_time":"2025-03-01T10:00:00Z","end_time":"2025-03-01T11:00:00Z",
                "exercises":[{"name":"Squat","sets":3,"reps":5,"weight":0}]}"#,
        );
        assert!(validate_draft(no_weight).unwrap_err().1.contains("weight"));

        let unnamed = body(
            r#"{"title":"Legs","start_time":"2025-03-01T10:00:00Z","end_time":"2025-03-01T11:00:00Z",
                "exercises":[{"exercise":"  ","sets":3,"reps":5,"weight":100}]}"#,
        );
        assert_eq!(validate_draft(unnamed).unwrap_err().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn valid_exercises_keep_their_order() {
        let draft = validate_draft(body(
            r#"{"title":"Legs","start_time":"2025-03-01T10:00:00Z","end_time":"2025-03-01T11:00:00Z",
                "exercises":[{"name":"Squat","sets":3,"reps":5,"weight":100},
                             {"exercise":"Lunge","sets":2,"reps":10,"weight":20.5}]}"#,
        ))
        .unwrap();
        let names: Vec<&str> = draft.exercises.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Squat", "Lunge"]);
        assert_eq!(draft.exercises[1].weight, 20.5);
    }
}
