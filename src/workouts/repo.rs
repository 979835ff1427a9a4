use std::collections::{BTreeMap, HashMap};

use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::{
    error::StoreError,
    model::{Exercise, Workout},
};

const WORKOUT_COLUMNS: &str = "id, user_id, title, notes, start_time, end_time, created_at";

async fn exercises_for<'e>(
    db: impl PgExecutor<'e>,
    workout_ids: &[Uuid],
) -> Result<Vec<Exercise>, StoreError> {
    let rows = sqlx::query_as::<_, Exercise>(
        r#"
        SELECT id, workout_id, name, sets, reps, weight, position
        FROM exercises
        WHERE workout_id = ANY($1)
        "#,
    )
    .bind(workout_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

fn attach(workouts: Vec<Workout>, exercises: Vec<Exercise>) -> Vec<Workout> {
    let mut by_workout: HashMap<Uuid, Vec<Exercise>> = HashMap::new();
    for e in exercises {
        by_workout.entry(e.workout_id()).or_default().push(e);
    }
    workouts
        .into_iter()
        .map(|w| {
            let exercises = by_workout.remove(&w.id()).unwrap_or_default();
            w.with_exercises(exercises)
        })
        .collect()
}

/// Every workout of a user with its exercises, in the order they were
/// recorded.
pub async fn list_all_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<Workout>, StoreError> {
    let workouts = sqlx::query_as::<_, Workout>(&format!(
        "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    let ids: Vec<Uuid> = workouts.iter().map(Workout::id).collect();
    let exercises = exercises_for(&mut *conn, &ids).await?;
    Ok(attach(workouts, exercises))
}

/// One page of a user's workouts, most recent session first.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Workout>, StoreError> {
    let workouts = sqlx::query_as::<_, Workout>(&format!(
        r#"
        SELECT {WORKOUT_COLUMNS}
        FROM workouts
        WHERE user_id = $1
        ORDER BY start_time DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    let ids: Vec<Uuid> = workouts.iter().map(Workout::id).collect();
    let exercises = exercises_for(db, &ids).await?;
    Ok(attach(workouts, exercises))
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Workout, StoreError> {
    let workout = sqlx::query_as::<_, Workout>(&format!(
        "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    let exercises = exercises_for(db, &[id]).await?;
    Ok(workout.with_exercises(exercises))
}

/// Logged weights per exercise name, oldest session first.
pub async fn progression(
    db: &PgPool,
    user_id: Uuid,
) -> Result<BTreeMap<String, Vec<f64>>, StoreError> {
    let rows: Vec<(String, f64)> = sqlx::query_as(
        r#"
        SELECT e.name, e.weight
        FROM exercises e
        JOIN workouts w ON w.id = e.workout_id
        WHERE w.user_id = $1
        ORDER BY w.start_time ASC, e.position ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(group_by_exercise(rows))
}

/// Groups ordered `(name, weight)` rows by name, keeping row order within
/// each name.
pub fn group_by_exercise(rows: impl IntoIterator<Item = (String, f64)>) -> BTreeMap<String, Vec<f64>> {
    let mut out: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (name, weight) in rows {
        out.entry(name).or_default().push(weight);
    }
    out
}
