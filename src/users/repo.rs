use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::StoreError,
    model::{User, Workout},
    workouts::repo as workouts_repo,
};

const USER_COLUMNS: &str =
    "id, username, name, utor_id, email, password_hash, profile_picture, created_at";

/// Inserts a freshly constructed account row.
pub async fn insert<'e>(db: impl PgExecutor<'e>, user: &User) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, name, utor_id, email, password_hash, profile_picture, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(user.id())
    .bind(user.username())
    .bind(user.name())
    .bind(user.utor_id())
    .bind(user.email())
    .bind(user.password_hash())
    .bind(user.profile_picture())
    .bind(user.created_at())
    .execute(db)
    .await?;
    debug!(user_id = %user.id(), "user inserted");
    Ok(())
}

/// Looks up the account row only; relations are left empty.
pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_email<'e>(
    db: impl PgExecutor<'e>,
    email: &str,
) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Loads an account together with its workouts and group memberships.
///
/// The account row stays locked until the surrounding transaction ends, so
/// a load/modify/[`save`] cycle run inside one transaction cannot overwrite
/// a concurrent one.
pub async fn load(conn: &mut PgConnection, id: Uuid) -> Result<User, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound)?;
    let workouts = workouts_repo::list_all_for_user(&mut *conn, id).await?;
    let groups: Vec<Uuid> =
        sqlx::query_scalar("SELECT group_id FROM group_members WHERE user_id = $1")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(user.with_relations(workouts, groups))
}

/// Writes an account loaded with [`load`] back to storage. Call it on the
/// same transaction as the load.
///
/// `created_at` is never updated. Workouts no longer held by the account
/// are deleted along with their exercises, and `group_members` is made to
/// match the account's groups.
pub async fn save(conn: &mut PgConnection, user: &User) -> Result<(), StoreError> {
    let updated = sqlx::query(
        r#"
        UPDATE users
        SET username = $2, name = $3, utor_id = $4, email = $5,
            password_hash = $6, profile_picture = $7
        WHERE id = $1
        "#,
    )
    .bind(user.id())
    .bind(user.username())
    .bind(user.name())
    .bind(user.utor_id())
    .bind(user.email())
    .bind(user.password_hash())
    .bind(user.profile_picture())
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }

    // orphan removal; exercises go with the workout row
    let kept: Vec<Uuid> = user.workouts().iter().map(Workout::id).collect();
    let orphaned = sqlx::query("DELETE FROM workouts WHERE user_id = $1 AND NOT (id = ANY($2))")
        .bind(user.id())
        .bind(&kept)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    for workout in user.workouts() {
        save_workout(&mut *conn, workout).await?;
    }

    let groups: Vec<Uuid> = user.groups().iter().copied().collect();
    sqlx::query("DELETE FROM group_members WHERE user_id = $1 AND NOT (group_id = ANY($2))")
        .bind(user.id())
        .bind(&groups)
        .execute(&mut *conn)
        .await?;
    for group_id in &groups {
        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user.id())
        .execute(&mut *conn)
        .await?;
    }

    debug!(
        user_id = %user.id(),
        workouts = kept.len(),
        orphaned,
        groups = groups.len(),
        "user saved"
    );
    Ok(())
}

async fn save_workout(conn: &mut PgConnection, workout: &Workout) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO workouts (id, user_id, title, notes, start_time, end_time, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE
        SET title = EXCLUDED.title, notes = EXCLUDED.notes,
            start_time = EXCLUDED.start_time, end_time = EXCLUDED.end_time
        WHERE workouts.user_id = EXCLUDED.user_id
        "#,
    )
    .bind(workout.id())
    .bind(workout.user_id())
    .bind(workout.title())
    .bind(workout.notes())
    .bind(workout.start_time())
    .bind(workout.end_time())
    .bind(workout.created_at())
    .execute(&mut *conn)
    .await?;

    let kept: Vec<Uuid> = workout.exercises().iter().map(|e| e.id()).collect();
    sqlx::query("DELETE FROM exercises WHERE workout_id = $1 AND NOT (id = ANY($2))")
        .bind(workout.id())
        .bind(&kept)
        .execute(&mut *conn)
        .await?;
    for exercise in workout.exercises() {
        sqlx::query(
            r#"
            INSERT INTO exercises (id, workout_id, name, sets, reps, weight, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, sets = EXCLUDED.sets, reps = EXCLUDED.reps,
                weight = EXCLUDED.weight, position = EXCLUDED.position
            WHERE exercises.workout_id = EXCLUDED.workout_id
            "#,
        )
        .bind(exercise.id())
        .bind(exercise.workout_id())
        .bind(exercise.name())
        .bind(exercise.sets())
        .bind(exercise.reps())
        .bind(exercise.weight())
        .bind(exercise.position())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Deletes an account, its workouts and their exercises, and its group
/// memberships. Groups themselves are kept.
pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), StoreError> {
    let mut tx = db.begin().await?;

    sqlx::query(
        "DELETE FROM exercises WHERE workout_id IN (SELECT id FROM workouts WHERE user_id = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    let workouts = sqlx::query("DELETE FROM workouts WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let memberships = sqlx::query("DELETE FROM group_members WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(StoreError::NotFound);
    }

    tx.commit().await?;
    debug!(user_id = %id, workouts, memberships, "user deleted");
    Ok(())
}
