use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::{error::StoreError, model::Group};

/// Inserts the group row. Members are written through the users side.
pub async fn insert<'e>(db: impl PgExecutor<'e>, group: &Group) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO groups (id, name, created_at) VALUES ($1, $2, $3)")
        .bind(group.id())
        .bind(group.name())
        .bind(group.created_at())
        .execute(db)
        .await?;
    Ok(())
}

/// Loads a group with its member ids.
pub async fn load(conn: &mut PgConnection, id: Uuid) -> Result<Group, StoreError> {
    let group = sqlx::query_as::<_, Group>("SELECT id, name, created_at FROM groups WHERE id = $1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    let members: Vec<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM group_members WHERE group_id = $1")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(group.with_members(members))
}

/// Groups the user belongs to, without member lists.
pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Group>, StoreError> {
    let rows = sqlx::query_as::<_, Group>(
        r#"
        SELECT g.id, g.name, g.created_at
        FROM groups g
        JOIN group_members m ON m.group_id = g.id
        WHERE m.user_id = $1
        ORDER BY g.name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, model::User, users::repo as users_repo};

    #[sqlx::test(migrations = "./migrations")]
    async fn missing_group_is_not_found(db: PgPool) {
        let mut conn = db.acquire().await.unwrap();
        assert!(matches!(
            load(&mut conn, Uuid::new_v4()).await,
            Err(StoreError::NotFound)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn rolled_back_group_insert_leaves_nothing(db: PgPool) {
        let group = Group::new("Runners");
        let mut tx = db::begin(&db).await.unwrap();
        insert(&mut *tx, &group).await.unwrap();
        tx.rollback().await.unwrap();

        let mut conn = db.acquire().await.unwrap();
        assert!(matches!(load(&mut conn, group.id()).await, Err(StoreError::NotFound)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn list_for_user_is_sorted_by_name(db: PgPool) {
        let mut user = User::new("alice", "Alice", "alice1", "alice@example.com", "h");
        users_repo::insert(&db, &user).await.unwrap();
        let mut zed = Group::new("Zed");
        let mut abs = Group::new("Abs");
        insert(&db, &zed).await.unwrap();
        insert(&db, &abs).await.unwrap();
        user.add_group(Some(&mut zed));
        user.add_group(Some(&mut abs));
        let mut conn = db.acquire().await.unwrap();
        users_repo::save(&mut conn, &user).await.unwrap();

        let names: Vec<String> = list_for_user(&db, user.id())
            .await
            .unwrap()
            .iter()
            .map(|g| g.name().to_string())
            .collect();
        assert_eq!(names, vec!["Abs", "Zed"]);
    }
}
