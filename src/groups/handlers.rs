use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::CurrentUser,
    db,
    error::StoreError,
    model::{Group, NAME_MAX_LEN},
    state::AppState,
    users::repo as users_repo,
    validation::required_text,
};

use super::dto::{CreateGroupRequest, GroupListItem, GroupResponse};
use super::repo;

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/:id", get(get_group))
        .route("/groups/:id/members", post(join_group).delete(leave_group))
}

/// Creates a group with the caller as its first member. The group row and
/// the membership are committed together.
#[instrument(skip(state, body))]
pub async fn create_group(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), (StatusCode, String)> {
    let name = required_text("name", &body.name, Some(NAME_MAX_LEN))?;
    let mut group = Group::new(name);

    let mut tx = db::begin(&state.db).await?;
    let mut user = users_repo::load(&mut tx, user_id).await?;
    repo::insert(&mut *tx, &group).await?;
    user.add_group(Some(&mut group));
    users_repo::save(&mut tx, &user).await?;
    db::commit(tx).await?;

    info!(user_id = %user_id, group_id = %group.id(), "group created");
    Ok((StatusCode::CREATED, Json(GroupResponse::from(&group))))
}

#[instrument(skip(state))]
pub async fn list_groups(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
) -> Result<Json<Vec<GroupListItem>>, (StatusCode, String)> {
    let groups = repo::list_for_user(&state.db, user_id).await?;
    Ok(Json(groups.iter().map(GroupListItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_group(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, (StatusCode, String)> {
    let mut conn = state.db.acquire().await.map_err(StoreError::from)?;
    let group = repo::load(&mut conn, id).await?;
    Ok(Json(GroupResponse::from(&group)))
}

#[instrument(skip(state))]
pub async fn join_group(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, (StatusCode, String)> {
    let mut tx = db::begin(&state.db).await?;
    let mut user = users_repo::load(&mut tx, user_id).await?;
    let mut group = repo::load(&mut tx, id).await?;

    user.add_group(Some(&mut group));
    users_repo::save(&mut tx, &user).await?;
    db::commit(tx).await?;

    info!(user_id = %user_id, group_id = %id, "joined group");
    Ok(Json(GroupResponse::from(&group)))
}

#[instrument(skip(state))]
pub async fn leave_group(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, (StatusCode, String)> {
    let mut tx = db::begin(&state.db).await?;
    let mut user = users_repo::load(&mut tx, user_id).await?;
    let mut group = repo::load(&mut tx, id).await?;

    user.remove_group(Some(&mut group));
    users_repo::save(&mut tx, &user).await?;
    db::commit(tx).await?;

    info!(user_id = %user_id, group_id = %id, "left group");
    Ok(Json(GroupResponse::from(&group)))
}
