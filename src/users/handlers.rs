use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        handlers::internal,
        jwt::CurrentUser,
        password::{check_policy, hash_password, verify_password},
    },
    db,
    error::StoreError,
    model::{User, NAME_MAX_LEN, USERNAME_MAX_LEN, UTOR_ID_MAX_LEN},
    state::AppState,
    validation::{normalize_email, required_text},
};

use super::dto::{ChangePasswordRequest, PublicUser, UpdateProfileRequest, UserProfile};
use super::repo;

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me).delete(delete_me))
        .route("/me/password", post(change_password))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let mut conn = state.db.acquire().await.map_err(StoreError::from)?;
    let user = repo::load(&mut conn, user_id).await?;
    Ok(Json(UserProfile::from(&user)))
}

fn apply_update(user: &mut User, req: UpdateProfileRequest) -> Result<(), (StatusCode, String)> {
    if let Some(username) = req.username {
        user.set_username(required_text("username", &username, Some(USERNAME_MAX_LEN))?);
    }
    if let Some(name) = req.name {
        user.set_name(required_text("name", &name, Some(NAME_MAX_LEN))?);
    }
    if let Some(utor_id) = req.utor_id {
        user.set_utor_id(required_text("utor_id", &utor_id, Some(UTOR_ID_MAX_LEN))?);
    }
    if let Some(email) = req.email {
        user.set_email(normalize_email(&email)?);
    }
    if let Some(picture) = req.profile_picture {
        let picture = picture.trim();
        user.set_profile_picture((!picture.is_empty()).then(|| picture.to_string()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let mut tx = db::begin(&state.db).await?;
    let mut user = repo::load(&mut tx, user_id).await?;
    apply_update(&mut user, payload)?;
    repo::save(&mut tx, &user).await?;
    db::commit(tx).await?;
    info!(user_id = %user_id, "profile updated");
    Ok(Json(UserProfile::from(&user)))
}

/// Replaces the password after checking the current one.
#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser { id: user_id, username }: CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    check_policy(&payload.new_password).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut tx = db::begin(&state.db).await?;
    let mut user = repo::load(&mut tx, user_id).await?;
    if !verify_password(&payload.current_password, user.password_hash()).map_err(internal)? {
        warn!(user_id = %user_id, "password change with wrong current password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }
    user.set_password_hash(hash_password(&payload.new_password).map_err(internal)?);
    repo::save(&mut tx, &user).await?;
    db::commit(tx).await?;

    info!(user_id = %user_id, username = %username, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser { id: user_id, .. }: CurrentUser,
) -> Result<StatusCode, (StatusCode, String)> {
    repo::delete(&state.db, user_id).await?;
    info!(user_id = %user_id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    Ok(Json(PublicUser::from(&user)))
}
