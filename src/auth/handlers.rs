use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
        jwt::{JwtKeys, TokenKind},
        password::{check_policy, hash_password, verify_login},
    },
    error::StoreError,
    model::{User, NAME_MAX_LEN, USERNAME_MAX_LEN, UTOR_ID_MAX_LEN},
    state::AppState,
    users::{dto::PublicUser, repo as users_repo},
    validation::{normalize_email, required_text},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub(crate) fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    error!(error = %e, "auth failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}

fn issue_tokens(state: &AppState, user: &User) -> Result<AuthResponse, (StatusCode, String)> {
    let pair = JwtKeys::from_ref(state).issue(user).map_err(internal)?;
    Ok(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: PublicUser::from(user),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let username = required_text("username", &payload.username, Some(USERNAME_MAX_LEN))?;
    let name = required_text("name", &payload.name, Some(NAME_MAX_LEN))?;
    let utor_id = required_text("utor_id", &payload.utor_id, Some(UTOR_ID_MAX_LEN))?;
    let email = normalize_email(&payload.email)?;

    if let Err(e) = check_policy(&payload.password) {
        warn!(reason = %e, "password rejected");
        return Err((StatusCode::BAD_REQUEST, e.to_string()));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let user = User::new(username, name, utor_id, email, hash);

    if let Err(e) = users_repo::insert(&state.db, &user).await {
        if let StoreError::Conflict(field) = &e {
            warn!(field = %field, "registration conflict");
        }
        return Err(e.into());
    }

    let response = issue_tokens(&state, &user)?;
    info!(user_id = %user.id(), username = %user.username(), "user registered");
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let email = normalize_email(&payload.email)?;
    let user = users_repo::find_by_email(&state.db, &email).await?;

    if !verify_login(user.as_ref(), &payload.password).map_err(internal)? {
        warn!(email = %email, known = user.is_some(), "login rejected");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }
    let Some(user) = user else {
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    };

    let response = issue_tokens(&state, &user)?;
    info!(user_id = %user.id(), "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let claims = JwtKeys::from_ref(&state)
        .decode(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_string())
        })?;

    let Some(user) = users_repo::find_by_id(&state.db, claims.sub).await? else {
        warn!(user_id = %claims.sub, "refresh for a deleted account");
        return Err((StatusCode::UNAUTHORIZED, "Account no longer exists".into()));
    };

    Ok(Json(issue_tokens(&state, &user)?))
}
