use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, groups, users, workouts};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(users::router())
                .merge(workouts::router())
                .merge(groups::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{auth::jwt::JwtKeys, model::User, users::repo as users_repo};

    async fn send(request: Request<Body>) -> (StatusCode, String) {
        send_to(&AppState::fake(), request).await
    }

    async fn send_to(state: &AppState, request: Request<Body>) -> (StatusCode, String) {
        let app = build_app(state.clone());
        let response = app.oneshot(request).await.expect("request");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let req = Request::get("/api/v1/health").body(Body::empty()).unwrap();
        let (status, body) = send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        for uri in ["/api/v1/me", "/api/v1/workouts", "/api/v1/groups"] {
            let req = Request::get(uri).body(Body::empty()).unwrap();
            let (status, _) = send(req).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let user = User::new("alice", "Alice A", "alice1", "alice@example.com", "hash");
        let token = keys.issue(&user).unwrap().refresh_token;
        let req = Request::get("/api/v1/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Access token required");
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_token() {
        let (status, _) = send(json_post(
            "/api/v1/auth/refresh",
            r#"{"refresh_token":"not-a-jwt"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let (status, body) = send(json_post(
            "/api/v1/auth/register",
            r#"{"username":"alice","name":"Alice A","utor_id":"alice1","email":"alice@example.com","password":"short"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Password too short");
    }

    #[tokio::test]
    async fn register_rejects_overlong_username() {
        let payload = serde_json::json!({
            "username": "u".repeat(51),
            "name": "Alice A",
            "utor_id": "alice1",
            "email": "alice@example.com",
            "password": "long-enough-password",
        });
        let (status, body) = send(json_post("/api/v1/auth/register", &payload.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("username"));
    }

    fn bearer(method: &str, uri: &str, token: &str, body: Option<String>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn token_of_deleted_account_is_rejected(db: sqlx::PgPool) {
        let state = AppState::with_pool(db);
        let (status, body) = send_to(
            &state,
            json_post(
                "/api/v1/auth/register",
                r#"{"username":"alice","name":"Alice A","utor_id":"alice1","email":"alice@example.com","password":"long-enough-password"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let tokens: serde_json::Value = serde_json::from_str(&body).unwrap();
        let access = tokens["access_token"].as_str().unwrap().to_string();
        let refresh = tokens["refresh_token"].as_str().unwrap().to_string();

        let (status, _) = send_to(&state, bearer("GET", "/api/v1/me", &access, None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send_to(&state, bearer("DELETE", "/api/v1/me", &access, None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send_to(&state, bearer("GET", "/api/v1/me", &access, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Account no longer exists");

        let refresh_body = serde_json::json!({ "refresh_token": refresh }).to_string();
        let (status, _) = send_to(&state, json_post("/api/v1/auth/refresh", &refresh_body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn logged_exercises_feed_progression(db: sqlx::PgPool) {
        let state = AppState::with_pool(db);
        let user = User::new("bob", "Bob B", "bob1", "bob@example.com", "hash");
        users_repo::insert(&state.db, &user).await.unwrap();
        let token = JwtKeys::from_ref(&state).issue(&user).unwrap().access_token;

        let session = |day: u8, weight: f64| {
            serde_json::json!({
                "title": format!("Day {day}"),
                "start_time": format!("2025-03-0{day}T10:00:00Z"),
                "end_time": format!("2025-03-0{day}T11:00:00Z"),
                "exercises": [
                    { "exercise": "Squat", "sets": 3, "reps": 5, "weight": weight },
                    { "name": "Bench", "sets": 3, "reps": 8, "weight": 60 }
                ]
            })
            .to_string()
        };
        let (status, body) = send_to(
            &state,
            bearer("POST", "/api/v1/workouts", &token, Some(session(2, 105.0))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["exercises"].as_array().unwrap().len(), 2);
        let (status, _) = send_to(
            &state,
            bearer("POST", "/api/v1/workouts", &token, Some(session(1, 100.0))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let id = created["id"].as_str().unwrap();
        let (status, body) = send_to(
            &state,
            bearer("PUT", &format!("/api/v1/workouts/{id}"), &token, Some(session(2, 110.0))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let updated: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["created_at"], created["created_at"]);

        let (status, body) =
            send_to(&state, bearer("GET", "/api/v1/exercises/progression", &token, None)).await;
        assert_eq!(status, StatusCode::OK);
        let progression: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(progression["Squat"], serde_json::json!([100.0, 110.0]));
        assert_eq!(progression["Bench"], serde_json::json!([60.0, 60.0]));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn editing_a_missing_workout_is_not_found(db: sqlx::PgPool) {
        let state = AppState::with_pool(db);
        let user = User::new("bob", "Bob B", "bob1", "bob@example.com", "hash");
        users_repo::insert(&state.db, &user).await.unwrap();
        let token = JwtKeys::from_ref(&state).issue(&user).unwrap().access_token;

        let body = r#"{"title":"Legs","start_time":"2025-03-01T10:00:00Z","end_time":"2025-03-01T11:00:00Z"}"#;
        let uri = format!("/api/v1/workouts/{}", Uuid::new_v4());
        let (status, _) = send_to(&state, bearer("PUT", &uri, &token, Some(body.into()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
