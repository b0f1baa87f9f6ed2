//! Internal HTTP API (spec §4.9): a small inbound listener guarded by a
//! shared-secret header, used by other services to push chat messages and
//! "last score" PMs without going through the chat command surface.
//!
//! Mirrors the teacher's axum channel: router built once, state injected
//! via `axum::extract::State`, graceful shutdown wired to a
//! `CancellationToken`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backends::PlatformApi;
use crate::error::AppError;
use crate::transport::{Frame, TransportHandle};

#[derive(Clone)]
pub struct ApiState {
    pub secret: Arc<str>,
    pub transport: TransportHandle,
    pub platform: Arc<dyn PlatformApi>,
}

#[derive(Deserialize)]
struct SendMessageRequest {
    target: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct LastRequest {
    user_id: Option<i64>,
}

#[derive(Serialize)]
struct ApiResponse {
    code: u16,
    message: String,
}

fn body(code: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiResponse>) {
    (code, Json(ApiResponse { code: code.as_u16(), message: message.into() }))
}

fn forbidden() -> (StatusCode, Json<ApiResponse>) {
    body(StatusCode::FORBIDDEN, "bad secret")
}

fn check_secret(state: &ApiState, headers: &HeaderMap) -> bool {
    headers
        .get("Secret")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == state.secret.as_ref())
}

#[tracing::instrument(skip(state, headers, req), fields(turnstile = %uuid::Uuid::new_v4()))]
async fn send_message(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<SendMessageRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if !check_secret(&state, &headers) {
        return forbidden();
    }
    let (Some(target), Some(message)) = (req.target, req.message) else {
        return body(StatusCode::BAD_REQUEST, "missing `target` or `message`");
    };
    match state.transport.send(Frame::chat_message(&target, &message)) {
        Ok(()) => body(StatusCode::OK, "sent"),
        Err(e) => {
            warn!(error = %e, "httpapi: send_message failed");
            body(StatusCode::INTERNAL_SERVER_ERROR, "transport error")
        }
    }
}

#[tracing::instrument(skip(state, headers, req), fields(turnstile = %uuid::Uuid::new_v4()))]
async fn last(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<LastRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if !check_secret(&state, &headers) {
        return forbidden();
    }
    let Some(user_id) = req.user_id else {
        return body(StatusCode::BAD_REQUEST, "missing `user_id`");
    };

    let username = match state.platform.user_id_to_username(user_id).await {
        Ok(u) => u,
        Err(AppError::BackendResponse(_)) => return body(StatusCode::NOT_FOUND, "no such user"),
        Err(e) => {
            warn!(error = %e, "httpapi: user lookup failed");
            return body(StatusCode::INTERNAL_SERVER_ERROR, "backend error");
        }
    };

    let scores = match state.platform.recent_scores(&username, 1).await {
        Ok(scores) => scores,
        Err(e) => {
            warn!(error = %e, "httpapi: recent scores lookup failed");
            return body(StatusCode::INTERNAL_SERVER_ERROR, "backend error");
        }
    };

    let message = match scores.first() {
        Some(score) => format!(
            "{username}'s last score: beatmap {} ({:.2}pp, {:.2}% acc)",
            score.beatmap_id, score.pp, score.accuracy
        ),
        None => format!("{username} has no recent scores"),
    };

    if let Err(e) = state.transport.send(Frame::chat_message(&username, &message)) {
        warn!(error = %e, "httpapi: last PM send failed");
        return body(StatusCode::INTERNAL_SERVER_ERROR, "transport error");
    }

    body(StatusCode::OK, "sent")
}

fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v0/send_message", post(send_message))
        .route("/api/v0/last", post(last))
        .with_state(state)
}

pub async fn run(bind_addr: &str, state: ApiState, shutdown: CancellationToken) -> Result<(), AppError> {
    let router = build_router(state);
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Config(format!("httpapi bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "internal http api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Internal(format!("httpapi server error: {e}")))?;

    info!("internal http api shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct FakePlatform;

    #[async_trait]
    impl PlatformApi for FakePlatform {
        async fn user_id_to_username(&self, user_id: i64) -> Result<String, AppError> {
            if user_id == 1 {
                Ok("cookiezi".into())
            } else {
                Err(AppError::BackendResponse("no such user".into()))
            }
        }

        async fn silence(&self, _user_id: i64, _seconds: u64, _reason: &str) -> Result<(), AppError> {
            Ok(())
        }

        async fn recent_scores(&self, _username: &str, _limit: u32) -> Result<Vec<crate::backends::platform::Score>, AppError> {
            Ok(vec![])
        }
    }

    fn state() -> ApiState {
        let (transport, _inbound) = crate::transport::spawn("wss://unused.invalid/".into(), CancellationToken::new());
        ApiState { secret: Arc::from("s3cr3t"), transport, platform: Arc::new(FakePlatform) }
    }

    #[tokio::test]
    async fn missing_secret_is_forbidden() {
        let router = build_router(state());
        let req = Request::post("/api/v0/send_message")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"target":"#osu","message":"hi"}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_args_is_bad_request() {
        let router = build_router(state());
        let req = Request::post("/api/v0/send_message")
            .header("content-type", "application/json")
            .header("Secret", "s3cr3t")
            .body(Body::from(r#"{"target":"#osu"}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn valid_send_message_is_ok() {
        let router = build_router(state());
        let req = Request::post("/api/v0/send_message")
            .header("content-type", "application/json")
            .header("Secret", "s3cr3t")
            .body(Body::from(r#"{"target":"#osu","message":"hi"}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let router = build_router(state());
        let req = Request::post("/api/v0/last")
            .header("content-type", "application/json")
            .header("Secret", "s3cr3t")
            .body(Body::from(r#"{"user_id":999}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn known_user_last_is_ok() {
        let router = build_router(state());
        let req = Request::post("/api/v0/last")
            .header("content-type", "application/json")
            .header("Secret", "s3cr3t")
            .body(Body::from(r#"{"user_id":1}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
