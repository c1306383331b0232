//! HTTP surface for the scheduler: `POST /api/cron` runs the pipeline.

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, get};
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use trends_core::{CoreError, ErrorExt, ErrorReporter};

use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct TriggerState {
    pipeline: Arc<dyn Pipeline>,
    secret: Arc<str>,
    running: Arc<Mutex<()>>,
}

impl TriggerState {
    pub fn new(pipeline: Arc<dyn Pipeline>, secret: impl Into<Arc<str>>) -> Self {
        Self {
            pipeline,
            secret: secret.into(),
            running: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: TriggerState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/cron", any(cron))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn cron(State(state): State<TriggerState>, method: Method, headers: HeaderMap) -> Response {
    if method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "POST")],
            Json(json!({ "success": false, "error": "Method not allowed" })),
        )
            .into_response();
    }

    if !is_authorized(&headers, &state.secret) {
        let error = CoreError::Unauthorized {
            reason: "bearer token missing or mismatched".to_string(),
        };
        warn!(error = %error, "Rejected trigger request");
        return failure(StatusCode::UNAUTHORIZED, &error);
    }

    // Held for the whole run; a second trigger meanwhile gets 409.
    let Ok(_guard) = state.running.try_lock() else {
        info!("Trigger ignored, a run is already in progress");
        return (
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "error": "A run is already in progress" })),
        )
            .into_response();
    };

    match state.pipeline.run().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(error) => {
            ErrorReporter::new().report_error(&error);
            failure(StatusCode::INTERNAL_SERVER_ERROR, &error)
        }
    }
}

fn is_authorized(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| constant_time_eq(token.as_bytes(), secret.as_bytes()))
}

/// Runs in time independent of where the inputs first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn failure(status: StatusCode, error: &CoreError) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": error.user_friendly_message(),
            "code": error.error_code(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tower::ServiceExt;
    use trends_core::{HnApiError, PublishError};

    const SECRET: &str = "s3cret";

    #[derive(Default)]
    struct CountingPipeline {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        async fn run(&self) -> Result<(), CoreError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingPipeline;

    #[async_trait]
    impl Pipeline for FailingPipeline {
        async fn run(&self) -> Result<(), CoreError> {
            Err(HnApiError::ServerError { status_code: 502 }.into())
        }
    }

    #[derive(Default)]
    struct BlockingPipeline {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Pipeline for BlockingPipeline {
        async fn run(&self) -> Result<(), CoreError> {
            self.started.notify_one();
            self.release.notified().await;
            Err(PublishError::Upload {
                key: "staging/x/full-data.json".to_string(),
                reason: "aborted".to_string(),
            }
            .into())
        }
    }

    fn cron_request(method: Method, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri("/api/cron");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_token_comparison() {
        assert!(constant_time_eq(b"s3cret", b"s3cret"));
        assert!(!constant_time_eq(b"s3cret", b"s3creT"));
        assert!(!constant_time_eq(b"s3cret", b"s3cret-longer"));
        assert!(!constant_time_eq(b"", b"s3cret"));
    }

    #[tokio::test]
    async fn test_prefix_of_secret_is_unauthorized() {
        let app = router(TriggerState::new(Arc::new(CountingPipeline::default()), SECRET));

        let response = app
            .oneshot(cron_request(Method::POST, Some("s3cre")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(TriggerState::new(Arc::new(CountingPipeline::default()), SECRET));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_get_is_rejected_with_allow_header() {
        let pipeline = Arc::new(CountingPipeline::default());
        let app = router(TriggerState::new(pipeline.clone(), SECRET));

        let response = app
            .oneshot(cron_request(Method::GET, Some(SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
        assert_eq!(json_body(response).await["success"], false);
        assert_eq!(pipeline.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_or_wrong_token_is_unauthorized() {
        let pipeline = Arc::new(CountingPipeline::default());
        let app = router(TriggerState::new(pipeline.clone(), SECRET));

        for token in [None, Some("wrong")] {
            let response = app
                .clone()
                .oneshot(cron_request(Method::POST, token))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(json_body(response).await["code"], "UNAUTHORIZED");
        }
        assert_eq!(pipeline.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authorized_post_runs_pipeline() {
        let pipeline = Arc::new(CountingPipeline::default());
        let app = router(TriggerState::new(pipeline.clone(), SECRET));

        let response = app
            .oneshot(cron_request(Method::POST, Some(SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "success": true }));
        assert_eq!(pipeline.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_reported() {
        let app = router(TriggerState::new(Arc::new(FailingPipeline), SECRET));

        let response = app
            .oneshot(cron_request(Method::POST, Some(SECRET)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "HN_API");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_concurrent_trigger_conflicts() {
        let pipeline = Arc::new(BlockingPipeline::default());
        let app = router(TriggerState::new(pipeline.clone(), SECRET));

        let first = tokio::spawn(
            app.clone()
                .oneshot(cron_request(Method::POST, Some(SECRET))),
        );
        pipeline.started.notified().await;

        let second = app
            .oneshot(cron_request(Method::POST, Some(SECRET)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        pipeline.release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(first).await["code"], "PUBLISH");
    }
}
