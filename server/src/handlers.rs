use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use image_reducer_core::{default_output_folder, BatchConfig, EncodingStrategy};

use crate::jobs::{JobRegistry, JobState, Removal};

#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

#[derive(Debug, Serialize)]
struct Created {
    id: Uuid,
}

/// Body of `POST /batches`.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub input_folder: String,
    /// Defaults to `<input_folder>/reduced_images`.
    pub output_folder: Option<String>,
    #[serde(default)]
    pub lossy: bool,
    /// Quality for lossy runs, clamped to 10-95. Defaults to 85.
    pub quality: Option<i64>,
}

impl BatchRequest {
    pub fn to_config(&self) -> BatchConfig {
        let input = PathBuf::from(&self.input_folder);
        let output = match &self.output_folder {
            Some(out) => PathBuf::from(out),
            None if self.input_folder.is_empty() => PathBuf::new(),
            None => default_output_folder(&input),
        };
        let strategy = if self.lossy {
            match self.quality {
                Some(q) => EncodingStrategy::quality_reduced(q),
                None => EncodingStrategy::QualityReduced(Default::default()),
            }
        } else {
            EncodingStrategy::Lossless
        };
        BatchConfig::new(input, output, strategy)
    }
}

pub fn router(registry: JobRegistry) -> Router {
    Router::new()
        .route("/batches", post(create_batch))
        .route("/batches/:id", get(get_batch).delete(cancel_batch))
        .with_state(registry)
}

/// POST /batches
///
/// Validate the folders and start a batch in the background.
/// Responds 202 with the job id, or 400 if a folder is missing.
pub async fn create_batch(
    State(registry): State<JobRegistry>,
    Json(request): Json<BatchRequest>,
) -> Response {
    let config = request.to_config();
    if let Err(e) = config.validate() {
        log::warn!("Rejected batch request: {}", e);
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let id = registry.start(config);
    (StatusCode::ACCEPTED, ApiResponse::ok(Created { id })).into_response()
}

/// GET /batches/{id}
pub async fn get_batch(State(registry): State<JobRegistry>, Path(id): Path<Uuid>) -> Response {
    match registry.get(id) {
        Some(state) => ApiResponse::<JobState>::ok(state).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("no batch with id {id}")),
    }
}

/// DELETE /batches/{id}
///
/// Ask a running batch to stop before its next file (202), or drop a
/// finished one from the registry (200).
pub async fn cancel_batch(State(registry): State<JobRegistry>, Path(id): Path<Uuid>) -> Response {
    match registry.cancel(id) {
        Some(Removal::Cancelling) => (
            StatusCode::ACCEPTED,
            ApiResponse::ok(serde_json::json!({ "status": "cancelling" })),
        )
            .into_response(),
        Some(Removal::Removed) => {
            ApiResponse::ok(serde_json::json!({ "status": "removed" })).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("no batch with id {id}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn post_json(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/batches")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_job(id: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/batches/{id}"))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let req: BatchRequest = serde_json::from_str(r#"{"input_folder": "/photos"}"#).unwrap();
        let config = req.to_config();
        assert_eq!(config.output_folder, PathBuf::from("/photos/reduced_images"));
        assert_eq!(config.strategy, EncodingStrategy::Lossless);

        let req: BatchRequest =
            serde_json::from_str(r#"{"input_folder": "/p", "lossy": true, "quality": 400}"#).unwrap();
        assert_eq!(req.to_config().strategy, EncodingStrategy::quality_reduced(95));

        let req: BatchRequest = serde_json::from_str(r#"{"input_folder": "/p", "lossy": true}"#).unwrap();
        assert_eq!(req.to_config().strategy, EncodingStrategy::quality_reduced(85));
    }

    #[tokio::test]
    async fn test_missing_folder_is_bad_request() {
        let app = router(JobRegistry::new());
        let (status, body) = send(&app, post_json(serde_json::json!({ "input_folder": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let app = router(JobRegistry::new());
        let (status, _) = send(&app, get_job(&Uuid::new_v4().to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_runs_to_completion() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 6, Rgb([10, 20, 30])))
            .save_with_format(input.path().join("a.png"), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(input.path().join("b.jpg"), b"garbage").unwrap();

        let app = router(JobRegistry::new());
        let (status, body) = send(
            &app,
            post_json(serde_json::json!({
                "input_folder": input.path(),
                "output_folder": output.path(),
                "lossy": true,
                "quality": 50,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let mut job = serde_json::Value::Null;
        for _ in 0..200 {
            let (status, body) = send(&app, get_job(&id)).await;
            assert_eq!(status, StatusCode::OK);
            job = body["data"].clone();
            if job["status"] != "running" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(job["status"], "completed");
        assert_eq!(job["summary"]["total_files"], 2);
        assert_eq!(job["summary"]["succeeded_count"], 1);
        assert_eq!(job["progress"]["current"], 2);
        assert_eq!(job["results"].as_array().unwrap().len(), 2);
        assert!(output.path().join("a.png").is_file());
    }

    #[tokio::test]
    async fn test_empty_folder_job() {
        let input = tempfile::tempdir().unwrap();
        let registry = JobRegistry::new();
        let app = router(registry.clone());

        let (status, body) = send(
            &app,
            post_json(serde_json::json!({ "input_folder": input.path() })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

        for _ in 0..200 {
            if registry.get(id).map(|s| s.status) != Some(crate::jobs::JobStatus::Running) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let state = registry.get(id).unwrap();
        assert_eq!(state.status, crate::jobs::JobStatus::Empty);
        assert!(state.summary.is_none());
        assert!(!input.path().join("reduced_images").exists());

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/batches/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "removed");
        assert!(registry.get(id).is_none());

        let (status, _) = send(&app, get_job(&id.to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(registry.cancel(Uuid::new_v4()), None);
    }
}
