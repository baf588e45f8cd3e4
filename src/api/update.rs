use crate::state::{MergeError, TrainRegistry, UpdateRecord};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared state for the update endpoint
pub struct UpdateAppState {
    pub registry: Arc<TrainRegistry>,
}

/// Accepted request shapes for POST /update, tried in order:
/// `{"trains": [...]}`, a bare array, or a single update object
#[derive(Deserialize)]
#[serde(untagged)]
enum UpdatePayload {
    Wrapped { trains: Vec<UpdateRecord> },
    Batch(Vec<UpdateRecord>),
    Single(UpdateRecord),
}

impl UpdatePayload {
    /// Normalize to an ordered sequence of update records
    fn into_records(self) -> Vec<UpdateRecord> {
        match self {
            UpdatePayload::Wrapped { trains } => trains,
            UpdatePayload::Batch(records) => records,
            UpdatePayload::Single(record) => vec![record],
        }
    }
}

/// Success response for POST /update
#[derive(Serialize)]
struct UpdateResponse {
    ok: bool,
    changed: bool,
    timestamp: f64,
    trains_count: usize,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

/// Create router for the mutation endpoint
pub fn create_update_router(state: Arc<UpdateAppState>) -> Router {
    Router::new()
        .route("/update", post(post_update))
        .with_state(state)
}

/// POST /update - Merge one or more partial train updates
async fn post_update(
    State(state): State<Arc<UpdateAppState>>,
    body: Bytes,
) -> Result<Json<UpdateResponse>, AppError> {
    let value: Value =
        serde_json::from_slice(&body).map_err(|_| AppError::InvalidJson)?;

    let payload: UpdatePayload =
        serde_json::from_value(value).map_err(|_| AppError::UnsupportedPayload)?;

    let records = payload.into_records();
    debug!(records = records.len(), "Merging update batch");

    let outcome = state.registry.apply_updates(&records)?;

    if outcome.changed {
        info!(
            trains = outcome.trains_count,
            timestamp = outcome.timestamp,
            "State updated"
        );
    }

    Ok(Json(UpdateResponse {
        ok: true,
        changed: outcome.changed,
        timestamp: outcome.timestamp,
        trains_count: outcome.trains_count,
    }))
}

/// Application error types
enum AppError {
    /// Body is not valid JSON
    InvalidJson,
    /// Valid JSON, but not one of the accepted payload shapes
    UnsupportedPayload,
    /// New-train construction rejected a field value
    Merge(MergeError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = match self {
            AppError::InvalidJson => "Invalid or missing JSON".to_string(),
            AppError::UnsupportedPayload => "Unsupported payload format".to_string(),
            AppError::Merge(e) => e.to_string(),
        };

        let body = Json(ErrorResponse { ok: false, error });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

impl From<MergeError> for AppError {
    fn from(e: MergeError) -> Self {
        AppError::Merge(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<UpdatePayload, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_wrapped_payload_normalizes() {
        let payload = parse(json!({"trains": [{"id": "A"}, {"id": "B"}]})).unwrap();
        assert_eq!(payload.into_records().len(), 2);
    }

    #[test]
    fn test_bare_array_normalizes() {
        let payload = parse(json!([{"id": "A"}])).unwrap();
        assert_eq!(payload.into_records().len(), 1);
    }

    #[test]
    fn test_single_object_normalizes() {
        let payload = parse(json!({"id": "A", "lat": 1.0})).unwrap();
        assert_eq!(payload.into_records().len(), 1);
    }

    #[test]
    fn test_object_with_non_array_trains_is_a_single_record() {
        // "trains" present but not a list: falls through to the
        // single-object shape (and has no id, so it merges as a no-op)
        let payload = parse(json!({"trains": "nope"})).unwrap();
        let records = payload.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), None);
    }

    #[test]
    fn test_scalar_payload_rejected() {
        assert!(parse(json!(42)).is_err());
        assert!(parse(json!("hello")).is_err());
        assert!(parse(json!([1, 2, 3])).is_err());
    }
}
