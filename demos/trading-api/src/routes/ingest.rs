use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateSpimexBody {
    /// Trading days to ingest, each `dd.mm.yyyy`.
    pub date: Vec<String>,
}

/// POST /create_spimex  `{"date": ["11.09.2025", "12.09.2025"]}`
///
/// Download, parse and store the reports for the given days. Nothing is
/// stored unless every day succeeds.
pub async fn create_spimex(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSpimexBody>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if body.date.is_empty() {
        return Err(AppError::bad_request("At least one date is required"));
    }
    if let Some(bad) = body.date.iter().find(|d| d.chars().count() != 10) {
        return Err(AppError::bad_request(format!(
            "Date {bad:?} must be exactly 10 characters (dd.mm.yyyy)"
        )));
    }

    let stored = state.sdk.ingest_and_store(body.date).await?;
    tracing::info!(records = stored.len(), "ingested trading results");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": StatusCode::CREATED.as_u16() })),
    ))
}
