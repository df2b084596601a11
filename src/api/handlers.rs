//! Request handlers

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::edit::{RawEditForm, ValidationError};
use crate::error::{AppError, Result};
use crate::response::EditResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub persistence: bool,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        persistence: state.pipeline.persistence_enabled(),
    })
}

/// POST /api/edit - Edit a room photo from a multipart form
///
/// The whole request runs under the configured wall-clock budget. Dropping
/// this future (client gone, timeout) aborts any in-flight upstream call.
pub async fn edit_image(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<EditResponse>> {
    let mut multipart =
        multipart.map_err(|rejection| ValidationError::MalformedForm(rejection.body_text()))?;

    let budget_secs = state.settings.server.request_timeout_secs;
    match tokio::time::timeout(
        Duration::from_secs(budget_secs),
        run_edit(&state, &mut multipart),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            warn!(budget_secs, "Edit request timed out");
            Err(AppError::Timeout(format!(
                "Edit request did not finish within {} seconds",
                budget_secs
            )))
        }
    }
}

async fn run_edit(state: &AppState, multipart: &mut Multipart) -> Result<Json<EditResponse>> {
    let limits = &state.settings.limits;
    let request = RawEditForm::from_multipart(multipart, limits)
        .await?
        .validate(limits)?;

    let result = state.pipeline.run(request).await?;
    Ok(Json(EditResponse::new(&result.png, result.blobs)))
}
