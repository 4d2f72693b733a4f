//! Project export route.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use canvas::doc::Document;
use canvas::export::{ExportError, OutputFormat};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub document: Document,
    /// On-screen height of the editor surface the document was composed at.
    pub reference_viewport_height: f64,
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

/// `POST /api/projects/:id/export`: flatten the posted document.
///
/// Responds with the encoded image, or `422` with the user-facing failure
/// message when any image cannot be loaded.
pub async fn export_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<ExportRequest>,
) -> Response {
    let format = body.format.unwrap_or(state.config.output_format);
    let exporter = state.exporter(project_id, format).await;
    let result = exporter.export(body.document, body.reference_viewport_height).await;
    drop(exporter);
    let pruned = state.prune_idle_exporters().await;

    match result {
        Ok(bytes) => {
            info!(%project_id, bytes = bytes.len(), pruned, "project exported");
            let disposition = format!("attachment; filename=\"{project_id}.{}\"", format.extension());
            (
                [(CONTENT_TYPE, format.content_type().to_owned()), (CONTENT_DISPOSITION, disposition)],
                Arc::unwrap_or_clone(bytes),
            )
                .into_response()
        }
        Err(e) => {
            warn!(%project_id, error = %e, "project export failed");
            export_error_response(&e)
        }
    }
}

pub(crate) fn export_error_response(err: &ExportError) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(serde_json::json!({ "error": err.user_message() }))).into_response()
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
