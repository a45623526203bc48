//! Report download endpoint.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// `GET /api/reports/:file`: download a generated PDF.
pub async fn download(
    State(ctx): State<ApiContext>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    if !is_report_file_name(&file) {
        return Err(ApiError::BadRequest("Invalid report name".into()));
    }

    let path = ctx.intake.renderer().output_dir().join(&file);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Report not found".into()));
        }
        Err(e) => return Err(ApiError::Internal(format!("Cannot read report: {e}"))),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Report names are generated server-side: ASCII word characters, one
/// `.pdf` extension, no path components.
fn is_report_file_name(name: &str) -> bool {
    name.ends_with(".pdf")
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
