//! Intake submission endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::ApiContext;
use crate::intake::Intake;

/// Upper bound per free-text field, in characters.
const MAX_FIELD_CHARS: usize = 20_000;

#[derive(Deserialize)]
pub struct IntakeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub physical_findings: String,
}

#[derive(Serialize)]
pub struct IntakeResponse {
    pub status: &'static str,
    /// The generated summary, or the error text when the pipeline failed.
    pub summary: String,
    pub report_url: Option<String>,
}

/// `POST /api/intake`: run the summary → archive → report pipeline.
///
/// Pipeline failures are reported inside a 200 response; only malformed
/// input is rejected with an error status.
pub async fn submit(
    State(ctx): State<ApiContext>,
    ApiJson(req): ApiJson<IntakeRequest>,
) -> Result<Json<IntakeResponse>, ApiError> {
    if req.symptoms.trim().is_empty() && req.physical_findings.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Symptoms or physical findings are required".into(),
        ));
    }
    for (field, value) in [
        ("name", &req.name),
        ("patient_id", &req.patient_id),
        ("symptoms", &req.symptoms),
        ("physical_findings", &req.physical_findings),
    ] {
        if value.chars().count() > MAX_FIELD_CHARS {
            return Err(ApiError::BadRequest(format!(
                "Field {field} too long (max {MAX_FIELD_CHARS} chars)"
            )));
        }
    }

    let intake = Intake {
        name: req.name,
        patient_id: req.patient_id,
        symptoms: req.symptoms,
        physical_findings: req.physical_findings,
    };

    let service = ctx.intake.clone();
    let outcome = tokio::task::spawn_blocking(move || service.process(&intake)).await?;

    let report_url = outcome
        .report_path()
        .and_then(|path| path.file_name())
        .and_then(|name| name.to_str())
        .map(|name| format!("/api/reports/{name}"));

    Ok(Json(IntakeResponse {
        status: outcome.status(),
        summary: outcome.summary_text().to_string(),
        report_url,
    }))
}
