//! Question-answering endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::ApiContext;
use crate::qa::ImageReference;

const MAX_QUESTION_CHARS: usize = 2000;

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct ImageView {
    pub visible: bool,
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub image: ImageView,
}

/// `POST /api/ask`: explain a term and point at its illustration, if any.
pub async fn ask(
    State(ctx): State<ApiContext>,
    ApiJson(req): ApiJson<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest("Question cannot be empty".into()));
    }
    if req.question.chars().count() > MAX_QUESTION_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Question too long (max {MAX_QUESTION_CHARS} chars)"
        )));
    }

    let service = ctx.qa.clone();
    let question = req.question;
    let result = tokio::task::spawn_blocking(move || service.ask(&question)).await?;

    let image = match &result.image {
        ImageReference::Show(path) => ImageView {
            visible: true,
            url: path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|name| format!("/images/{}", encode_path_segment(name))),
        },
        ImageReference::Hide => ImageView {
            visible: false,
            url: None,
        },
    };

    Ok(Json(AskResponse {
        answer: result.answer,
        image,
    }))
}

/// Percent-encode everything outside the URL unreserved set.
fn encode_path_segment(segment: &str) -> String {
    segment
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
