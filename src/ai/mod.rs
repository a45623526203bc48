//! AI client adapter: prompt building, one remote chat completion per call,
//! and clean-up of the returned text.

pub mod assistant;
pub mod openai;
pub mod prompt;
pub mod sanitize;
pub mod types;

pub use assistant::*;
pub use openai::*;
pub use prompt::*;
pub use sanitize::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("OpenAI API anahtarı eksik. '{}' ortam değişkenini ayarlayın.", crate::config::API_KEY_VAR)]
    MissingCredential,

    #[error("Cannot reach AI service at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("AI service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("AI service returned no content")]
    EmptyResponse,
}
