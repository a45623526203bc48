use std::sync::Arc;

use super::prompt::{
    build_question_prompt, build_summary_prompt, QUESTION_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use super::sanitize::strip_html_fences;
use super::types::LlmClient;
use super::AiError;

/// Prefix of a failed summary generation shown to the user.
pub const SUMMARY_ERROR_PREFIX: &str = "OpenAI hatası: ";
/// Prefix of configuration and processing failures shown to the user.
pub const ERROR_PREFIX: &str = "Hata: ";
/// Prefix of a failed question answer shown to the user.
pub const ANSWER_ERROR_PREFIX: &str = "Açıklama hatası: ";

/// The two completion paths the application needs, on top of any `LlmClient`.
#[derive(Clone)]
pub struct Assistant {
    client: Arc<dyn LlmClient>,
}

impl Assistant {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.has_credential()
    }

    /// Generate a clinical summary. Fenced `html` blocks echoed by the model
    /// are removed; nothing else is touched.
    pub fn generate_summary(
        &self,
        symptoms: &str,
        physical_findings: &str,
    ) -> Result<String, AiError> {
        if !self.client.has_credential() {
            return Err(AiError::MissingCredential);
        }

        let prompt = build_summary_prompt(symptoms, physical_findings);
        let raw = self.client.complete(SUMMARY_SYSTEM_PROMPT, &prompt)?;
        let summary = strip_html_fences(&raw);

        tracing::info!(
            raw_len = raw.len(),
            summary_len = summary.len(),
            "Clinical summary generated"
        );
        Ok(summary)
    }

    /// Answer a free-text question. Failures come back as user-visible text.
    pub fn answer_question(&self, question: &str) -> String {
        let prompt = build_question_prompt(question);
        match self.client.complete(QUESTION_SYSTEM_PROMPT, &prompt) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "Question answering failed");
                format!("{ANSWER_ERROR_PREFIX}{e}")
            }
        }
    }
}

/// User-visible text for a failed summary generation.
pub fn summary_error_text(err: &AiError) -> String {
    match err {
        AiError::MissingCredential => format!("{ERROR_PREFIX}{err}"),
        _ => format!("{SUMMARY_ERROR_PREFIX}{err}"),
    }
}
