//! Shared state for the API router.

use std::sync::Arc;

use crate::ai::{Assistant, LlmClient};
use crate::archive::RecordStore;
use crate::config::AppConfig;
use crate::intake::IntakeService;
use crate::qa::{ImageLibrary, QaService};
use crate::report::ReportRenderer;

/// Services behind every route. Cheap to clone.
#[derive(Clone)]
pub struct ApiContext {
    pub intake: IntakeService,
    pub qa: QaService,
}

impl ApiContext {
    pub fn new(intake: IntakeService, qa: QaService) -> Self {
        Self { intake, qa }
    }

    /// Wire every service from configuration around one LLM client.
    pub fn from_config(config: &AppConfig, client: Arc<dyn LlmClient>) -> Self {
        let assistant = Assistant::new(client);
        let intake = IntakeService::new(
            assistant.clone(),
            Arc::new(RecordStore::new(&config.archive_file)),
            Arc::new(ReportRenderer::from_config(config)),
        );
        let qa = QaService::new(assistant, ImageLibrary::new(&config.images_dir));
        Self::new(intake, qa)
    }
}
