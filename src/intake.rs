//! Intake Orchestrator: generate summary, archive it, render the report.
//!
//! The pipeline is linear. Nothing is archived or rendered unless the AI call
//! succeeded; any later failure is reported as text with no report path.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::{summary_error_text, Assistant, ERROR_PREFIX};
use crate::archive::{ArchiveRecord, RecordStore};
use crate::report::ReportRenderer;

/// Patient input for one evaluation. Lives for one request only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intake {
    pub name: String,
    pub patient_id: String,
    pub symptoms: String,
    pub physical_findings: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Summary generated, archived and rendered.
    Completed { summary: String, report: PathBuf },
    /// The AI call failed; `message` carries the user-visible error text.
    GenerationFailed { message: String },
    /// Archiving or rendering failed after a successful generation.
    ProcessingFailed { message: String },
}

impl IntakeOutcome {
    /// Text shown in the summary field: the summary or the error message.
    pub fn summary_text(&self) -> &str {
        match self {
            IntakeOutcome::Completed { summary, .. } => summary,
            IntakeOutcome::GenerationFailed { message }
            | IntakeOutcome::ProcessingFailed { message } => message,
        }
    }

    pub fn report_path(&self) -> Option<&PathBuf> {
        match self {
            IntakeOutcome::Completed { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, IntakeOutcome::Completed { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            IntakeOutcome::Completed { .. } => "completed",
            IntakeOutcome::GenerationFailed { .. } => "generation_failed",
            IntakeOutcome::ProcessingFailed { .. } => "processing_failed",
        }
    }
}

#[derive(Clone)]
pub struct IntakeService {
    assistant: Assistant,
    store: Arc<RecordStore>,
    renderer: Arc<ReportRenderer>,
}

impl IntakeService {
    pub fn new(assistant: Assistant, store: Arc<RecordStore>, renderer: Arc<ReportRenderer>) -> Self {
        Self {
            assistant,
            store,
            renderer,
        }
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    /// Run the whole pipeline for one intake. Blocks on the AI call.
    pub fn process(&self, intake: &Intake) -> IntakeOutcome {
        let summary = match self
            .assistant
            .generate_summary(&intake.symptoms, &intake.physical_findings)
        {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "Summary generation failed, nothing archived");
                return IntakeOutcome::GenerationFailed {
                    message: summary_error_text(&e),
                };
            }
        };

        match self.archive_and_render(intake, &summary) {
            Ok(report) => IntakeOutcome::Completed { summary, report },
            Err(message) => {
                tracing::error!(error = %message, "Intake processing failed");
                IntakeOutcome::ProcessingFailed {
                    message: format!("{ERROR_PREFIX}{message}"),
                }
            }
        }
    }

    fn archive_and_render(&self, intake: &Intake, summary: &str) -> Result<PathBuf, String> {
        let record = ArchiveRecord::new(
            &intake.name,
            &intake.patient_id,
            &intake.symptoms,
            &intake.physical_findings,
            summary,
        );
        self.store.append(record).map_err(|e| e.to_string())?;

        // No archive link: the QR code is not wired to stored records yet.
        let report = self
            .renderer
            .render(summary, &intake.name, &intake.patient_id, None)
            .map_err(|e| e.to_string())?;
        Ok(report.path)
    }
}
