pub mod background;
pub mod http;

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::TransportError;

pub use background::BackgroundReporter;
pub use http::HttpProgressReporter;

/// Body of the "mark exercise complete" call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub username: String,
    #[serde(rename = "idEjercicio")]
    pub exercise_id: u64,
    #[serde(rename = "completado")]
    pub completed: bool,
    #[serde(rename = "puntuacion")]
    pub score: u32,
}

impl CompletionReport {
    pub fn new(username: impl Into<String>, exercise_id: u64, score: u32) -> Self {
        Self {
            username: username.into(),
            exercise_id,
            completed: true,
            score,
        }
    }
}

/// Records that a learner finished an exercise set. Called once per set;
/// retries are the implementation's business.
pub trait ProgressReporter {
    fn report_completion(&self, report: &CompletionReport) -> Result<(), TransportError>;
}

/// Reporter used when no server is configured: the completion is only logged.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report_completion(&self, report: &CompletionReport) -> Result<(), TransportError> {
        info!(
            "exercise {} completed by {:?} (score {})",
            report.exercise_id, report.username, report.score
        );
        Ok(())
    }
}

/// Keeps every report it receives; optionally fails each call.
#[derive(Clone, Debug, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<CompletionReport>>>,
    fail: bool,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn reports(&self) -> Vec<CompletionReport> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report_completion(&self, report: &CompletionReport) -> Result<(), TransportError> {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report.clone());
        }
        if self.fail {
            return Err(TransportError::Request("simulated failure".to_string()));
        }
        Ok(())
    }
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for Box<R> {
    fn report_completion(&self, report: &CompletionReport) -> Result<(), TransportError> {
        (**self).report_completion(report)
    }
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for Arc<R> {
    fn report_completion(&self, report: &CompletionReport) -> Result<(), TransportError> {
        (**self).report_completion(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_body_uses_server_field_names() {
        let report = CompletionReport::new("ana", 12, 10);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "username": "ana",
                "idEjercicio": 12,
                "completado": true,
                "puntuacion": 10
            })
        );
    }

    #[test]
    fn test_recording_reporter_keeps_reports_even_when_failing() {
        let reporter = RecordingReporter::failing();
        let handle = reporter.clone();
        assert!(reporter.report_completion(&CompletionReport::new("a", 1, 1)).is_err());
        assert_eq!(handle.reports().len(), 1);
    }
}
