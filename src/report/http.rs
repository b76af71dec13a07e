use tracing::debug;

use crate::error::TransportError;
use crate::net::{self, Endpoint};
use crate::report::{CompletionReport, ProgressReporter};

const REGISTER_PATH: &str = "usuarios_ejercicios/registrar_ejercicio_by_username";

/// Posts completions to the lesson server. Blocks for the duration of the
/// request; wrap in [`super::BackgroundReporter`] to keep the caller free.
pub struct HttpProgressReporter {
    endpoint: Endpoint,
}

impl HttpProgressReporter {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl ProgressReporter for HttpProgressReporter {
    fn report_completion(&self, report: &CompletionReport) -> Result<(), TransportError> {
        debug!("posting completion of exercise {}", report.exercise_id);
        net::post_json(&self.endpoint, REGISTER_PATH, report)
    }
}
