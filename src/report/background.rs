use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::error::TransportError;
use crate::report::{CompletionReport, ProgressReporter};

/// Runs each report on its own thread so the learner never waits on the
/// server. Failures are logged; the caller always sees `Ok`.
pub struct BackgroundReporter<R> {
    inner: Arc<R>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<R> BackgroundReporter<R>
where
    R: ProgressReporter + Send + Sync + 'static,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner: Arc::new(inner),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Wait for every report sent so far. Used before process exit.
    pub fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl<R> ProgressReporter for BackgroundReporter<R>
where
    R: ProgressReporter + Send + Sync + 'static,
{
    fn report_completion(&self, report: &CompletionReport) -> Result<(), TransportError> {
        let inner = Arc::clone(&self.inner);
        let report = report.clone();
        let handle = thread::spawn(move || match inner.report_completion(&report) {
            Ok(()) => info!("completion of exercise {} recorded", report.exercise_id),
            Err(e) => error!("could not record completion of exercise {}: {e}", report.exercise_id),
        });
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(handle);
        }
        Ok(())
    }
}

impl<R> Drop for BackgroundReporter<R> {
    fn drop(&mut self) {
        if let Ok(pending) = self.pending.get_mut() {
            for handle in pending.drain(..) {
                let _ = handle.join();
            }
        }
    }
}
