use tracing::{debug, info};

use crate::audio::{AudioBackend, HandleToken, PlaybackNotifier};
use crate::error::AudioError;

/// Stands in for a sound device on a terminal: announces the resource and
/// reports the narration as finished right away.
#[derive(Debug, Default)]
pub struct SilentBackend {
    last_url: Option<String>,
}

impl SilentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }
}

impl AudioBackend for SilentBackend {
    fn start(&mut self, url: &str, notifier: PlaybackNotifier) -> Result<(), AudioError> {
        if url.trim().is_empty() {
            return Err(AudioError::Unavailable {
                url: url.to_string(),
                reason: "empty resource".to_string(),
            });
        }
        info!("narration {}: {url}", notifier.token());
        self.last_url = Some(url.to_string());
        notifier.finished();
        Ok(())
    }

    fn release(&mut self, token: HandleToken) {
        debug!("narration {token} released");
    }
}
