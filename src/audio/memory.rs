use tracing::warn;

use crate::audio::{AudioBackend, HandleToken, PlaybackNotifier};
use crate::error::AudioError;

/// Backend that plays nothing and remembers everything. Playback ends only
/// when told to via [`MemoryBackend::finish`], which makes handle lifetimes
/// fully scriptable.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    started: Vec<(HandleToken, String)>,
    notifiers: Vec<PlaybackNotifier>,
    live: Vec<HandleToken>,
    released: Vec<HandleToken>,
    failing: Vec<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to open any of these resources.
    pub fn failing_on(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn started(&self) -> &[(HandleToken, String)] {
        &self.started
    }

    pub fn live(&self) -> Vec<HandleToken> {
        self.live.clone()
    }

    pub fn released(&self) -> Vec<HandleToken> {
        self.released.clone()
    }

    fn notifier(&self, token: HandleToken) -> Option<&PlaybackNotifier> {
        self.notifiers.iter().find(|n| n.token() == token)
    }

    /// Signal that `token` played to the end. Works for released handles too,
    /// which is how late callbacks are simulated.
    pub fn finish(&self, token: HandleToken) {
        if let Some(n) = self.notifier(token) {
            n.finished();
        }
    }

    /// Signal that `token` broke off mid-playback.
    pub fn break_off(&self, token: HandleToken) {
        if let Some(n) = self.notifier(token) {
            n.failed();
        }
    }
}

impl AudioBackend for MemoryBackend {
    fn start(&mut self, url: &str, notifier: PlaybackNotifier) -> Result<(), AudioError> {
        if self.failing.iter().any(|f| f == url) {
            return Err(AudioError::Unavailable {
                url: url.to_string(),
                reason: "refused by backend".to_string(),
            });
        }
        let token = notifier.token();
        self.started.push((token, url.to_string()));
        self.live.push(token);
        self.notifiers.push(notifier);
        Ok(())
    }

    fn release(&mut self, token: HandleToken) {
        let before = self.live.len();
        self.live.retain(|&t| t != token);
        if self.live.len() == before {
            warn!("release of handle {token} that is not live");
        }
        self.released.push(token);
    }
}
