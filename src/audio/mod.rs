pub mod controller;
pub mod memory;
pub mod silent;

use std::fmt;
use std::sync::mpsc;

use crate::error::AudioError;

pub use controller::{AudioCueController, CueState};
pub use memory::MemoryBackend;
pub use silent::SilentBackend;

/// Identifies one playback instance. Strictly increasing per controller, so a
/// signal carrying an old token can be recognized and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleToken(u64);

impl HandleToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Finished(HandleToken),
    /// Playback broke after it had started.
    Failed(HandleToken),
}

impl PlaybackEvent {
    pub fn token(self) -> HandleToken {
        match self {
            PlaybackEvent::Finished(t) | PlaybackEvent::Failed(t) => t,
        }
    }
}

/// Given to a backend with each handle; reports that handle's fate back to the
/// controller. Safe to call from any thread, any number of times.
#[derive(Clone, Debug)]
pub struct PlaybackNotifier {
    token: HandleToken,
    tx: mpsc::Sender<PlaybackEvent>,
}

impl PlaybackNotifier {
    pub(crate) fn new(token: HandleToken, tx: mpsc::Sender<PlaybackEvent>) -> Self {
        Self { token, tx }
    }

    pub fn token(&self) -> HandleToken {
        self.token
    }

    pub fn finished(&self) {
        let _ = self.tx.send(PlaybackEvent::Finished(self.token));
    }

    pub fn failed(&self) {
        let _ = self.tx.send(PlaybackEvent::Failed(self.token));
    }
}

/// Whatever actually plays sound.
pub trait AudioBackend {
    /// Open `url` and start playing it under `notifier.token()`.
    fn start(&mut self, url: &str, notifier: PlaybackNotifier) -> Result<(), AudioError>;

    /// Stop and unload a handle that `start` accepted. Called exactly once per
    /// accepted handle.
    fn release(&mut self, token: HandleToken);
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn start(&mut self, url: &str, notifier: PlaybackNotifier) -> Result<(), AudioError> {
        (**self).start(url, notifier)
    }

    fn release(&mut self, token: HandleToken) {
        (**self).release(token)
    }
}
