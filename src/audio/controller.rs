use std::sync::mpsc;

use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, HandleToken, PlaybackEvent, PlaybackNotifier};
use crate::error::AudioError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CueState {
    Idle,
    Playing { lesson: usize, token: HandleToken },
    /// Narration ended; the handle stays loaded until stopped or replaced.
    Finished { lesson: usize, token: HandleToken },
    /// Could not play this lesson's audio. No handle is held.
    Unavailable { lesson: usize },
}

/// Owns the single live sound. Starting a lesson's cue always releases the
/// previous handle first, and signals from released handles are ignored.
pub struct AudioCueController<B> {
    backend: B,
    urls: Vec<Option<String>>,
    state: CueState,
    next_token: u64,
    tx: mpsc::Sender<PlaybackEvent>,
    rx: mpsc::Receiver<PlaybackEvent>,
}

impl<B: AudioBackend> AudioCueController<B> {
    pub fn new(backend: B) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            urls: Vec::new(),
            state: CueState::Idle,
            next_token: 0,
            tx,
            rx,
        }
    }

    /// Audio resources by lesson index. Stops anything playing.
    pub fn set_lessons(&mut self, urls: Vec<Option<String>>) {
        self.stop();
        self.urls = urls;
    }

    pub fn state(&self) -> CueState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn active_token(&self) -> Option<HandleToken> {
        match self.state {
            CueState::Playing { token, .. } | CueState::Finished { token, .. } => Some(token),
            CueState::Idle | CueState::Unavailable { .. } => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, CueState::Playing { .. })
    }

    /// True once the current lesson's cue can no longer hold the learner back:
    /// it finished, it failed, or nothing is playing.
    pub fn playback_settled(&self) -> bool {
        !self.is_playing()
    }

    /// Release the current handle, then start lesson `lesson`'s cue.
    pub fn play_for_lesson(&mut self, lesson: usize) -> Result<HandleToken, AudioError> {
        self.stop();

        let Some(url) = self.urls.get(lesson).cloned().flatten() else {
            warn!("lesson {lesson} has no audio resource");
            self.state = CueState::Unavailable { lesson };
            return Err(AudioError::NoResource(lesson));
        };

        self.next_token += 1;
        let token = HandleToken::new(self.next_token);
        let notifier = PlaybackNotifier::new(token, self.tx.clone());
        match self.backend.start(&url, notifier) {
            Ok(()) => {
                debug!("cue {token} playing {url} for lesson {lesson}");
                self.state = CueState::Playing { lesson, token };
                Ok(token)
            }
            Err(e) => {
                warn!("cue for lesson {lesson} unavailable: {e}");
                self.state = CueState::Unavailable { lesson };
                Err(e)
            }
        }
    }

    /// Stop and release the current handle, if any.
    pub fn stop(&mut self) {
        if let Some(token) = self.active_token() {
            self.backend.release(token);
            debug!("cue {token} released");
        }
        self.state = CueState::Idle;
    }

    /// Apply one playback signal. Returns false when it was stale or redundant.
    pub fn handle_event(&mut self, event: PlaybackEvent) -> bool {
        let CueState::Playing { lesson, token } = self.state else {
            debug!("ignoring {event:?} in state {:?}", self.state);
            return false;
        };
        if event.token() != token {
            debug!("ignoring stale {event:?}, current cue is {token}");
            return false;
        }
        match event {
            PlaybackEvent::Finished(_) => {
                info!("narration for lesson {lesson} finished");
                self.state = CueState::Finished { lesson, token };
            }
            PlaybackEvent::Failed(_) => {
                warn!("narration for lesson {lesson} broke off");
                self.backend.release(token);
                self.state = CueState::Unavailable { lesson };
            }
        }
        true
    }

    /// Drain queued signals, returning those that changed state.
    pub fn pump(&mut self) -> Vec<PlaybackEvent> {
        let mut applied = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            if self.handle_event(event) {
                applied.push(event);
            }
        }
        applied
    }
}
