use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, AudioCueController, PlaybackEvent};
use crate::error::LoadError;
use crate::lesson::{LessonKind, LessonSet};
use crate::report::ProgressReporter;
use crate::session::{
    AdvanceOutcome, ExerciseSession, NarratedGate, ReadingSession, ReadingStep, SelectOutcome,
    SessionOptions,
};

/// Identifies one lesson fetch. A result is only applied while its ticket is
/// still the one being waited on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

pub enum Flow {
    Idle,
    Loading { ticket: LoadTicket, kind: LessonKind },
    FillBlank(ExerciseSession),
    Reading(ReadingSession),
    /// The learner left; nothing arriving later may revive the flow.
    Exited,
}

impl Flow {
    fn name(&self) -> &'static str {
        match self {
            Flow::Idle => "idle",
            Flow::Loading { .. } => "loading",
            Flow::FillBlank(_) => "fill-blank",
            Flow::Reading(_) => "reading",
            Flow::Exited => "exited",
        }
    }
}

/// Ties a lesson flow to its narration: every lesson change restarts the cue,
/// leaving the flow stops it.
pub struct App<B> {
    pub flow: Flow,
    audio: AudioCueController<B>,
    reporter: Arc<dyn ProgressReporter>,
    options: SessionOptions,
    gate: NarratedGate,
    next_ticket: u64,
}

impl<B: AudioBackend> App<B> {
    pub fn new(
        backend: B,
        reporter: Arc<dyn ProgressReporter>,
        options: SessionOptions,
        gate: NarratedGate,
    ) -> Self {
        Self {
            flow: Flow::Idle,
            audio: AudioCueController::new(backend),
            reporter,
            options,
            gate,
            next_ticket: 0,
        }
    }

    pub fn audio(&self) -> &AudioCueController<B> {
        &self.audio
    }

    pub fn exercise(&self) -> Option<&ExerciseSession> {
        match &self.flow {
            Flow::FillBlank(s) => Some(s),
            _ => None,
        }
    }

    pub fn reading(&self) -> Option<&ReadingSession> {
        match &self.flow {
            Flow::Reading(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_exited(&self) -> bool {
        matches!(self.flow, Flow::Exited)
    }

    /// Start waiting for a lesson set. Supersedes any load still in flight.
    pub fn begin_load(&mut self, kind: LessonKind) -> LoadTicket {
        self.audio.stop();
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.flow = Flow::Loading { ticket, kind };
        debug!("waiting for {kind:?} lessons ({ticket:?})");
        ticket
    }

    /// Apply a finished fetch. Returns `Ok(false)` when the result arrived for
    /// a flow that no longer exists; a load failure leaves the app idle.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<LessonSet, LoadError>,
    ) -> Result<bool, LoadError> {
        let kind = match self.flow {
            Flow::Loading { ticket: live, kind } if live == ticket => kind,
            _ => {
                debug!("dropping lessons for {ticket:?}, flow is {}", self.flow.name());
                return Ok(false);
            }
        };

        let started = result.and_then(|set| {
            let flow = match kind {
                LessonKind::FillBlank => {
                    let reporter: Box<dyn ProgressReporter> = Box::new(Arc::clone(&self.reporter));
                    ExerciseSession::new(&set, self.options.clone(), reporter).map(Flow::FillBlank)
                }
                LessonKind::Narrated => ReadingSession::new(&set, self.gate).map(Flow::Reading),
            };
            flow.map(|flow| (set, flow))
        });
        let (set, urls) = match started {
            Ok((set, flow)) => {
                let urls = match &flow {
                    Flow::FillBlank(s) => s.audio_urls(),
                    Flow::Reading(r) => r.audio_urls(),
                    _ => Vec::new(),
                };
                self.flow = flow;
                (set, urls)
            }
            Err(e) => {
                self.flow = Flow::Idle;
                return Err(e);
            }
        };
        info!("{} lessons of set {} ready", urls.len(), set.id);

        self.audio.set_lessons(urls);
        self.cue(0);
        Ok(true)
    }

    fn cue(&mut self, lesson: usize) {
        let started = self.audio.play_for_lesson(lesson).is_ok();
        if let Flow::Reading(r) = &mut self.flow {
            if started {
                r.note_playback_started();
            } else {
                r.note_playback_failed();
            }
        }
    }

    pub fn select(&mut self, letter: char) -> Option<SelectOutcome> {
        match &mut self.flow {
            Flow::FillBlank(s) => Some(s.select(letter)),
            _ => None,
        }
    }

    /// Forward control of whichever flow is active.
    pub fn can_advance(&self) -> bool {
        match &self.flow {
            Flow::FillBlank(s) => s.can_advance(),
            Flow::Reading(r) => r.can_advance(),
            _ => false,
        }
    }

    pub fn advance(&mut self) -> Option<AdvanceOutcome> {
        let Flow::FillBlank(s) = &mut self.flow else {
            return None;
        };
        let outcome = s.advance();
        match outcome {
            AdvanceOutcome::Next(i) => self.cue(i),
            AdvanceOutcome::Finished { .. } => self.audio.stop(),
            AdvanceOutcome::Blocked => {}
        }
        Some(outcome)
    }

    pub fn next(&mut self) -> Option<ReadingStep> {
        let Flow::Reading(r) = &mut self.flow else {
            return None;
        };
        let step = r.next();
        match step {
            ReadingStep::Moved(i) => self.cue(i),
            ReadingStep::Quiz(_) | ReadingStep::Done => self.audio.stop(),
            ReadingStep::Blocked | ReadingStep::ExitFlow => {}
        }
        Some(step)
    }

    pub fn previous(&mut self) -> Option<ReadingStep> {
        let Flow::Reading(r) = &mut self.flow else {
            return None;
        };
        let step = r.previous();
        match step {
            ReadingStep::Moved(i) => self.cue(i),
            ReadingStep::ExitFlow => self.exit(),
            _ => {}
        }
        Some(step)
    }

    /// Replay the current lesson's narration.
    pub fn replay(&mut self) {
        let index = match &self.flow {
            Flow::FillBlank(s) => s.current_index(),
            Flow::Reading(r) => Some(r.index()),
            _ => None,
        };
        if let Some(i) = index {
            self.cue(i);
        }
    }

    /// Leave the flow: stop narration and ignore anything still in flight.
    pub fn exit(&mut self) {
        self.audio.stop();
        if !self.is_exited() {
            info!("leaving {} flow", self.flow.name());
        }
        self.flow = Flow::Exited;
    }

    /// Apply queued playback signals to the controller and the reading gate.
    pub fn pump_audio(&mut self) -> Vec<PlaybackEvent> {
        let applied = self.audio.pump();
        if let Flow::Reading(r) = &mut self.flow {
            for event in &applied {
                match event {
                    PlaybackEvent::Finished(_) => r.note_playback_finished(),
                    PlaybackEvent::Failed(_) => {
                        warn!("narration failed, forward navigation unlocked");
                        r.note_playback_failed();
                    }
                }
            }
        }
        applied
    }
}
