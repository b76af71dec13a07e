use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LoadError;
use crate::lesson::{Lesson, LessonSet, NarratedLesson};

/// When the forward control of a narrated lesson is enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarratedGate {
    /// Only after the lesson's narration finished (or failed to play).
    #[default]
    AfterPlayback,
    /// Never gated.
    Always,
}

impl NarratedGate {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "after_playback" => Some(Self::AfterPlayback),
            "always" => Some(Self::Always),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadingStep {
    Moved(usize),
    Blocked,
    /// Backward from the first lesson leaves the flow.
    ExitFlow,
    /// Past the last lesson, continue with the attached quiz.
    Quiz(u64),
    /// Past the last lesson with no quiz attached.
    Done,
}

/// Walks a narrated lesson set forwards and backwards.
pub struct ReadingSession {
    set_id: u64,
    lessons: Vec<NarratedLesson>,
    quiz_id: Option<u64>,
    gate: NarratedGate,
    index: usize,
    playback_settled: bool,
    done: bool,
}

impl ReadingSession {
    pub fn new(set: &LessonSet, gate: NarratedGate) -> Result<Self, LoadError> {
        let lessons: Vec<NarratedLesson> = set
            .lessons()
            .iter()
            .filter_map(|l| match l {
                Lesson::Narrated(l) => Some(l.clone()),
                Lesson::FillBlank(_) => None,
            })
            .collect();
        if lessons.is_empty() {
            return Err(LoadError::Empty {
                kind: "narrated".to_string(),
                rejected: set.len(),
            });
        }
        Ok(Self {
            set_id: set.id,
            lessons,
            quiz_id: set.quiz_id,
            gate,
            index: 0,
            playback_settled: true,
            done: false,
        })
    }

    pub fn set_id(&self) -> u64 {
        self.set_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    pub fn current(&self) -> &NarratedLesson {
        &self.lessons[self.index]
    }

    /// Narration resource of every lesson, indexed like the session's lessons.
    pub fn audio_urls(&self) -> Vec<Option<String>> {
        self.lessons.iter().map(|l| l.audio_url.clone()).collect()
    }

    pub fn gate(&self) -> NarratedGate {
        self.gate
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn note_playback_started(&mut self) {
        self.playback_settled = false;
    }

    pub fn note_playback_finished(&mut self) {
        self.playback_settled = true;
    }

    /// A media failure must not strand the learner.
    pub fn note_playback_failed(&mut self) {
        self.playback_settled = true;
    }

    pub fn can_advance(&self) -> bool {
        !self.done
            && match self.gate {
                NarratedGate::Always => true,
                NarratedGate::AfterPlayback => self.playback_settled,
            }
    }

    pub fn next(&mut self) -> ReadingStep {
        if !self.can_advance() {
            debug!("next blocked at lesson {}", self.index);
            return ReadingStep::Blocked;
        }
        if self.index + 1 < self.lessons.len() {
            self.move_to(self.index + 1);
            return ReadingStep::Moved(self.index);
        }
        self.done = true;
        info!("reading set {} done", self.set_id);
        match self.quiz_id {
            Some(quiz) => ReadingStep::Quiz(quiz),
            None => ReadingStep::Done,
        }
    }

    pub fn previous(&mut self) -> ReadingStep {
        if self.done {
            return ReadingStep::Blocked;
        }
        if self.index == 0 {
            return ReadingStep::ExitFlow;
        }
        self.move_to(self.index - 1);
        ReadingStep::Moved(self.index)
    }

    fn move_to(&mut self, index: usize) {
        self.index = index;
        self.playback_settled = true;
        debug!("reading lesson {}/{}", index + 1, self.lessons.len());
    }
}
