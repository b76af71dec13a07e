use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::engine::letter_pool::{LetterPool, RequirementMap};
use crate::error::LoadError;
use crate::lesson::validate;
use crate::lesson::{FillBlankLesson, Lesson, LessonSet};
use crate::report::{CompletionReport, ProgressReporter};
use crate::session::feedback::{COMPLETION_MESSAGE, Feedback};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Lesson set up, nothing placed yet.
    Ready(usize),
    Selecting(usize),
    /// Every blank filled; forward navigation allowed.
    Complete(usize),
    Finished,
}

impl SessionPhase {
    pub fn lesson_index(self) -> Option<usize> {
        match self {
            SessionPhase::Ready(i) | SessionPhase::Selecting(i) | SessionPhase::Complete(i) => {
                Some(i)
            }
            SessionPhase::Finished => None,
        }
    }
}

/// Why a selection had no effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Every blank needing this letter is already filled.
    AlreadySatisfied,
    /// A distractor: no blank needs this letter.
    NotRequired,
    /// The letter is not in the pool.
    NotOffered,
    /// The lesson is complete or the session finished.
    Inactive,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    Placed {
        letter: char,
        positions: Vec<usize>,
        completed: bool,
    },
    Rejected(Rejection),
}

impl SelectOutcome {
    pub fn feedback(&self) -> Option<Feedback> {
        match self {
            SelectOutcome::Placed {
                completed: true, ..
            } => Some(Feedback::Spoken(COMPLETION_MESSAGE)),
            SelectOutcome::Placed { .. } => None,
            SelectOutcome::Rejected(_) => Some(Feedback::Haptic),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Current lesson not complete; nothing changed.
    Blocked,
    Next(usize),
    /// Last lesson done. `reported` is whether the reporter accepted the call;
    /// the session is finished either way.
    Finished { reported: bool },
}

impl AdvanceOutcome {
    pub fn feedback(&self) -> Option<Feedback> {
        match self {
            AdvanceOutcome::Blocked => Some(Feedback::Haptic),
            AdvanceOutcome::Next(_) => None,
            AdvanceOutcome::Finished { .. } => Some(Feedback::Celebrate),
        }
    }
}

/// One blank of the active lesson, in sentence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub position: usize,
    pub placed: Option<char>,
}

/// Who is practicing and what a completed set is worth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub username: String,
    pub score: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            username: String::new(),
            score: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub exercise_id: u64,
    pub lessons_total: usize,
    pub lessons_completed: usize,
    pub letters_placed: usize,
    pub rejected_selections: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub reported: Option<bool>,
}

/// Letter-completion engine for one fill-blank lesson set.
pub struct ExerciseSession {
    exercise_id: u64,
    lessons: Vec<FillBlankLesson>,
    options: SessionOptions,
    reporter: Box<dyn ProgressReporter>,
    phase: SessionPhase,
    slots: Vec<Slot>,
    pool: LetterPool,
    requirement: RequirementMap,
    lessons_completed: usize,
    letters_placed: usize,
    rejected_selections: usize,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    reported: Option<bool>,
}

impl ExerciseSession {
    /// Keeps the fill-blank lessons of `set` that can be solved. Fails when
    /// none are left; there is no partial session.
    pub fn new(
        set: &LessonSet,
        options: SessionOptions,
        reporter: Box<dyn ProgressReporter>,
    ) -> Result<Self, LoadError> {
        let mut lessons = Vec::new();
        let mut rejected = 0;
        for lesson in set.lessons() {
            let Lesson::FillBlank(lesson) = lesson else {
                continue;
            };
            match validate::validate_fill_blank(lesson) {
                Ok(_) => lessons.push(lesson.clone()),
                Err(e) => {
                    warn!("skipping lesson: {e}");
                    rejected += 1;
                }
            }
        }
        if lessons.is_empty() {
            return Err(LoadError::Empty {
                kind: "fill-blank".to_string(),
                rejected,
            });
        }

        let mut session = Self {
            exercise_id: set.id,
            lessons,
            options,
            reporter,
            phase: SessionPhase::Ready(0),
            slots: Vec::new(),
            pool: LetterPool::default(),
            requirement: RequirementMap::new(),
            lessons_completed: 0,
            letters_placed: 0,
            rejected_selections: 0,
            started_at: Utc::now(),
            finished_at: None,
            reported: None,
        };
        session.enter(0);
        Ok(session)
    }

    fn enter(&mut self, index: usize) {
        let lesson = &self.lessons[index];
        self.requirement = lesson.requirement();
        self.pool = lesson.build_pool();
        self.slots = lesson
            .blank_positions()
            .into_iter()
            .map(|position| Slot {
                position,
                placed: None,
            })
            .collect();
        self.phase = if self.slots.is_empty() {
            self.lessons_completed += 1;
            SessionPhase::Complete(index)
        } else {
            SessionPhase::Ready(index)
        };
        info!(
            "lesson {}/{} ready: {} blanks, pool {:?}",
            index + 1,
            self.lessons.len(),
            self.slots.len(),
            self.pool.letters()
        );
    }

    fn reject(&mut self, letter: char, why: Rejection) -> SelectOutcome {
        debug!("selection of {letter:?} rejected: {why:?}");
        self.rejected_selections += 1;
        SelectOutcome::Rejected(why)
    }

    /// Place `letter` into every empty blank that needs it.
    pub fn select(&mut self, letter: char) -> SelectOutcome {
        let index = match self.phase {
            SessionPhase::Ready(i) | SessionPhase::Selecting(i) => i,
            SessionPhase::Complete(_) | SessionPhase::Finished => {
                return self.reject(letter, Rejection::Inactive);
            }
        };

        let max = self.requirement.get(&letter).copied().unwrap_or(0);
        if max == 0 {
            let why = if self.pool.contains(letter) {
                Rejection::NotRequired
            } else {
                Rejection::NotOffered
            };
            return self.reject(letter, why);
        }
        let picked = self.slots.iter().filter(|s| s.placed == Some(letter)).count();
        if picked >= max {
            return self.reject(letter, Rejection::AlreadySatisfied);
        }
        if !self.pool.contains(letter) {
            return self.reject(letter, Rejection::NotOffered);
        }

        let mut filled = Vec::new();
        for position in self.lessons[index].positions_for(letter) {
            if let Ok(slot_idx) = self.slots.binary_search_by_key(&position, |s| s.position) {
                let slot = &mut self.slots[slot_idx];
                if slot.placed.is_none() {
                    slot.placed = Some(letter);
                    filled.push(position);
                }
            }
        }
        if filled.is_empty() {
            return self.reject(letter, Rejection::NotRequired);
        }

        self.pool.take(letter, filled.len());
        self.letters_placed += filled.len();

        let completed = self.slots.iter().all(|s| s.placed.is_some());
        self.phase = if completed {
            self.lessons_completed += 1;
            SessionPhase::Complete(index)
        } else {
            SessionPhase::Selecting(index)
        };
        debug!("placed {letter:?} at {filled:?}, complete: {completed}");

        SelectOutcome::Placed {
            letter,
            positions: filled,
            completed,
        }
    }

    /// Move past a completed lesson. Does nothing unless the current lesson is complete.
    pub fn advance(&mut self) -> AdvanceOutcome {
        let SessionPhase::Complete(index) = self.phase else {
            debug!("advance ignored in {:?}", self.phase);
            return AdvanceOutcome::Blocked;
        };

        if index + 1 < self.lessons.len() {
            self.enter(index + 1);
            return AdvanceOutcome::Next(index + 1);
        }

        self.phase = SessionPhase::Finished;
        self.finished_at = Some(Utc::now());
        let report = CompletionReport::new(
            &self.options.username,
            self.exercise_id,
            self.options.score,
        );
        let reported = match self.reporter.report_completion(&report) {
            Ok(()) => true,
            Err(e) => {
                error!("completion report for exercise {} failed: {e}", self.exercise_id);
                false
            }
        };
        self.reported = Some(reported);
        info!("exercise {} finished", self.exercise_id);
        AdvanceOutcome::Finished { reported }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, SessionPhase::Complete(_))
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    /// Whether the forward control should be enabled.
    pub fn can_advance(&self) -> bool {
        self.is_complete()
    }

    pub fn exercise_id(&self) -> u64 {
        self.exercise_id
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.phase.lesson_index()
    }

    pub fn current_lesson(&self) -> Option<&FillBlankLesson> {
        self.current_index().map(|i| &self.lessons[i])
    }

    /// Narration resource of every lesson, indexed like the session's lessons.
    pub fn audio_urls(&self) -> Vec<Option<String>> {
        self.lessons.iter().map(|l| l.audio_url.clone()).collect()
    }

    pub fn pool(&self) -> &LetterPool {
        &self.pool
    }

    pub fn requirement(&self) -> &RequirementMap {
        &self.requirement
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn remaining_blanks(&self) -> usize {
        self.slots.iter().filter(|s| s.placed.is_none()).count()
    }

    /// The sentence with placed letters substituted for their blanks.
    pub fn rendered_sentence(&self) -> String {
        let Some(lesson) = self.current_lesson() else {
            return String::new();
        };
        let mut chars = lesson.sentence.clone();
        for slot in &self.slots {
            if let Some(ch) = slot.placed {
                chars[slot.position] = ch;
            }
        }
        chars.into_iter().collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            exercise_id: self.exercise_id,
            lessons_total: self.lessons.len(),
            lessons_completed: self.lessons_completed,
            letters_placed: self.letters_placed,
            rejected_selections: self.rejected_selections,
            started_at: self.started_at,
            finished_at: self.finished_at,
            reported: self.reported,
        }
    }
}
