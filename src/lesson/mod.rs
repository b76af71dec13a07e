pub mod source;
pub mod validate;
pub mod wire;

use crate::engine::blank_matcher;
use crate::engine::highlight::{self, Segment};
use crate::engine::letter_pool::{LetterPool, RequirementMap};

pub const DEFAULT_BLANK_MARKER: char = '_';

/// Interactive lesson: fill the blanked letters of a sentence from a pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillBlankLesson {
    pub id: u64,
    pub sentence: Vec<char>,
    /// Same length as `sentence`; the correct letter at every blank.
    pub answer_key: Vec<char>,
    pub marker: char,
    pub designer_letters: Vec<char>,
    /// Letters the content designer listed as correct. Informational only;
    /// the requirement map is always derived from the blanks.
    pub declared_letters: Vec<char>,
    pub audio_url: Option<String>,
}

impl FillBlankLesson {
    pub fn new(id: u64, sentence: &str, answer_key: &str, designer_letters: &[char]) -> Self {
        Self {
            id,
            sentence: sentence.chars().collect(),
            answer_key: answer_key.chars().collect(),
            marker: DEFAULT_BLANK_MARKER,
            designer_letters: designer_letters.to_vec(),
            declared_letters: Vec::new(),
            audio_url: None,
        }
    }

    pub fn with_audio(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    pub fn sentence_text(&self) -> String {
        self.sentence.iter().collect()
    }

    pub fn blank_positions(&self) -> Vec<usize> {
        blank_matcher::blank_positions(&self.sentence, self.marker)
    }

    pub fn requirement(&self) -> RequirementMap {
        blank_matcher::requirement_map(&self.sentence, &self.answer_key, self.marker)
    }

    pub fn positions_for(&self, letter: char) -> Vec<usize> {
        blank_matcher::positions_for(letter, &self.sentence, &self.answer_key, self.marker)
    }

    pub fn build_pool(&self) -> LetterPool {
        LetterPool::build(&self.designer_letters, &self.requirement())
    }
}

/// Passive lesson: narrated text with emphasized terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarratedLesson {
    pub id: u64,
    pub title: String,
    pub text: String,
    pub highlights: Vec<String>,
    pub sounds: Vec<String>,
    pub audio_url: Option<String>,
}

impl NarratedLesson {
    pub fn segments(&self) -> Vec<Segment<'_>> {
        highlight::segments(&self.text, &self.highlights, &self.sounds)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LessonKind {
    Narrated,
    FillBlank,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lesson {
    Narrated(NarratedLesson),
    FillBlank(FillBlankLesson),
}

impl Lesson {
    pub fn id(&self) -> u64 {
        match self {
            Lesson::Narrated(l) => l.id,
            Lesson::FillBlank(l) => l.id,
        }
    }

    pub fn kind(&self) -> LessonKind {
        match self {
            Lesson::Narrated(_) => LessonKind::Narrated,
            Lesson::FillBlank(_) => LessonKind::FillBlank,
        }
    }

    pub fn audio_url(&self) -> Option<&str> {
        match self {
            Lesson::Narrated(l) => l.audio_url.as_deref(),
            Lesson::FillBlank(l) => l.audio_url.as_deref(),
        }
    }
}

/// Ordered, immutable lessons fetched once per session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonSet {
    /// Exercise id reported on completion.
    pub id: u64,
    pub title: String,
    pub kind: LessonKind,
    pub quiz_id: Option<u64>,
    lessons: Vec<Lesson>,
}

impl LessonSet {
    pub fn new(id: u64, title: impl Into<String>, kind: LessonKind, lessons: Vec<Lesson>) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
            quiz_id: None,
            lessons,
        }
    }

    pub fn fill_blank(id: u64, lessons: Vec<FillBlankLesson>) -> Self {
        Self::new(
            id,
            String::new(),
            LessonKind::FillBlank,
            lessons.into_iter().map(Lesson::FillBlank).collect(),
        )
    }

    pub fn narrated(id: u64, lessons: Vec<NarratedLesson>, quiz_id: Option<u64>) -> Self {
        let mut set = Self::new(
            id,
            String::new(),
            LessonKind::Narrated,
            lessons.into_iter().map(Lesson::Narrated).collect(),
        );
        set.quiz_id = quiz_id;
        set
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn get(&self, index: usize) -> Option<&Lesson> {
        self.lessons.get(index)
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.lessons.len()
    }

    pub fn fill_blank_at(&self, index: usize) -> Option<&FillBlankLesson> {
        match self.lessons.get(index) {
            Some(Lesson::FillBlank(l)) => Some(l),
            _ => None,
        }
    }

    pub fn narrated_at(&self, index: usize) -> Option<&NarratedLesson> {
        match self.lessons.get(index) {
            Some(Lesson::Narrated(l)) => Some(l),
            _ => None,
        }
    }

    pub fn audio_urls(&self) -> Vec<Option<String>> {
        self.lessons
            .iter()
            .map(|l| l.audio_url().map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_blank_helpers_delegate_to_engine() {
        let lesson = FillBlankLesson::new(1, "C_S_", "CASA", &['A', 'S', 'X']);
        assert_eq!(lesson.blank_positions(), vec![1, 3]);
        assert_eq!(lesson.requirement()[&'A'], 2);
        assert_eq!(lesson.positions_for('A'), vec![1, 3]);
        assert_eq!(lesson.build_pool().letters(), &['A', 'S', 'X', 'A']);
    }

    #[test]
    fn test_set_dispatches_by_variant() {
        let set = LessonSet::fill_blank(9, vec![FillBlankLesson::new(1, "_", "a", &[])]);
        assert_eq!(set.kind, LessonKind::FillBlank);
        assert!(set.fill_blank_at(0).is_some());
        assert!(set.narrated_at(0).is_none());
        assert!(set.is_last(0));
        assert!(set.get(1).is_none());
    }

    #[test]
    fn test_audio_urls_follow_lesson_order() {
        let set = LessonSet::fill_blank(
            1,
            vec![
                FillBlankLesson::new(1, "_", "a", &[]).with_audio("a.mp3"),
                FillBlankLesson::new(2, "_", "b", &[]),
            ],
        );
        assert_eq!(set.audio_urls(), vec![Some("a.mp3".to_string()), None]);
    }
}
