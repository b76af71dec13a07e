use tracing::warn;

use crate::engine::letter_pool::{self, RequirementMap};
use crate::error::ContentIntegrityError;
use crate::lesson::{FillBlankLesson, Lesson};

/// Content oddities that still leave a lesson solvable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentWarning {
    /// `letrasCorrectas` disagrees with the letters the blanks actually need.
    DeclaredLettersDisagree {
        lesson_id: u64,
        declared: RequirementMap,
        derived: RequirementMap,
    },
    /// Nothing to fill; the lesson starts out complete.
    NoBlanks { lesson_id: u64 },
    /// Playback will fail; forward gating stays permissive.
    MissingAudio { lesson_id: u64 },
}

/// Outcome of screening a batch of lessons at load time.
#[derive(Clone, Debug, Default)]
pub struct LoadReport {
    pub accepted: usize,
    pub rejected: Vec<ContentIntegrityError>,
    pub warnings: Vec<ContentWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.warnings.is_empty()
    }
}

pub fn validate_fill_blank(
    lesson: &FillBlankLesson,
) -> Result<Vec<ContentWarning>, ContentIntegrityError> {
    if lesson.sentence.len() != lesson.answer_key.len() {
        return Err(ContentIntegrityError::LengthMismatch {
            lesson_id: lesson.id,
            sentence_len: lesson.sentence.len(),
            key_len: lesson.answer_key.len(),
        });
    }

    let blanks = lesson.blank_positions();
    for &pos in &blanks {
        let found = lesson.answer_key[pos];
        if found == lesson.marker {
            return Err(ContentIntegrityError::UnreachableBlank {
                lesson_id: lesson.id,
                position: pos,
                found,
            });
        }
        if !found.is_alphabetic() {
            return Err(ContentIntegrityError::NonLetterBlank {
                lesson_id: lesson.id,
                position: pos,
                found,
            });
        }
    }

    let mut warnings = Vec::new();
    if blanks.is_empty() {
        warnings.push(ContentWarning::NoBlanks { lesson_id: lesson.id });
    }
    if !lesson.declared_letters.is_empty() {
        let declared = letter_pool::frequency(&lesson.declared_letters);
        let derived = lesson.requirement();
        if declared != derived {
            warnings.push(ContentWarning::DeclaredLettersDisagree {
                lesson_id: lesson.id,
                declared,
                derived,
            });
        }
    }
    Ok(warnings)
}

pub fn validate(lesson: &Lesson) -> Result<Vec<ContentWarning>, ContentIntegrityError> {
    let mut warnings = match lesson {
        Lesson::FillBlank(l) => validate_fill_blank(l)?,
        Lesson::Narrated(_) => Vec::new(),
    };
    if lesson.audio_url().is_none() {
        warnings.push(ContentWarning::MissingAudio {
            lesson_id: lesson.id(),
        });
    }
    Ok(warnings)
}

/// Drop every lesson that cannot be solved, keeping the order of the rest.
pub fn screen(candidates: Vec<Result<Lesson, ContentIntegrityError>>) -> (Vec<Lesson>, LoadReport) {
    let mut report = LoadReport::default();
    let mut kept = Vec::new();

    for candidate in candidates {
        match candidate.and_then(|lesson| validate(&lesson).map(|w| (lesson, w))) {
            Ok((lesson, warnings)) => {
                for w in &warnings {
                    warn!("lesson {}: {w:?}", lesson.id());
                }
                report.warnings.extend(warnings);
                kept.push(lesson);
            }
            Err(e) => {
                warn!("skipping lesson: {e}");
                report.rejected.push(e);
            }
        }
    }

    report.accepted = kept.len();
    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(sentence: &str, key: &str) -> FillBlankLesson {
        FillBlankLesson::new(1, sentence, key, &[]).with_audio("x.mp3")
    }

    #[test]
    fn test_valid_lesson_has_no_warnings() {
        let l = lesson("C_S_", "CASA");
        assert_eq!(validate_fill_blank(&l), Ok(vec![]));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = validate_fill_blank(&lesson("C_S_", "CAS")).unwrap_err();
        assert!(matches!(
            err,
            ContentIntegrityError::LengthMismatch {
                sentence_len: 4,
                key_len: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_blank_over_marker_is_unreachable() {
        let err = validate_fill_blank(&lesson("a_b", "a_b")).unwrap_err();
        assert!(matches!(
            err,
            ContentIntegrityError::UnreachableBlank { position: 1, found: '_', .. }
        ));
    }

    #[test]
    fn test_blank_over_non_letter_has_its_own_reason() {
        let err = validate_fill_blank(&lesson("a_b", "a b")).unwrap_err();
        assert!(matches!(
            err,
            ContentIntegrityError::NonLetterBlank { position: 1, found: ' ', .. }
        ));

        let err = validate_fill_blank(&lesson("_ gatos", "3 gatos")).unwrap_err();
        assert!(matches!(err, ContentIntegrityError::NonLetterBlank { found: '3', .. }));
        assert!(err.to_string().contains("non-letter"));
    }

    #[test]
    fn test_declared_letters_mismatch_is_only_a_warning() {
        let mut l = lesson("C_S_", "CASA");
        l.declared_letters = vec!['A'];
        let warnings = validate_fill_blank(&l).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            ContentWarning::DeclaredLettersDisagree { derived, .. } if derived[&'A'] == 2
        ));
    }

    #[test]
    fn test_screen_keeps_order_and_collects_rejections() {
        let candidates = vec![
            Ok(Lesson::FillBlank(FillBlankLesson::new(1, "_", "a", &[]))),
            Ok(Lesson::FillBlank(FillBlankLesson::new(2, "__", "a", &[]))),
            Err(ContentIntegrityError::BadLetter {
                lesson_id: 3,
                entry: "xy".to_string(),
            }),
            Ok(Lesson::FillBlank(FillBlankLesson::new(4, "b_", "ba", &[]))),
        ];
        let (kept, report) = screen(candidates);
        let ids: Vec<u64> = kept.iter().map(Lesson::id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected.len(), 2);
        // both kept lessons lack audio
        assert_eq!(report.warnings.len(), 2);
        assert!(!report.is_clean());
    }
}
