//! Lesson data as the server sends it, and its normalization into [`Lesson`]s.
//!
//! The server overloads the per-exercise `audio` field as the answer key while
//! the playable resources live in `contenido.audios`. Here the answer key is
//! read from `respuesta` (accepting `audio` as a legacy alias) and the URL is
//! attached separately, so nothing downstream sees the dual use.

use icu_normalizer::ComposingNormalizerBorrowed;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ContentIntegrityError, LoadError};
use crate::lesson::validate::{self, LoadReport};
use crate::lesson::{FillBlankLesson, Lesson, LessonKind, LessonSet, NarratedLesson};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireAudio {
    Url(String),
    Object { url: String },
}

impl WireAudio {
    pub fn url(&self) -> &str {
        match self {
            WireAudio::Url(url) | WireAudio::Object { url } => url,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireExercise {
    pub id: u64,
    pub oracion: String,
    #[serde(alias = "audio", default)]
    pub respuesta: String,
    #[serde(rename = "letrasDisponibles", default)]
    pub letras_disponibles: Vec<String>,
    #[serde(rename = "letrasCorrectas", default)]
    pub letras_correctas: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireExerciseContent {
    #[serde(rename = "Ejercicios", default)]
    pub ejercicios: Vec<WireExercise>,
    #[serde(default)]
    pub audios: Vec<WireAudio>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireExerciseSet {
    pub id: u64,
    #[serde(rename = "tipoEjercicio", default)]
    pub tipo_ejercicio: String,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub contenido: WireExerciseContent,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireReading {
    pub id: u64,
    #[serde(default)]
    pub titulo: String,
    pub texto: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub sounds: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireReadingContent {
    #[serde(default)]
    pub lecciones: Vec<WireReading>,
    #[serde(default)]
    pub audios: Vec<WireAudio>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireReadingSet {
    pub id: u64,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub contenido: WireReadingContent,
    #[serde(default)]
    pub quiz: Option<u64>,
}

/// Canonical composition so a precomposed sentence and a decomposed answer
/// key agree char for char.
pub fn nfc(text: &str) -> String {
    ComposingNormalizerBorrowed::new_nfc()
        .normalize(text)
        .into_owned()
}

fn parse_letter(entry: &str, lesson_id: u64) -> Result<char, ContentIntegrityError> {
    let normalized = nfc(entry);
    let mut chars = normalized.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(ContentIntegrityError::BadLetter {
            lesson_id,
            entry: entry.to_string(),
        }),
    }
}

fn parse_letters(entries: &[String], lesson_id: u64) -> Result<Vec<char>, ContentIntegrityError> {
    entries.iter().map(|e| parse_letter(e, lesson_id)).collect()
}

impl WireExercise {
    pub fn normalize(
        &self,
        marker: char,
        audio_url: Option<String>,
    ) -> Result<FillBlankLesson, ContentIntegrityError> {
        Ok(FillBlankLesson {
            id: self.id,
            sentence: nfc(&self.oracion).chars().collect(),
            answer_key: nfc(&self.respuesta).chars().collect(),
            marker,
            designer_letters: parse_letters(&self.letras_disponibles, self.id)?,
            declared_letters: parse_letters(&self.letras_correctas, self.id)?,
            audio_url,
        })
    }
}

impl WireReading {
    pub fn normalize(&self, audio_url: Option<String>) -> NarratedLesson {
        NarratedLesson {
            id: self.id,
            title: self.titulo.clone(),
            text: nfc(&self.texto),
            highlights: self.highlights.iter().map(|h| nfc(h)).collect(),
            sounds: self.sounds.iter().map(|s| nfc(s)).collect(),
            audio_url,
        }
    }
}

fn audio_at(audios: &[WireAudio], index: usize) -> Option<String> {
    audios
        .get(index)
        .map(|a| a.url().trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Keep the exercise sets of type `kind`, flatten their exercises in order
/// and screen them. The reported exercise id is that of the last matching set.
pub fn assemble_fill_blank(
    sets: &[WireExerciseSet],
    kind: &str,
    marker: char,
) -> Result<(LessonSet, LoadReport), LoadError> {
    let matching: Vec<&WireExerciseSet> =
        sets.iter().filter(|s| s.tipo_ejercicio == kind).collect();
    debug!("{} of {} exercise sets are of type {kind:?}", matching.len(), sets.len());

    let mut candidates = Vec::new();
    for set in &matching {
        for (i, exercise) in set.contenido.ejercicios.iter().enumerate() {
            let audio = audio_at(&set.contenido.audios, i);
            candidates.push(exercise.normalize(marker, audio).map(Lesson::FillBlank));
        }
    }

    let (lessons, report) = validate::screen(candidates);
    let Some(last) = matching.last() else {
        return Err(LoadError::Empty {
            kind: kind.to_string(),
            rejected: 0,
        });
    };
    if lessons.is_empty() {
        return Err(LoadError::Empty {
            kind: kind.to_string(),
            rejected: report.rejected.len(),
        });
    }

    info!(
        "loaded {} fill-blank lessons for exercise {} ({} rejected)",
        lessons.len(),
        last.id,
        report.rejected.len()
    );
    let set = LessonSet::new(last.id, last.titulo.clone(), LessonKind::FillBlank, lessons);
    Ok((set, report))
}

pub fn assemble_narrated(wire: &WireReadingSet) -> Result<(LessonSet, LoadReport), LoadError> {
    let candidates = wire
        .contenido
        .lecciones
        .iter()
        .enumerate()
        .map(|(i, l)| Ok(Lesson::Narrated(l.normalize(audio_at(&wire.contenido.audios, i)))))
        .collect();

    let (lessons, report) = validate::screen(candidates);
    if lessons.is_empty() {
        return Err(LoadError::Empty {
            kind: "narrated".to_string(),
            rejected: report.rejected.len(),
        });
    }

    info!("loaded {} narrated lessons for set {}", lessons.len(), wire.id);
    let mut set = LessonSet::new(wire.id, wire.titulo.clone(), LessonKind::Narrated, lessons);
    set.quiz_id = wire.quiz;
    Ok((set, report))
}
