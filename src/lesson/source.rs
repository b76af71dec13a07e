use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::LoadError;
use crate::lesson::validate::LoadReport;
use crate::lesson::wire::{self, WireExerciseSet, WireReadingSet};
use crate::lesson::LessonSet;
use crate::net::{self, Endpoint};

const EXERCISES_PATH: &str = "ejercicios/all";

/// Supplies raw lesson data; the engine only sees the normalized result.
pub trait LessonSource {
    fn exercise_sets(&self) -> Result<Vec<WireExerciseSet>, LoadError>;
    fn reading_set(&self, id: u64) -> Result<WireReadingSet, LoadError>;
}

/// Fetch and normalize the fill-blank lessons of one exercise type.
pub fn load_fill_blank(
    source: &dyn LessonSource,
    kind: &str,
    marker: char,
) -> Result<(LessonSet, LoadReport), LoadError> {
    let sets = source.exercise_sets()?;
    wire::assemble_fill_blank(&sets, kind, marker)
}

/// Fetch and normalize one narrated lesson set.
pub fn load_narrated(
    source: &dyn LessonSource,
    id: u64,
) -> Result<(LessonSet, LoadReport), LoadError> {
    let set = source.reading_set(id)?;
    wire::assemble_narrated(&set)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<WireExerciseSet>),
    One(Box<WireExerciseSet>),
}

/// Lesson data saved as a JSON file, in the same shape the server sends.
pub struct FileLessonSource {
    path: PathBuf,
}

impl FileLessonSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read(&self) -> Result<String, LoadError> {
        debug!("reading lessons from {}", self.path.display());
        Ok(fs::read_to_string(&self.path)?)
    }
}

impl LessonSource for FileLessonSource {
    /// Accepts either a list of exercise sets or a single one.
    fn exercise_sets(&self) -> Result<Vec<WireExerciseSet>, LoadError> {
        let parsed: OneOrMany = serde_json::from_str(&self.read()?)?;
        Ok(match parsed {
            OneOrMany::Many(sets) => sets,
            OneOrMany::One(set) => vec![*set],
        })
    }

    fn reading_set(&self, _id: u64) -> Result<WireReadingSet, LoadError> {
        Ok(serde_json::from_str(&self.read()?)?)
    }
}

/// Lesson server reached over HTTP with a bearer token.
pub struct HttpLessonSource {
    endpoint: Endpoint,
}

impl HttpLessonSource {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl LessonSource for HttpLessonSource {
    fn exercise_sets(&self) -> Result<Vec<WireExerciseSet>, LoadError> {
        Ok(net::get_json(&self.endpoint, EXERCISES_PATH)?)
    }

    fn reading_set(&self, id: u64) -> Result<WireReadingSet, LoadError> {
        Ok(net::get_json(&self.endpoint, &format!("lecciones/{id}"))?)
    }
}
