use thiserror::Error;

/// Lesson content that can never be presented as a solvable exercise.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContentIntegrityError {
    #[error("lesson {lesson_id}: sentence has {sentence_len} chars but answer key has {key_len}")]
    LengthMismatch {
        lesson_id: u64,
        sentence_len: usize,
        key_len: usize,
    },

    #[error("lesson {lesson_id}: blank at position {position} can never be filled ({found:?})")]
    UnreachableBlank {
        lesson_id: u64,
        position: usize,
        found: char,
    },

    /// The blank expects a digit, space or punctuation mark, which the letter
    /// pool is not meant to offer.
    #[error("lesson {lesson_id}: blank at position {position} expects non-letter {found:?}")]
    NonLetterBlank {
        lesson_id: u64,
        position: usize,
        found: char,
    },

    #[error("lesson {lesson_id}: letter entry {entry:?} is not a single character")]
    BadLetter { lesson_id: u64, entry: String },
}

impl ContentIntegrityError {
    pub fn lesson_id(&self) -> u64 {
        match self {
            Self::LengthMismatch { lesson_id, .. }
            | Self::UnreachableBlank { lesson_id, .. }
            | Self::NonLetterBlank { lesson_id, .. }
            | Self::BadLetter { lesson_id, .. } => *lesson_id,
        }
    }
}

/// Failures talking to the lesson server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("no server configured")]
    NotConfigured,

    #[error("network support disabled at build time")]
    Disabled,
}

/// Audio resource could not be opened or started.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("audio resource unavailable: {url}: {reason}")]
    Unavailable { url: String, reason: String },

    #[error("lesson {0} has no audio resource")]
    NoResource(usize),
}

/// A lesson set could not be made available to the engine.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed lesson data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("could not read lesson file: {0}")]
    Io(#[from] std::io::Error),

    #[error("no usable lessons of type {kind:?} ({rejected} rejected)")]
    Empty { kind: String, rejected: usize },
}
