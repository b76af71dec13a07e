pub mod exercise;
pub mod feedback;
pub mod reading;

pub use exercise::{
    AdvanceOutcome, ExerciseSession, Rejection, SelectOutcome, SessionOptions, SessionPhase,
};
pub use feedback::Feedback;
pub use reading::{NarratedGate, ReadingSession, ReadingStep};
