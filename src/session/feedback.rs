pub const COMPLETION_MESSAGE: &str = "Correcto. Continúa con la siguiente lección.";

/// What the UI should emit in response to a learner action. The engine never
/// produces sound or vibration itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// Selection rejected; a short vibration.
    Haptic,
    /// Lesson solved; speak the message.
    Spoken(&'static str),
    /// Whole exercise set finished.
    Celebrate,
}
