pub mod blank_matcher;
pub mod highlight;
pub mod letter_pool;

pub use letter_pool::{LetterPool, RequirementMap};
