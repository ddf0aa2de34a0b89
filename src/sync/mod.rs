pub mod debounce;
pub mod engine;
pub mod outcome;

pub use engine::MutationEngine;
pub use outcome::{EntityKey, EntityKind, Outcome};
