pub mod board;
pub mod filter;
pub mod project;
pub mod status;
pub mod store;
pub mod task;

/// Server-assigned identifier.
pub type EntityId = i64;

pub use board::{BoardColumns, BoardView, ProjectFocus};
pub use filter::ProjectFilter;
pub use project::{Project, ProjectDraft};
pub use status::{Responsible, Status, Team};
pub use store::{EntityStore, Snapshot};
pub use task::{Task, TaskDraft};
