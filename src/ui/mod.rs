//! Rendering surfaces. Each one draws from borrowed state and returns an
//! [`Action`] for the app to carry out.

pub mod board;
pub mod dialogs;
pub mod drag;
pub mod filter_bar;
pub mod project_details;
pub mod task_list;
pub mod theme;
pub mod toasts;
pub mod toolbar;

use crate::model::{EntityId, Status};
use drag::StatusChangeRequest;

/// Something the user asked for from any surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Refresh,
    SearchChanged,
    FiltersChanged,
    ShowAbout,
    SelectProject(EntityId),
    OpenDetails(EntityId),
    ViewTasks(EntityId),
    NewProject(Status),
    EditProject(EntityId),
    MoveProject(StatusChangeRequest),
    DeleteProject(EntityId),
    NewTask(EntityId),
    EditTask(EntityId, EntityId),
    SetTaskStatus {
        project_id: EntityId,
        task_id: EntityId,
        status: Status,
    },
    DeleteTask(EntityId, EntityId),
}

impl Action {
    /// Keep the first real request made during a frame.
    pub fn or(self, other: Action) -> Action {
        match self {
            Action::None => other,
            _ => self,
        }
    }
}
