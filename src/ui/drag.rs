//! Gesture recognition for moving project cards between columns.
//!
//! Kept free of egui widgets: the board feeds it pointer positions and the
//! frame time, and acts on what [`DragController::release`] returns.

use egui::Pos2;

use crate::model::{EntityId, Status};

/// Mouse movement needed before a press becomes a drag.
pub const MOUSE_DISTANCE: f32 = 10.0;
/// How long a touch must be held before it becomes a drag, in seconds.
pub const TOUCH_DELAY: f64 = 0.25;
/// Movement allowed while the touch delay runs; more means scrolling.
pub const TOUCH_TOLERANCE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// A project card dropped on another column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChangeRequest {
    pub project_id: EntityId,
    pub from: Status,
    pub to: Status,
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEnd {
    /// Released before activation.
    Click(EntityId),
    Dropped(StatusChangeRequest),
    /// Dropped outside a column, on its own column, or the gesture was
    /// abandoned.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pressed,
    Dragging,
    /// Touch moved too early; the gesture belongs to scrolling now.
    Abandoned,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    project_id: EntityId,
    from: Status,
    kind: PointerKind,
    origin: Pos2,
    pressed_at: f64,
    pointer: Pos2,
    phase: Phase,
}

#[derive(Debug, Default)]
pub struct DragController {
    gesture: Option<Gesture>,
}

impl DragController {
    pub fn is_idle(&self) -> bool {
        self.gesture.is_none()
    }

    /// Start tracking a press on a card. Ignored while another gesture is
    /// in progress.
    pub fn press(
        &mut self,
        project_id: EntityId,
        from: Status,
        kind: PointerKind,
        pos: Pos2,
        at: f64,
    ) {
        if self.gesture.is_some() {
            return;
        }
        self.gesture = Some(Gesture {
            project_id,
            from,
            kind,
            origin: pos,
            pressed_at: at,
            pointer: pos,
            phase: Phase::Pressed,
        });
    }

    pub fn motion(&mut self, pos: Pos2, at: f64) {
        let Some(g) = &mut self.gesture else {
            return;
        };
        g.pointer = pos;
        if g.phase != Phase::Pressed {
            return;
        }
        let moved = g.origin.distance(pos);
        match g.kind {
            PointerKind::Mouse if moved >= MOUSE_DISTANCE => g.phase = Phase::Dragging,
            PointerKind::Mouse => {}
            PointerKind::Touch if moved > TOUCH_TOLERANCE => g.phase = Phase::Abandoned,
            PointerKind::Touch if at - g.pressed_at >= TOUCH_DELAY => g.phase = Phase::Dragging,
            PointerKind::Touch => {}
        }
    }

    /// Let a held touch activate without further movement.
    pub fn tick(&mut self, at: f64) {
        if let Some(g) = &mut self.gesture {
            if g.kind == PointerKind::Touch
                && g.phase == Phase::Pressed
                && at - g.pressed_at >= TOUCH_DELAY
            {
                g.phase = Phase::Dragging;
            }
        }
    }

    /// The card being dragged and where the pointer is.
    pub fn dragging(&self) -> Option<(EntityId, Pos2)> {
        self.gesture
            .filter(|g| g.phase == Phase::Dragging)
            .map(|g| (g.project_id, g.pointer))
    }

    /// A press is waiting on the touch timer.
    pub fn awaiting_activation(&self) -> bool {
        self.gesture
            .is_some_and(|g| g.kind == PointerKind::Touch && g.phase == Phase::Pressed)
    }

    /// Finish the gesture. `drop_target` is the status code of the column
    /// under the pointer, if any.
    pub fn release(&mut self, drop_target: Option<&str>) -> DragEnd {
        let Some(g) = self.gesture.take() else {
            return DragEnd::Ignored;
        };
        match g.phase {
            Phase::Pressed => DragEnd::Click(g.project_id),
            Phase::Abandoned => DragEnd::Ignored,
            Phase::Dragging => {
                let Some(to) = drop_target.and_then(|code| code.parse::<Status>().ok()) else {
                    tracing::debug!(project_id = g.project_id, "Dropped outside any column");
                    return DragEnd::Ignored;
                };
                if to == g.from {
                    return DragEnd::Ignored;
                }
                DragEnd::Dropped(StatusChangeRequest {
                    project_id: g.project_id,
                    from: g.from,
                    to,
                })
            }
        }
    }

    pub fn cancel(&mut self) {
        self.gesture = None;
    }
}
