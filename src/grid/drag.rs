//! Drag lifecycle as an explicit state machine, independent of how the
//! pointer events are produced. The mouse path and the keyboard
//! pick/place path both feed the same machine; only a completed drop
//! reaches the grid reconciler.

/// A resolved drop, ready for `TileGrid::move_tile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDrop {
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    /// Pointer pressed (or Space) on a slot.
    PointerDown(usize),
    /// Pointer released (or Space again) on a slot.
    PointerUp(usize),
    /// Drag abandoned: Esc, or release outside the grid.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { source: usize },
}

impl DragState {
    /// Advance the machine. Returns a drop only on the Dragging -> Idle
    /// transition caused by a pointer release.
    pub fn handle(&mut self, event: DragEvent) -> Option<SlotDrop> {
        match (*self, event) {
            (DragState::Idle, DragEvent::PointerDown(source)) => {
                *self = DragState::Dragging { source };
                None
            }
            (DragState::Dragging { source }, DragEvent::PointerUp(target)) => {
                *self = DragState::Idle;
                Some(SlotDrop { source, target })
            }
            (DragState::Dragging { .. }, DragEvent::Cancel) => {
                *self = DragState::Idle;
                None
            }
            // A second press while dragging restarts from the new slot.
            (DragState::Dragging { .. }, DragEvent::PointerDown(source)) => {
                *self = DragState::Dragging { source };
                None
            }
            _ => None,
        }
    }

    pub fn source(&self) -> Option<usize> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { source } => Some(*source),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }
}
