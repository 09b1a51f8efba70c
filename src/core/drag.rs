//! The pointer drag state machine.
//!
//! One grabbed button sequence is in flight at a time: a mod+button press
//! engages on the child under the pointer, motion events project a new
//! rectangle from the press-time geometry, and the release handler consumes
//! the state and resolves what the drag meant.
use crate::{
    pure::geometry::{Point, Rect},
    x::event::MouseButton,
    Xid,
};

/// Windows can not be interactively resized below this extent.
pub const MIN_DRAG_SIZE: u32 = 10;

/// The in-flight pointer interaction, if any.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Drag {
    /// No grabbed button sequence is active
    #[default]
    Idle,
    /// Button 1 held: the window follows the pointer
    Moving { id: Xid, anchor: Point, base: Rect },
    /// Button 3 held: the pointer drags the bottom right corner
    Resizing { id: Xid, anchor: Point, base: Rect },
}

impl Drag {
    /// Engage on a button press over a client window.
    ///
    /// Button 1 starts a move, button 3 a resize; anything else leaves the
    /// machine idle.
    pub fn engage(&mut self, id: Xid, button: MouseButton, anchor: Point, base: Rect) {
        *self = match button {
            MouseButton::Left => Drag::Moving { id, anchor, base },
            MouseButton::Right => Drag::Resizing { id, anchor, base },
            MouseButton::Middle => Drag::Idle,
        };
    }

    /// The window currently being dragged.
    pub fn id(&self) -> Option<Xid> {
        match self {
            Drag::Idle => None,
            Drag::Moving { id, .. } | Drag::Resizing { id, .. } => Some(*id),
        }
    }

    /// The rectangle the dragged window should take for the given pointer
    /// position.
    pub fn rect_for(&self, p: Point) -> Option<Rect> {
        match *self {
            Drag::Idle => None,
            Drag::Moving { anchor, base, .. } => {
                Some(base.translated(p.x - anchor.x, p.y - anchor.y))
            }
            Drag::Resizing { anchor, base, .. } => {
                Some(base.resized_clamped(p.x - anchor.x, p.y - anchor.y, MIN_DRAG_SIZE))
            }
        }
    }

    /// The root coordinate the drag was engaged at.
    pub fn anchor(&self) -> Option<Point> {
        match self {
            Drag::Idle => None,
            Drag::Moving { anchor, .. } | Drag::Resizing { anchor, .. } => Some(*anchor),
        }
    }

    /// Consume the current state, resetting to Idle.
    pub fn take(&mut self) -> Drag {
        std::mem::take(self)
    }
}
