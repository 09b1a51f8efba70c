//! Backend agnostic wrappers for the X events the manager reacts to.
use crate::{
    core::bindings::KeyCode,
    pure::geometry::Point,
    Xid,
};

/// The subset of X server events the event loop dispatches on.
///
/// Backends translate their native event structs into these; anything not
/// represented here is dropped before it reaches the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XEvent {
    /// A grabbed mouse button was pressed
    ButtonPress(ButtonEvent),
    /// A grabbed mouse button was released
    ButtonRelease(ButtonEvent),
    /// A message from a client or external tool
    ClientMessage(ClientMessage),
    /// A client is asking to be repositioned or restacked
    ConfigureRequest(ConfigureRequest),
    /// A window has been destroyed
    Destroy(Xid),
    /// The pointer has entered a window
    Enter(PointerChange),
    /// A grabbed key chord was pressed
    KeyPress(KeyCode),
    /// The pointer has left a window
    Leave(PointerChange),
    /// A window is asking to be mapped
    MapRequest(Xid),
    /// The pointer moved while a grabbed button was held
    Motion(MotionEvent),
    /// Outputs changed: CRTCs were added, removed or reconfigured
    RandrNotify,
    /// A window was unmapped
    Unmap(Xid),
}

impl std::fmt::Display for XEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use XEvent::*;

        match self {
            ButtonPress(_) => write!(f, "ButtonPress"),
            ButtonRelease(_) => write!(f, "ButtonRelease"),
            ClientMessage(_) => write!(f, "ClientMessage"),
            ConfigureRequest(_) => write!(f, "ConfigureRequest"),
            Destroy(_) => write!(f, "Destroy"),
            Enter(_) => write!(f, "Enter"),
            KeyPress(_) => write!(f, "KeyPress"),
            Leave(_) => write!(f, "Leave"),
            MapRequest(_) => write!(f, "MapRequest"),
            Motion(_) => write!(f, "Motion"),
            RandrNotify => write!(f, "RandrNotify"),
            Unmap(_) => write!(f, "Unmap"),
        }
    }
}

/// Mouse buttons that participate in drag interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Button 1: drag to move
    Left,
    /// Button 2
    Middle,
    /// Button 3: drag to resize
    Right,
}

impl MouseButton {
    /// Map a raw X button detail, dropping scroll events.
    pub fn from_detail(detail: u8) -> Option<Self> {
        match detail {
            1 => Some(MouseButton::Left),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Right),
            _ => None,
        }
    }
}

/// A button press or release seen through the root window grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// The child window under the pointer (0 when over the bare root)
    pub child: Xid,
    /// Pointer position in root coordinates
    pub abs: Point,
    /// Which button changed state
    pub button: MouseButton,
    /// The raw modifier mask held at the time of the event
    pub mask: u16,
}

/// Pointer motion while a grabbed button is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    /// Pointer position in root coordinates
    pub abs: Point,
    /// The raw modifier mask held at the time of the event
    pub mask: u16,
}

/// The pointer crossed into or out of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerChange {
    /// The window that was entered or left
    pub id: Xid,
    /// Pointer position in root coordinates
    pub abs: Point,
}

/// A ClientMessage event with its type resolved to an atom name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    /// The window the message concerns
    pub id: Xid,
    /// The message type's atom name
    pub dtype: String,
    /// The message payload widened to 32 bit values
    pub data: [u32; 5],
}

/// The fields of a ConfigureRequest that the client actually set, ready to
/// be forwarded for unmanaged or floating windows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub id: Xid,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub border_width: Option<u32>,
    pub sibling: Option<Xid>,
    /// Raw stack mode (0..=4) when requested
    pub stack_mode: Option<u32>,
}
