//! The abstraction boundary between the coordination engine and a concrete
//! X11 transport.
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    Result, Xid,
};

pub mod atom;
pub mod event;
pub mod ewmh;

#[cfg(test)]
pub mod mock;

pub use atom::{Atom, EWMH_SUPPORTED_ATOMS, IGNORED_WINDOW_TYPES};
pub use event::XEvent;

/// A property value read from or written to a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    /// A list of interned atoms, by name
    Atoms(Vec<String>),
    /// One or more 32 bit cardinals
    Cardinals(Vec<u32>),
    /// A UTF-8 encoded string value
    Utf8String(String),
    /// One or more window ids
    Windows(Vec<Xid>),
}

/// The window attributes the manager admits or rejects a window on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    /// The window asked not to be managed
    pub override_redirect: bool,
    /// The window is currently mapped and viewable
    pub viewable: bool,
}

/// One enumerated RandR CRTC with non-zero dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// The CRTC handle, stable across reconfigurations
    pub crtc: u32,
    /// The connected output's name (e.g. "DP-1")
    pub name: String,
    /// Position and size in root coordinates
    pub rect: Rect,
}

/// A handle on a running X11 connection.
///
/// Everything the window manager needs from the server goes through this
/// trait, which keeps the engine deterministic under test: the production
/// implementation lives in [crate::x11rb] and a recording mock backs the
/// scenario tests.
pub trait XConn {
    /// The id of the root window.
    fn root(&self) -> Xid;

    /// Enumerate the currently configured CRTCs as monitors.
    fn monitors(&self) -> Result<Vec<MonitorInfo>>;

    /// The current pointer position in root coordinates.
    fn cursor_position(&self) -> Result<Point>;

    /// Claim SubstructureRedirect/SubstructureNotify on the root.
    ///
    /// Fails with [Error::AlreadyRunning][crate::Error::AlreadyRunning] when
    /// another window manager holds the redirect.
    fn become_window_manager(&self) -> Result<()>;

    /// Grab the server so a multi-request section observes no concurrent
    /// client activity.
    fn grab_server(&self) -> Result<()>;

    /// Release a grab taken with [XConn::grab_server].
    fn ungrab_server(&self) -> Result<()>;

    /// Grab each key chord on the root window, including Lock and Num-Lock
    /// variants.
    fn grab_keys(&self, codes: &[KeyCode]) -> Result<()>;

    /// Release every key grab held on the root window.
    fn ungrab_keys(&self) -> Result<()>;

    /// Grab buttons 1 and 3 with the given modifier mask on the root.
    fn grab_buttons(&self, mask: u16) -> Result<()>;

    /// Release every button grab held on the root window.
    fn ungrab_buttons(&self) -> Result<()>;

    /// Replay a grabbed pointer event through to the client it targeted.
    fn replay_pointer(&self) -> Result<()>;

    /// Block until the next event the manager cares about arrives.
    fn next_event(&self) -> Result<XEvent>;

    /// Flush all pending requests to the server.
    fn flush(&self);

    /// The server assigned id for a known atom.
    fn atom_id(&self, atom: Atom) -> u32;

    /// All current children of the root window, in stacking order.
    fn existing_clients(&self) -> Result<Vec<Xid>>;

    /// Position and size of the given window.
    fn client_geometry(&self, id: Xid) -> Result<Rect>;

    /// The attributes gating admission of the given window.
    fn client_attributes(&self, id: Xid) -> Result<WindowAttributes>;

    /// Apply the standard managed-client event mask to a window.
    fn set_client_event_mask(&self, id: Xid) -> Result<()>;

    /// Add a window to the save set so it survives a manager crash.
    fn add_to_save_set(&self, id: Xid) -> Result<()>;

    /// Remove a window from the save set.
    fn remove_from_save_set(&self, id: Xid) -> Result<()>;

    /// Map the given window, making it visible.
    fn map(&self, id: Xid) -> Result<()>;

    /// Unmap the given window.
    fn unmap(&self, id: Xid) -> Result<()>;

    /// Destroy the given window outright.
    fn destroy(&self, id: Xid) -> Result<()>;

    /// Give input focus to the given window.
    fn focus(&self, id: Xid) -> Result<()>;

    /// Move / resize a window to the given rectangle.
    fn position_client(&self, id: Xid, r: Rect) -> Result<()>;

    /// Set the border width of a window in pixels.
    fn set_border_width(&self, id: Xid, px: u32) -> Result<()>;

    /// Set the border color of a window from a 24 bit hex value.
    fn set_border_color(&self, id: Xid, color: u32) -> Result<()>;

    /// Raise a window to the top of the stacking order.
    fn raise(&self, id: Xid) -> Result<()>;

    /// Forward a configure request from an unmanaged or floating client
    /// unchanged.
    fn forward_configure(&self, req: &event::ConfigureRequest) -> Result<()>;

    /// Read a property from a window, if it is set.
    fn get_prop(&self, id: Xid, atom: Atom) -> Result<Option<Prop>>;

    /// Write a property on a window.
    fn set_prop(&self, id: Xid, atom: Atom, value: Prop) -> Result<()>;

    /// Send a 32 bit format ClientMessage to the given window.
    fn send_client_message(&self, id: Xid, dtype: Atom, data: [u32; 5]) -> Result<()>;

    /// Warp the pointer to (x, y) relative to the given window's origin.
    fn warp_pointer(&self, id: Xid, x: i16, y: i16) -> Result<()>;
}
