//! escher: a reparenting X11 window manager with per-monitor floating and
//! tiling workspaces.
//!
//! The crate is split along a single seam: everything above the [XConn]
//! trait is X-free and deterministic (the state store, the layout engine,
//! the drag state machine, the action layer), and everything below it is
//! the `x11rb` backed implementation that talks to a real server. The
//! [core::WindowManager] drives the whole thing from a blocking, single
//! threaded event loop: one event in, handlers run to completion, EWMH
//! state republished on the way out.
//!
//! [XConn]: crate::x::XConn
use std::fmt;

pub mod config;
pub mod core;
pub mod pure;
pub mod util;
pub mod x;
pub mod x11rb;

pub use crate::core::WindowManager;
pub use config::Config;

/// Error variants from the core window manager logic and the X backend.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Another window manager already holds SubstructureRedirect on the root
    #[error("unable to become the window manager: another WM is already running")]
    AlreadyRunning,

    /// Unable to establish a connection to the X server
    #[error(transparent)]
    Connect(#[from] ::x11rb::errors::ConnectError),

    /// The X11 connection broke underneath us
    #[error(transparent)]
    Connection(#[from] ::x11rb::errors::ConnectionError),

    /// Failed to parse the configuration file
    #[error("invalid config file: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    /// An IO error from config loading or process spawning
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A requested property was not set for the given client
    #[error("the {0} property is not set for client {1}")]
    MissingProperty(String, Xid),

    /// No keycode could be resolved for a symbolic key name
    #[error("no keycode found for key name {0:?}")]
    NoKeycode(String),

    /// The X server does not support the RandR extension
    #[error("the X server does not support the RandR extension")]
    Randr,

    /// Could not get an X11 request reply
    #[error(transparent)]
    Reply(#[from] ::x11rb::errors::ReplyError),

    /// Could not get an X11 request reply or generate a new resource id
    #[error(transparent)]
    ReplyOrId(#[from] ::x11rb::errors::ReplyOrIdError),

    /// Parsing an [Atom][crate::x::Atom] or action tag from a string failed
    #[error(transparent)]
    Strum(#[from] strum::ParseError),

    /// An attempt was made to act on a client that is not in the state store
    #[error("{0} is not a known client")]
    UnknownClient(Xid),

    /// A modifier name in the config was not one of mod1..mod5
    #[error("{0} is not a valid modifier key")]
    UnknownModifier(String),
}

/// A Result where the error type is always [enum@Error]
pub type Result<T> = std::result::Result<T, Error>;

/// An X server resource id: windows, atoms and CRTCs all live in this space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Xid(pub(crate) u32);

impl Xid {
    /// Create a new Xid from a raw server resource id.
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::ops::Deref for Xid {
    type Target = u32;

    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Xid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<Xid> for u32 {
    fn from(id: Xid) -> Self {
        id.0
    }
}
