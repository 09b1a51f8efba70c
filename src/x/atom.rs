//! Typed names for the X atoms this window manager reads and writes.
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The EWMH / ICCCM atoms used across the crate.
///
/// Atom names are shared between all X11 client libraries; this enum gives
/// them a little type safety. The production backend interns every variant
/// in one batch at connection setup.
#[derive(AsRefStr, Display, EnumString, EnumIter, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Atom {
    /// WM_PROTOCOLS
    #[strum(serialize = "WM_PROTOCOLS")]
    WmProtocols,
    /// WM_DELETE_WINDOW
    #[strum(serialize = "WM_DELETE_WINDOW")]
    WmDeleteWindow,
    /// WM_NAME
    #[strum(serialize = "WM_NAME")]
    WmName,
    /// _NET_SUPPORTED
    #[strum(serialize = "_NET_SUPPORTED")]
    NetSupported,
    /// _NET_WM_NAME
    #[strum(serialize = "_NET_WM_NAME")]
    NetWmName,
    /// _NET_ACTIVE_WINDOW
    #[strum(serialize = "_NET_ACTIVE_WINDOW")]
    NetActiveWindow,
    /// _NET_CLIENT_LIST
    #[strum(serialize = "_NET_CLIENT_LIST")]
    NetClientList,
    /// _NET_CURRENT_DESKTOP
    #[strum(serialize = "_NET_CURRENT_DESKTOP")]
    NetCurrentDesktop,
    /// _NET_NUMBER_OF_DESKTOPS
    #[strum(serialize = "_NET_NUMBER_OF_DESKTOPS")]
    NetNumberOfDesktops,
    /// _NET_WORKAREA
    #[strum(serialize = "_NET_WORKAREA")]
    NetWorkarea,
    /// _NET_WM_DESKTOP
    #[strum(serialize = "_NET_WM_DESKTOP")]
    NetWmDesktop,
    /// _NET_WM_STRUT_PARTIAL
    #[strum(serialize = "_NET_WM_STRUT_PARTIAL")]
    NetWmStrutPartial,
    /// _NET_WM_STATE
    #[strum(serialize = "_NET_WM_STATE")]
    NetWmState,
    /// _NET_WM_STATE_FULLSCREEN
    #[strum(serialize = "_NET_WM_STATE_FULLSCREEN")]
    NetWmStateFullscreen,
    /// _NET_WM_STATE_MAXIMIZED_HORZ
    #[strum(serialize = "_NET_WM_STATE_MAXIMIZED_HORZ")]
    NetWmStateMaximizedHorz,
    /// _NET_WM_STATE_MAXIMIZED_VERT
    #[strum(serialize = "_NET_WM_STATE_MAXIMIZED_VERT")]
    NetWmStateMaximizedVert,
    /// _NET_WM_STATE_ABOVE
    #[strum(serialize = "_NET_WM_STATE_ABOVE")]
    NetWmStateAbove,
    /// _NET_WM_WINDOW_TYPE
    #[strum(serialize = "_NET_WM_WINDOW_TYPE")]
    NetWmWindowType,

    // Window types
    /// _NET_WM_WINDOW_TYPE_NORMAL
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_NORMAL")]
    NetWindowTypeNormal,
    /// _NET_WM_WINDOW_TYPE_DOCK
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_DOCK")]
    NetWindowTypeDock,
    /// _NET_WM_WINDOW_TYPE_PANEL (non standard but used by some bars)
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_PANEL")]
    NetWindowTypePanel,
    /// _NET_WM_WINDOW_TYPE_SPLASH
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_SPLASH")]
    NetWindowTypeSplash,
    /// _NET_WM_WINDOW_TYPE_DIALOG
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_DIALOG")]
    NetWindowTypeDialog,
    /// _NET_WM_WINDOW_TYPE_NOTIFICATION
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_NOTIFICATION")]
    NetWindowTypeNotification,
    /// _NET_WM_WINDOW_TYPE_TOOLTIP
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_TOOLTIP")]
    NetWindowTypeTooltip,
}

/// Windows advertising one of these types are never managed: they are mapped
/// where they ask to be and otherwise left alone.
pub const IGNORED_WINDOW_TYPES: &[Atom] = &[
    Atom::NetWindowTypeDock,
    Atom::NetWindowTypePanel,
    Atom::NetWindowTypeSplash,
    Atom::NetWindowTypeDialog,
    Atom::NetWindowTypeNotification,
    Atom::NetWindowTypeTooltip,
];

/// The atom list written to `_NET_SUPPORTED` at startup.
pub const EWMH_SUPPORTED_ATOMS: &[Atom] = &[
    Atom::NetWmState,
    Atom::NetWmStateFullscreen,
    Atom::NetWmStateMaximizedHorz,
    Atom::NetWmStateMaximizedVert,
    Atom::NetWmWindowType,
    Atom::NetCurrentDesktop,
    Atom::NetNumberOfDesktops,
    Atom::NetActiveWindow,
    Atom::NetClientList,
    Atom::NetWorkarea,
    Atom::NetWmDesktop,
    Atom::NetWmStrutPartial,
    Atom::WmProtocols,
    Atom::WmDeleteWindow,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn atom_names_round_trip() {
        for a in Atom::iter() {
            assert_eq!(Atom::from_str(a.as_ref()), Ok(a));
        }
    }

    #[test]
    fn ignored_types_are_window_types() {
        for a in IGNORED_WINDOW_TYPES {
            assert!(a.as_ref().starts_with("_NET_WM_WINDOW_TYPE_"));
        }
    }
}
