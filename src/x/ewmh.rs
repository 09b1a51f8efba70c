//! The EWMH surface: root and per-window properties published for external
//! panels and pagers, plus the ICCCM delete-window handshake.
use crate::{
    pure::{
        layout::Strut,
        state::{Monitor, WindowSet},
    },
    x::{Atom, Prop, XConn, EWMH_SUPPORTED_ATOMS},
    Result, Xid,
};
use tracing::debug;

/// The name advertised through WM_NAME / _NET_WM_NAME on the root.
pub const WM_NAME: &str = "escher";

/// Write the one-off root properties: the WM identity and the supported
/// atom list.
pub fn announce_support<X: XConn>(x: &X) -> Result<()> {
    let root = x.root();

    x.set_prop(root, Atom::WmName, Prop::Utf8String(WM_NAME.to_owned()))?;
    x.set_prop(root, Atom::NetWmName, Prop::Utf8String(WM_NAME.to_owned()))?;
    x.set_prop(
        root,
        Atom::NetSupported,
        Prop::Atoms(
            EWMH_SUPPORTED_ATOMS
                .iter()
                .map(|a| a.as_ref().to_owned())
                .collect(),
        ),
    )
}

/// Publish the 0-based index of the current workspace.
pub fn publish_current_desktop<X: XConn>(x: &X, ix: usize) -> Result<()> {
    x.set_prop(
        x.root(),
        Atom::NetCurrentDesktop,
        Prop::Cardinals(vec![ix as u32]),
    )
}

/// Publish the desktop count for the current monitor.
pub fn publish_number_of_desktops<X: XConn>(x: &X, n: u32) -> Result<()> {
    x.set_prop(
        x.root(),
        Atom::NetNumberOfDesktops,
        Prop::Cardinals(vec![n]),
    )
}

/// Publish the window holding pointer-enter focus.
pub fn publish_active_window<X: XConn>(x: &X, id: Xid) -> Result<()> {
    x.set_prop(x.root(), Atom::NetActiveWindow, Prop::Windows(vec![id]))
}

/// Publish the managed window ids of the current monitor in
/// workspace-then-sequence order.
pub fn publish_client_list<X: XConn>(x: &X, set: &WindowSet) -> Result<()> {
    x.set_prop(
        x.root(),
        Atom::NetClientList,
        Prop::Windows(set.client_list()),
    )
}

/// Publish the usable area of each workspace on the given monitor: the full
/// monitor for floating workspaces, the tiling space for tiling ones.
pub fn publish_workarea<X: XConn>(x: &X, mon: &Monitor) -> Result<()> {
    let mut values = Vec::with_capacity(4 * mon.workspaces().len());
    for ws in mon.workspaces() {
        if ws.tiling {
            let ts = mon.tiling_space;
            values.extend([ts.x as u32, ts.y as u32, ts.w, ts.h]);
        } else {
            values.extend([0, 0, mon.rect.w, mon.rect.h]);
        }
    }

    x.set_prop(x.root(), Atom::NetWorkarea, Prop::Cardinals(values))
}

/// Tag a window with the workspace index it lives on.
pub fn set_window_desktop<X: XConn>(x: &X, id: Xid, ix: usize) -> Result<()> {
    x.set_prop(id, Atom::NetWmDesktop, Prop::Cardinals(vec![ix as u32]))
}

/// Replace a window's `_NET_WM_STATE` to reflect its fullscreen flag.
pub fn set_fullscreen_state<X: XConn>(x: &X, id: Xid, fullscreen: bool) -> Result<()> {
    let atoms = if fullscreen {
        vec![Atom::NetWmStateFullscreen.as_ref().to_owned()]
    } else {
        Vec::new()
    };

    x.set_prop(id, Atom::NetWmState, Prop::Atoms(atoms))
}

/// Ask a window to close via WM_DELETE_WINDOW.
///
/// Returns Ok(false), without sending anything, when the window does not
/// list the protocol: the caller may then fall back to destroying it.
pub fn send_delete<X: XConn>(x: &X, id: Xid) -> Result<bool> {
    let supports_delete = match x.get_prop(id, Atom::WmProtocols)? {
        Some(Prop::Atoms(protocols)) => protocols
            .iter()
            .any(|p| p == Atom::WmDeleteWindow.as_ref()),
        _ => false,
    };

    if !supports_delete {
        debug!(%id, "client does not support WM_DELETE_WINDOW");
        return Ok(false);
    }

    let data = [x.atom_id(Atom::WmDeleteWindow), 0, 0, 0, 0];
    x.send_client_message(id, Atom::WmProtocols, data)?;

    Ok(true)
}

/// Whether a window advertises one of the given `_NET_WM_WINDOW_TYPE`s.
pub fn has_window_type_in<X: XConn>(x: &X, id: Xid, types: &[Atom]) -> bool {
    match x.get_prop(id, Atom::NetWmWindowType) {
        Ok(Some(Prop::Atoms(atoms))) => atoms
            .iter()
            .any(|a| types.iter().any(|t| t.as_ref() == a)),
        _ => false,
    }
}

/// Whether a window's `_NET_WM_STATE` currently includes the given atom.
pub fn net_wm_state_contains<X: XConn>(x: &X, id: Xid, atom: Atom) -> bool {
    match x.get_prop(id, Atom::NetWmState) {
        Ok(Some(Prop::Atoms(atoms))) => atoms.iter().any(|a| a == atom.as_ref()),
        _ => false,
    }
}

/// Read the strut reserved against the given monitor.
///
/// Root children are scanned in stacking order and the first mapped window
/// carrying `_NET_WM_STRUT_PARTIAL` whose origin lies inside the monitor
/// wins; additional bars are ignored.
pub fn strut_for<X: XConn>(x: &X, mon: &crate::pure::geometry::Rect) -> Result<Strut> {
    for id in x.existing_clients()? {
        let vals = match x.get_prop(id, Atom::NetWmStrutPartial)? {
            Some(Prop::Cardinals(vals)) if vals.len() >= 4 => vals,
            _ => continue,
        };

        let attrs = match x.client_attributes(id) {
            Ok(attrs) => attrs,
            Err(_) => continue,
        };
        if !attrs.viewable {
            continue;
        }

        let r = match x.client_geometry(id) {
            Ok(r) => r,
            Err(_) => continue,
        };
        if !mon.contains_point((r.x, r.y)) {
            continue;
        }

        debug!(%id, ?vals, "found strut bearing window");
        return Ok(Strut::new(vals[0], vals[1], vals[2], vals[3]));
    }

    Ok(Strut::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pure::geometry::Rect,
        x::mock::MockXConn,
        x::WindowAttributes,
    };
    use std::cell::RefCell;

    #[derive(Default)]
    struct PropConn {
        protocols: Vec<String>,
        sent: RefCell<Vec<(Xid, Atom, [u32; 5])>>,
    }

    impl MockXConn for PropConn {
        fn mock_get_prop(&self, _: Xid, atom: Atom) -> Result<Option<Prop>> {
            match atom {
                Atom::WmProtocols if !self.protocols.is_empty() => {
                    Ok(Some(Prop::Atoms(self.protocols.clone())))
                }
                _ => Ok(None),
            }
        }

        fn mock_send_client_message(&self, id: Xid, dtype: Atom, data: [u32; 5]) -> Result<()> {
            self.sent.borrow_mut().push((id, dtype, data));
            Ok(())
        }
    }

    #[test]
    fn send_delete_honors_wm_protocols() {
        let conn = PropConn {
            protocols: vec!["WM_DELETE_WINDOW".to_owned()],
            ..Default::default()
        };

        assert_eq!(send_delete(&conn, Xid(5)).unwrap(), true);
        let sent = conn.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Xid(5));
        assert_eq!(sent[0].1, Atom::WmProtocols);
    }

    #[test]
    fn send_delete_reports_unsupported_without_sending() {
        let conn = PropConn {
            protocols: vec!["WM_TAKE_FOCUS".to_owned()],
            ..Default::default()
        };

        assert_eq!(send_delete(&conn, Xid(5)).unwrap(), false);
        assert!(conn.sent.borrow().is_empty());
    }

    struct StrutConn {
        children: Vec<(Xid, Rect, Vec<u32>, bool)>,
    }

    impl MockXConn for StrutConn {
        fn mock_existing_clients(&self) -> Result<Vec<Xid>> {
            Ok(self.children.iter().map(|c| c.0).collect())
        }

        fn mock_client_geometry(&self, id: Xid) -> Result<Rect> {
            Ok(self.children.iter().find(|c| c.0 == id).unwrap().1)
        }

        fn mock_client_attributes(&self, id: Xid) -> Result<WindowAttributes> {
            let viewable = self.children.iter().find(|c| c.0 == id).unwrap().3;
            Ok(WindowAttributes {
                override_redirect: false,
                viewable,
            })
        }

        fn mock_get_prop(&self, id: Xid, atom: Atom) -> Result<Option<Prop>> {
            if atom != Atom::NetWmStrutPartial {
                return Ok(None);
            }
            let vals = &self.children.iter().find(|c| c.0 == id).unwrap().2;
            Ok(if vals.is_empty() {
                None
            } else {
                Some(Prop::Cardinals(vals.clone()))
            })
        }
    }

    #[test]
    fn first_strut_in_stacking_order_wins() {
        let mon = Rect::new(0, 0, 1920, 1080);
        let conn = StrutConn {
            children: vec![
                (Xid(1), Rect::new(0, 0, 1920, 30), vec![0, 0, 30, 0], true),
                (Xid(2), Rect::new(0, 1050, 1920, 30), vec![0, 0, 0, 30], true),
            ],
        };

        assert_eq!(strut_for(&conn, &mon).unwrap(), Strut::new(0, 0, 30, 0));
    }

    #[test]
    fn struts_outside_the_monitor_are_ignored() {
        let mon = Rect::new(0, 0, 1920, 1080);
        let conn = StrutConn {
            children: vec![
                (Xid(1), Rect::new(2000, 0, 1920, 30), vec![0, 0, 30, 0], true),
                (Xid(2), Rect::new(0, 0, 1920, 30), vec![0, 0, 24, 0], true),
            ],
        };

        assert_eq!(strut_for(&conn, &mon).unwrap(), Strut::new(0, 0, 24, 0));
    }

    #[test]
    fn unmapped_strut_windows_are_skipped() {
        let mon = Rect::new(0, 0, 1920, 1080);
        let conn = StrutConn {
            children: vec![(Xid(1), Rect::new(0, 0, 1920, 30), vec![0, 0, 30, 0], false)],
        };

        assert_eq!(strut_for(&conn, &mon).unwrap(), Strut::default());
    }
}
