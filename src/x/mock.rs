//! A mock implementation of [XConn] for use in tests.
//!
//! Implementing [MockXConn] gives you an [XConn] whose methods forward to
//! overridable `mock_*` equivalents. Defaults are deliberately benign (side
//! effects succeed silently, reads come back empty) so each test only
//! overrides what it observes.
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    x::{
        event::ConfigureRequest, Atom, MonitorInfo, Prop, WindowAttributes, XConn, XEvent,
    },
    Error, Result, Xid,
};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};
use strum::IntoEnumIterator;

#[allow(unused_variables)]
pub trait MockXConn {
    fn mock_root(&self) -> Xid {
        Xid(1)
    }

    fn mock_monitors(&self) -> Result<Vec<MonitorInfo>> {
        Ok(vec![MonitorInfo {
            crtc: 1,
            name: "MOCK-1".to_owned(),
            rect: Rect::new(0, 0, 1920, 1080),
        }])
    }

    fn mock_cursor_position(&self) -> Result<Point> {
        Ok(Point::new(0, 0))
    }

    fn mock_become_window_manager(&self) -> Result<()> {
        Ok(())
    }

    fn mock_grab_server(&self) -> Result<()> {
        Ok(())
    }

    fn mock_ungrab_server(&self) -> Result<()> {
        Ok(())
    }

    fn mock_grab_keys(&self, codes: &[KeyCode]) -> Result<()> {
        Ok(())
    }

    fn mock_ungrab_keys(&self) -> Result<()> {
        Ok(())
    }

    fn mock_grab_buttons(&self, mask: u16) -> Result<()> {
        Ok(())
    }

    fn mock_ungrab_buttons(&self) -> Result<()> {
        Ok(())
    }

    fn mock_replay_pointer(&self) -> Result<()> {
        Ok(())
    }

    fn mock_next_event(&self) -> Result<XEvent> {
        Err(Error::Io(std::io::Error::from(
            std::io::ErrorKind::UnexpectedEof,
        )))
    }

    fn mock_flush(&self) {}

    fn mock_atom_id(&self, atom: Atom) -> u32 {
        // Stable fake ids, offset clear of the predefined atom range
        Atom::iter().position(|a| a == atom).unwrap() as u32 + 1000
    }

    fn mock_existing_clients(&self) -> Result<Vec<Xid>> {
        Ok(Vec::new())
    }

    fn mock_client_geometry(&self, id: Xid) -> Result<Rect> {
        Ok(Rect::new(0, 0, 800, 600))
    }

    fn mock_client_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        Ok(WindowAttributes {
            override_redirect: false,
            viewable: true,
        })
    }

    fn mock_set_client_event_mask(&self, id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_add_to_save_set(&self, id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_remove_from_save_set(&self, id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_map(&self, id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_unmap(&self, id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_destroy(&self, id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_focus(&self, id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_position_client(&self, id: Xid, r: Rect) -> Result<()> {
        Ok(())
    }

    fn mock_set_border_width(&self, id: Xid, px: u32) -> Result<()> {
        Ok(())
    }

    fn mock_set_border_color(&self, id: Xid, color: u32) -> Result<()> {
        Ok(())
    }

    fn mock_raise(&self, id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_forward_configure(&self, req: &ConfigureRequest) -> Result<()> {
        Ok(())
    }

    fn mock_get_prop(&self, id: Xid, atom: Atom) -> Result<Option<Prop>> {
        Ok(None)
    }

    fn mock_set_prop(&self, id: Xid, atom: Atom, value: Prop) -> Result<()> {
        Ok(())
    }

    fn mock_send_client_message(&self, id: Xid, dtype: Atom, data: [u32; 5]) -> Result<()> {
        Ok(())
    }

    fn mock_warp_pointer(&self, id: Xid, x: i16, y: i16) -> Result<()> {
        Ok(())
    }
}

impl<T> XConn for T
where
    T: MockXConn,
{
    fn root(&self) -> Xid {
        self.mock_root()
    }

    fn monitors(&self) -> Result<Vec<MonitorInfo>> {
        self.mock_monitors()
    }

    fn cursor_position(&self) -> Result<Point> {
        self.mock_cursor_position()
    }

    fn become_window_manager(&self) -> Result<()> {
        self.mock_become_window_manager()
    }

    fn grab_server(&self) -> Result<()> {
        self.mock_grab_server()
    }

    fn ungrab_server(&self) -> Result<()> {
        self.mock_ungrab_server()
    }

    fn grab_keys(&self, codes: &[KeyCode]) -> Result<()> {
        self.mock_grab_keys(codes)
    }

    fn ungrab_keys(&self) -> Result<()> {
        self.mock_ungrab_keys()
    }

    fn grab_buttons(&self, mask: u16) -> Result<()> {
        self.mock_grab_buttons(mask)
    }

    fn ungrab_buttons(&self) -> Result<()> {
        self.mock_ungrab_buttons()
    }

    fn replay_pointer(&self) -> Result<()> {
        self.mock_replay_pointer()
    }

    fn next_event(&self) -> Result<XEvent> {
        self.mock_next_event()
    }

    fn flush(&self) {
        self.mock_flush()
    }

    fn atom_id(&self, atom: Atom) -> u32 {
        self.mock_atom_id(atom)
    }

    fn existing_clients(&self) -> Result<Vec<Xid>> {
        self.mock_existing_clients()
    }

    fn client_geometry(&self, id: Xid) -> Result<Rect> {
        self.mock_client_geometry(id)
    }

    fn client_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        self.mock_client_attributes(id)
    }

    fn set_client_event_mask(&self, id: Xid) -> Result<()> {
        self.mock_set_client_event_mask(id)
    }

    fn add_to_save_set(&self, id: Xid) -> Result<()> {
        self.mock_add_to_save_set(id)
    }

    fn remove_from_save_set(&self, id: Xid) -> Result<()> {
        self.mock_remove_from_save_set(id)
    }

    fn map(&self, id: Xid) -> Result<()> {
        self.mock_map(id)
    }

    fn unmap(&self, id: Xid) -> Result<()> {
        self.mock_unmap(id)
    }

    fn destroy(&self, id: Xid) -> Result<()> {
        self.mock_destroy(id)
    }

    fn focus(&self, id: Xid) -> Result<()> {
        self.mock_focus(id)
    }

    fn position_client(&self, id: Xid, r: Rect) -> Result<()> {
        self.mock_position_client(id, r)
    }

    fn set_border_width(&self, id: Xid, px: u32) -> Result<()> {
        self.mock_set_border_width(id, px)
    }

    fn set_border_color(&self, id: Xid, color: u32) -> Result<()> {
        self.mock_set_border_color(id, color)
    }

    fn raise(&self, id: Xid) -> Result<()> {
        self.mock_raise(id)
    }

    fn forward_configure(&self, req: &ConfigureRequest) -> Result<()> {
        self.mock_forward_configure(req)
    }

    fn get_prop(&self, id: Xid, atom: Atom) -> Result<Option<Prop>> {
        self.mock_get_prop(id, atom)
    }

    fn set_prop(&self, id: Xid, atom: Atom, value: Prop) -> Result<()> {
        self.mock_set_prop(id, atom, value)
    }

    fn send_client_message(&self, id: Xid, dtype: Atom, data: [u32; 5]) -> Result<()> {
        self.mock_send_client_message(id, dtype, data)
    }

    fn warp_pointer(&self, id: Xid, x: i16, y: i16) -> Result<()> {
        self.mock_warp_pointer(id, x, y)
    }
}

/// A [MockXConn] that records the observable server state the manager
/// produces: geometry, borders, map state, properties and stacking calls.
///
/// Scenario tests drive [crate::core::WindowManager] against one of these
/// and assert on what a real server would have been told.
#[derive(Debug, Default)]
pub struct RecordingConn {
    pub monitor_infos: RefCell<Vec<MonitorInfo>>,
    pub positions: RefCell<HashMap<Xid, Rect>>,
    pub border_widths: RefCell<HashMap<Xid, u32>>,
    pub border_colors: RefCell<HashMap<Xid, u32>>,
    pub mapped: RefCell<HashSet<Xid>>,
    pub props: RefCell<HashMap<(Xid, Atom), Prop>>,
    pub focused: RefCell<Option<Xid>>,
    pub raised: RefCell<Vec<Xid>>,
    pub destroyed: RefCell<Vec<Xid>>,
    pub warps: RefCell<Vec<(Xid, i16, i16)>>,
    /// Geometry served for windows the manager has not positioned yet
    pub initial_geometry: RefCell<HashMap<Xid, Rect>>,
    /// Children reported for the root window, in stacking order
    pub root_children: RefCell<Vec<Xid>>,
    /// Configure requests passed through for unmanaged / floating clients
    pub forwarded: RefCell<Vec<ConfigureRequest>>,
    /// Windows that report the override-redirect attribute
    pub override_redirect: RefCell<HashSet<Xid>>,
}

impl RecordingConn {
    /// A recording connection reporting one monitor per given rect.
    pub fn with_monitors(rects: Vec<Rect>) -> Self {
        let monitor_infos = rects
            .into_iter()
            .enumerate()
            .map(|(ix, rect)| MonitorInfo {
                crtc: ix as u32 + 1,
                name: format!("MOCK-{}", ix + 1),
                rect,
            })
            .collect();

        Self {
            monitor_infos: RefCell::new(monitor_infos),
            ..Default::default()
        }
    }

    /// The last rectangle the manager pushed for a window.
    pub fn rect_of(&self, id: Xid) -> Option<Rect> {
        self.positions.borrow().get(&id).copied()
    }

    /// The root property recorded under the given atom.
    pub fn root_prop(&self, atom: Atom) -> Option<Prop> {
        self.props.borrow().get(&(self.mock_root(), atom)).cloned()
    }
}

impl MockXConn for RecordingConn {
    fn mock_monitors(&self) -> Result<Vec<MonitorInfo>> {
        Ok(self.monitor_infos.borrow().clone())
    }

    fn mock_client_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        Ok(WindowAttributes {
            override_redirect: self.override_redirect.borrow().contains(&id),
            viewable: true,
        })
    }

    fn mock_forward_configure(&self, req: &ConfigureRequest) -> Result<()> {
        self.forwarded.borrow_mut().push(*req);
        Ok(())
    }

    fn mock_existing_clients(&self) -> Result<Vec<Xid>> {
        Ok(self.root_children.borrow().clone())
    }

    fn mock_client_geometry(&self, id: Xid) -> Result<Rect> {
        if let Some(r) = self.positions.borrow().get(&id) {
            return Ok(*r);
        }
        Ok(self
            .initial_geometry
            .borrow()
            .get(&id)
            .copied()
            .unwrap_or(Rect::new(0, 0, 800, 600)))
    }

    fn mock_position_client(&self, id: Xid, r: Rect) -> Result<()> {
        self.positions.borrow_mut().insert(id, r);
        Ok(())
    }

    fn mock_set_border_width(&self, id: Xid, px: u32) -> Result<()> {
        self.border_widths.borrow_mut().insert(id, px);
        Ok(())
    }

    fn mock_set_border_color(&self, id: Xid, color: u32) -> Result<()> {
        self.border_colors.borrow_mut().insert(id, color);
        Ok(())
    }

    fn mock_map(&self, id: Xid) -> Result<()> {
        self.mapped.borrow_mut().insert(id);
        Ok(())
    }

    fn mock_unmap(&self, id: Xid) -> Result<()> {
        self.mapped.borrow_mut().remove(&id);
        Ok(())
    }

    fn mock_destroy(&self, id: Xid) -> Result<()> {
        self.destroyed.borrow_mut().push(id);
        self.mapped.borrow_mut().remove(&id);
        Ok(())
    }

    fn mock_focus(&self, id: Xid) -> Result<()> {
        *self.focused.borrow_mut() = Some(id);
        Ok(())
    }

    fn mock_raise(&self, id: Xid) -> Result<()> {
        self.raised.borrow_mut().push(id);
        Ok(())
    }

    fn mock_get_prop(&self, id: Xid, atom: Atom) -> Result<Option<Prop>> {
        Ok(self.props.borrow().get(&(id, atom)).cloned())
    }

    fn mock_set_prop(&self, id: Xid, atom: Atom, value: Prop) -> Result<()> {
        self.props.borrow_mut().insert((id, atom), value);
        Ok(())
    }

    fn mock_warp_pointer(&self, id: Xid, x: i16, y: i16) -> Result<()> {
        self.warps.borrow_mut().push((id, x, y));
        Ok(())
    }
}
