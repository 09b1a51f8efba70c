//! The production [XConn] implementation on top of the `x11rb` crate.
use crate::{
    core::bindings::{KeyCode, LOCK_MASK, NUM_LOCK_MASK},
    pure::geometry::{Point, Rect},
    x::{
        event::{
            ButtonEvent, ClientMessage, ConfigureRequest, MotionEvent, MouseButton, PointerChange,
        },
        Atom, MonitorInfo, Prop, WindowAttributes, XConn, XEvent,
    },
    Error, Result, Xid,
};
use ::x11rb::{
    connection::{Connection, RequestConnection},
    errors::ReplyError,
    protocol::{
        randr::{self, ConnectionExt as _, NotifyMask},
        xproto::{
            Allow, AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
            ConfigWindow, ConfigureWindowAux, ConnectionExt as _, EventMask, Grab, GrabMode,
            InputFocus, MapState, ModMask, PropMode, SetMode, StackMode, CLIENT_MESSAGE_EVENT,
        },
        ErrorKind, Event,
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
    CURRENT_TIME, NONE,
};
use std::{collections::HashMap, str::FromStr};
use strum::IntoEnumIterator;
use tracing::{trace, warn};

/// A live connection to the X server.
#[derive(Debug)]
pub struct X11Conn {
    conn: RustConnection,
    root: Xid,
    atoms: HashMap<Atom, u32>,
}

impl X11Conn {
    /// Connect to the display named in `$DISPLAY`, intern the known atoms
    /// and subscribe to RandR change notifications.
    pub fn new() -> Result<Self> {
        let (conn, screen_ix) = ::x11rb::connect(None)?;
        let root = conn.setup().roots[screen_ix].root;

        if conn
            .extension_information(randr::X11_EXTENSION_NAME)?
            .is_none()
        {
            return Err(Error::Randr);
        }

        // Send every InternAtom request up front, then collect the replies:
        // one round trip set instead of one per atom.
        let cookies = Atom::iter()
            .map(|a| Ok((a, conn.intern_atom(false, a.as_ref().as_bytes())?)))
            .collect::<Result<Vec<_>>>()?;
        let atoms = cookies
            .into_iter()
            .map(|(a, cookie)| Ok((a, cookie.reply()?.atom)))
            .collect::<Result<HashMap<_, _>>>()?;

        let mask =
            NotifyMask::SCREEN_CHANGE | NotifyMask::CRTC_CHANGE | NotifyMask::OUTPUT_CHANGE;
        conn.randr_select_input(root, mask)?;
        conn.flush()?;

        Ok(Self {
            conn,
            root: Xid(root),
            atoms,
        })
    }

    // Interned at construction for every variant, so lookups can not miss.
    fn known_atom(&self, atom: Atom) -> u32 {
        *self.atoms.get(&atom).unwrap()
    }

    fn atom_name_of(&self, id: u32) -> Option<String> {
        if let Some((a, _)) = self.atoms.iter().find(|(_, &v)| v == id) {
            return Some(a.as_ref().to_owned());
        }

        self.conn
            .get_atom_name(id)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .and_then(|reply| String::from_utf8(reply.name).ok())
    }

    fn intern_by_name(&self, name: &str) -> Result<u32> {
        if let Ok(known) = Atom::from_str(name) {
            return Ok(self.known_atom(known));
        }

        Ok(self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
    }

    fn to_xevent(&self, event: Event) -> Option<XEvent> {
        match event {
            Event::ButtonPress(e) => MouseButton::from_detail(e.detail).map(|button| {
                XEvent::ButtonPress(ButtonEvent {
                    child: Xid(e.child),
                    abs: Point::new(e.root_x as i32, e.root_y as i32),
                    button,
                    mask: u16::from(e.state),
                })
            }),
            Event::ButtonRelease(e) => MouseButton::from_detail(e.detail).map(|button| {
                XEvent::ButtonRelease(ButtonEvent {
                    child: Xid(e.child),
                    abs: Point::new(e.root_x as i32, e.root_y as i32),
                    button,
                    mask: u16::from(e.state),
                })
            }),
            Event::MotionNotify(e) => Some(XEvent::Motion(MotionEvent {
                abs: Point::new(e.root_x as i32, e.root_y as i32),
                mask: u16::from(e.state),
            })),
            Event::KeyPress(e) => Some(XEvent::KeyPress(KeyCode {
                mask: u16::from(e.state),
                code: e.detail,
            })),
            Event::MapRequest(e) => Some(XEvent::MapRequest(Xid(e.window))),
            Event::ConfigureRequest(e) => {
                let has = |flag: ConfigWindow| u16::from(e.value_mask) & u16::from(flag) != 0;

                Some(XEvent::ConfigureRequest(ConfigureRequest {
                    id: Xid(e.window),
                    x: has(ConfigWindow::X).then_some(e.x as i32),
                    y: has(ConfigWindow::Y).then_some(e.y as i32),
                    w: has(ConfigWindow::WIDTH).then_some(e.width as u32),
                    h: has(ConfigWindow::HEIGHT).then_some(e.height as u32),
                    border_width: has(ConfigWindow::BORDER_WIDTH)
                        .then_some(e.border_width as u32),
                    sibling: has(ConfigWindow::SIBLING).then_some(Xid(e.sibling)),
                    stack_mode: has(ConfigWindow::STACK_MODE).then_some(u32::from(e.stack_mode)),
                }))
            }
            Event::UnmapNotify(e) => Some(XEvent::Unmap(Xid(e.window))),
            Event::DestroyNotify(e) => Some(XEvent::Destroy(Xid(e.window))),
            Event::EnterNotify(e) => Some(XEvent::Enter(PointerChange {
                id: Xid(e.event),
                abs: Point::new(e.root_x as i32, e.root_y as i32),
            })),
            Event::LeaveNotify(e) => Some(XEvent::Leave(PointerChange {
                id: Xid(e.event),
                abs: Point::new(e.root_x as i32, e.root_y as i32),
            })),
            Event::ClientMessage(e) => {
                let dtype = self.atom_name_of(e.type_)?;
                Some(XEvent::ClientMessage(ClientMessage {
                    id: Xid(e.window),
                    dtype,
                    data: e.data.as_data32(),
                }))
            }
            Event::RandrScreenChangeNotify(_) | Event::RandrNotify(_) => {
                Some(XEvent::RandrNotify)
            }
            _ => {
                trace!(?event, "dropping unhandled event");
                None
            }
        }
    }
}

impl XConn for X11Conn {
    fn root(&self) -> Xid {
        self.root
    }

    fn monitors(&self) -> Result<Vec<MonitorInfo>> {
        let resources = self
            .conn
            .randr_get_screen_resources(*self.root)?
            .reply()?;

        // Fire all CRTC queries before reading any reply
        let cookies = resources
            .crtcs
            .iter()
            .map(|&crtc| Ok((crtc, self.conn.randr_get_crtc_info(crtc, 0)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut monitors = Vec::new();
        for (crtc, cookie) in cookies {
            let info = match cookie.reply() {
                Ok(info) => info,
                Err(_) => continue,
            };
            if info.width == 0 || info.height == 0 {
                continue;
            }

            let name = info
                .outputs
                .first()
                .and_then(|&output| {
                    self.conn
                        .randr_get_output_info(output, 0)
                        .ok()
                        .and_then(|c| c.reply().ok())
                })
                .map(|reply| String::from_utf8_lossy(&reply.name).into_owned())
                .unwrap_or_default();

            monitors.push(MonitorInfo {
                crtc,
                name,
                rect: Rect::new(
                    info.x as i32,
                    info.y as i32,
                    info.width as u32,
                    info.height as u32,
                ),
            });
        }

        Ok(monitors)
    }

    fn cursor_position(&self) -> Result<Point> {
        let reply = self.conn.query_pointer(*self.root)?.reply()?;

        Ok(Point::new(reply.root_x as i32, reply.root_y as i32))
    }

    fn become_window_manager(&self) -> Result<()> {
        let aux = ChangeWindowAttributesAux::new()
            .event_mask(EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT);

        match self.conn.change_window_attributes(*self.root, &aux)?.check() {
            Ok(()) => Ok(()),
            Err(ReplyError::X11Error(e)) if e.error_kind == ErrorKind::Access => {
                Err(Error::AlreadyRunning)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn grab_server(&self) -> Result<()> {
        self.conn.grab_server()?.check()?;

        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.conn.ungrab_server()?.check()?;

        Ok(())
    }

    fn grab_keys(&self, codes: &[KeyCode]) -> Result<()> {
        // Caps- and Num-Lock change the modifier mask without changing what
        // the user thinks they pressed, so every chord is grabbed with the
        // lock variants too.
        let variants = [0, LOCK_MASK, NUM_LOCK_MASK, LOCK_MASK | NUM_LOCK_MASK];

        for code in codes {
            for extra in variants {
                let mask = code.mask | extra;
                let res = self
                    .conn
                    .grab_key(
                        false,
                        *self.root,
                        ModMask::from(mask),
                        code.code,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?
                    .check();

                if let Err(e) = res {
                    warn!(code = code.code, mask, %e, "unable to grab key");
                }
            }
        }

        Ok(())
    }

    fn ungrab_keys(&self) -> Result<()> {
        self.conn
            .ungrab_key(Grab::ANY, *self.root, ModMask::ANY)?
            .check()?;

        Ok(())
    }

    fn grab_buttons(&self, mask: u16) -> Result<()> {
        let event_mask =
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION;

        for button in [ButtonIndex::M1, ButtonIndex::M3] {
            let res = self
                .conn
                .grab_button(
                    false,
                    *self.root,
                    event_mask,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                    NONE,
                    NONE,
                    button,
                    ModMask::from(mask),
                )?
                .check();

            if let Err(e) = res {
                warn!(?button, mask, %e, "unable to grab button");
            }
        }

        Ok(())
    }

    fn ungrab_buttons(&self) -> Result<()> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, *self.root, ModMask::ANY)?
            .check()?;

        Ok(())
    }

    fn replay_pointer(&self) -> Result<()> {
        self.conn.allow_events(Allow::REPLAY_POINTER, CURRENT_TIME)?;
        self.conn.flush()?;

        Ok(())
    }

    fn next_event(&self) -> Result<XEvent> {
        loop {
            let event = self.conn.wait_for_event()?;
            if let Some(xevent) = self.to_xevent(event) {
                return Ok(xevent);
            }
        }
    }

    fn flush(&self) {
        let _ = self.conn.flush();
    }

    fn atom_id(&self, atom: Atom) -> u32 {
        self.known_atom(atom)
    }

    fn existing_clients(&self) -> Result<Vec<Xid>> {
        let reply = self.conn.query_tree(*self.root)?.reply()?;

        Ok(reply.children.into_iter().map(Xid).collect())
    }

    fn client_geometry(&self, id: Xid) -> Result<Rect> {
        let geo = self.conn.get_geometry(*id)?.reply()?;

        Ok(Rect::new(
            geo.x as i32,
            geo.y as i32,
            geo.width as u32,
            geo.height as u32,
        ))
    }

    fn client_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        let attrs = self.conn.get_window_attributes(*id)?.reply()?;

        Ok(WindowAttributes {
            override_redirect: attrs.override_redirect,
            viewable: attrs.map_state == MapState::VIEWABLE,
        })
    }

    fn set_client_event_mask(&self, id: Xid) -> Result<()> {
        let mask = EventMask::ENTER_WINDOW
            | EventMask::LEAVE_WINDOW
            | EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::KEY_PRESS
            | EventMask::KEY_RELEASE;
        let aux = ChangeWindowAttributesAux::new().event_mask(mask);
        self.conn.change_window_attributes(*id, &aux)?;

        Ok(())
    }

    fn add_to_save_set(&self, id: Xid) -> Result<()> {
        self.conn.change_save_set(SetMode::INSERT, *id)?;

        Ok(())
    }

    fn remove_from_save_set(&self, id: Xid) -> Result<()> {
        self.conn.change_save_set(SetMode::DELETE, *id)?;

        Ok(())
    }

    fn map(&self, id: Xid) -> Result<()> {
        self.conn.map_window(*id)?;

        Ok(())
    }

    fn unmap(&self, id: Xid) -> Result<()> {
        self.conn.unmap_window(*id)?;

        Ok(())
    }

    fn destroy(&self, id: Xid) -> Result<()> {
        self.conn.destroy_window(*id)?;

        Ok(())
    }

    fn focus(&self, id: Xid) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, *id, CURRENT_TIME)?;

        Ok(())
    }

    fn position_client(&self, id: Xid, r: Rect) -> Result<()> {
        let aux = ConfigureWindowAux::new()
            .x(r.x)
            .y(r.y)
            .width(r.w)
            .height(r.h);
        self.conn.configure_window(*id, &aux)?;

        Ok(())
    }

    fn set_border_width(&self, id: Xid, px: u32) -> Result<()> {
        let aux = ConfigureWindowAux::new().border_width(px);
        self.conn.configure_window(*id, &aux)?;

        Ok(())
    }

    fn set_border_color(&self, id: Xid, color: u32) -> Result<()> {
        let aux = ChangeWindowAttributesAux::new().border_pixel(color);
        self.conn.change_window_attributes(*id, &aux)?;

        Ok(())
    }

    fn raise(&self, id: Xid) -> Result<()> {
        let aux = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        self.conn.configure_window(*id, &aux)?;

        Ok(())
    }

    fn forward_configure(&self, req: &ConfigureRequest) -> Result<()> {
        let mut aux = ConfigureWindowAux::new();
        if let Some(x) = req.x {
            aux = aux.x(x);
        }
        if let Some(y) = req.y {
            aux = aux.y(y);
        }
        if let Some(w) = req.w {
            aux = aux.width(w);
        }
        if let Some(h) = req.h {
            aux = aux.height(h);
        }
        if let Some(bw) = req.border_width {
            aux = aux.border_width(bw);
        }
        if let Some(sibling) = req.sibling {
            aux = aux.sibling(*sibling);
        }
        if let Some(mode) = req.stack_mode {
            let mode = match mode {
                0 => StackMode::ABOVE,
                1 => StackMode::BELOW,
                2 => StackMode::TOP_IF,
                3 => StackMode::BOTTOM_IF,
                _ => StackMode::OPPOSITE,
            };
            aux = aux.stack_mode(mode);
        }

        self.conn.configure_window(*req.id, &aux)?;

        Ok(())
    }

    fn get_prop(&self, id: Xid, atom: Atom) -> Result<Option<Prop>> {
        let prop = self.known_atom(atom);
        let reply = self
            .conn
            .get_property(false, *id, prop, AtomEnum::ANY, 0, 1024)?
            .reply()?;

        if reply.value_len == 0 {
            return Ok(None);
        }

        let type_ = reply.type_;
        let prop = if type_ == u32::from(AtomEnum::ATOM) {
            let names = reply
                .value32()
                .map(|vals| vals.filter_map(|v| self.atom_name_of(v)).collect())
                .unwrap_or_default();
            Prop::Atoms(names)
        } else if type_ == u32::from(AtomEnum::CARDINAL) {
            Prop::Cardinals(reply.value32().map(|v| v.collect()).unwrap_or_default())
        } else if type_ == u32::from(AtomEnum::WINDOW) {
            Prop::Windows(
                reply
                    .value32()
                    .map(|v| v.map(Xid).collect())
                    .unwrap_or_default(),
            )
        } else if type_ == u32::from(AtomEnum::STRING) {
            Prop::Utf8String(String::from_utf8_lossy(&reply.value).into_owned())
        } else {
            return Ok(None);
        };

        Ok(Some(prop))
    }

    fn set_prop(&self, id: Xid, atom: Atom, value: Prop) -> Result<()> {
        let prop = self.known_atom(atom);

        match value {
            Prop::Atoms(names) => {
                let ids = names
                    .iter()
                    .map(|n| self.intern_by_name(n))
                    .collect::<Result<Vec<u32>>>()?;
                self.conn
                    .change_property32(PropMode::REPLACE, *id, prop, AtomEnum::ATOM, &ids)?;
            }
            Prop::Cardinals(vals) => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    *id,
                    prop,
                    AtomEnum::CARDINAL,
                    &vals,
                )?;
            }
            Prop::Windows(windows) => {
                let raw: Vec<u32> = windows.into_iter().map(u32::from).collect();
                self.conn
                    .change_property32(PropMode::REPLACE, *id, prop, AtomEnum::WINDOW, &raw)?;
            }
            Prop::Utf8String(s) => {
                self.conn.change_property8(
                    PropMode::REPLACE,
                    *id,
                    prop,
                    AtomEnum::STRING,
                    s.as_bytes(),
                )?;
            }
        }

        Ok(())
    }

    fn send_client_message(&self, id: Xid, dtype: Atom, data: [u32; 5]) -> Result<()> {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window: *id,
            type_: self.known_atom(dtype),
            data: data.into(),
        };

        self.conn
            .send_event(false, *id, EventMask::NO_EVENT, &event)?;

        Ok(())
    }

    fn warp_pointer(&self, id: Xid, x: i16, y: i16) -> Result<()> {
        self.conn.warp_pointer(NONE, *id, 0, 0, 0, 0, x, y)?;

        Ok(())
    }
}
