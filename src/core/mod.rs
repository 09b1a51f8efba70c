//! The window manager: startup, the blocking event loop and the protocol
//! event handlers.
//!
//! Everything here is generic over [XConn] so the full event flow can be
//! driven in tests against a recording connection.
use crate::{
    config::Config,
    core::{
        bindings::{
            keycodes_from_xmodmap, resolve_binds, BoundAction, KeyCode, ResolvedBind, LOCK_MASK,
            NUM_LOCK_MASK,
        },
        drag::Drag,
    },
    pure::{
        geometry::{Point, Rect},
        layout::{self, LayoutTable},
        state::{Monitor, WindowSet, WORKSPACE_COUNT},
    },
    util,
    x::{
        event::{ButtonEvent, ClientMessage, ConfigureRequest, MotionEvent, MouseButton, PointerChange},
        ewmh, Atom, MonitorInfo, Prop, XConn, XEvent, IGNORED_WINDOW_TYPES,
    },
    Result, Xid,
};
use std::collections::HashMap;
use tracing::{debug, error, info, trace, warn};

pub mod actions;
pub mod bindings;
pub mod drag;

/// Pixel step for the keyboard driven floating move actions.
const MOVE_STEP: i32 = 10;

/// A running window manager: the state store, the active config and the
/// connection they are driven through.
#[derive(Debug)]
pub struct WindowManager<X: XConn> {
    x: X,
    config: Config,
    layouts: LayoutTable,
    state: WindowSet,
    binds: Vec<ResolvedBind>,
    drag: Drag,
    // Unmaps this process requested; the matching UnmapNotify events must
    // not be mistaken for clients withdrawing themselves.
    pending_unmaps: HashMap<Xid, usize>,
}

impl<X: XConn> WindowManager<X> {
    /// Construct a manager from a connection and a parsed config.
    ///
    /// Monitors are enumerated up front; everything else waits for
    /// [run][WindowManager::run].
    pub fn new(x: X, config: Config) -> Result<Self> {
        let infos = x.monitors()?;
        let monitors = monitors_from(&infos, &config);
        info!(n = monitors.len(), "enumerated monitors");

        Ok(Self {
            layouts: config.layout_table(),
            state: WindowSet::new(monitors),
            binds: Vec::new(),
            drag: Drag::Idle,
            pending_unmaps: HashMap::new(),
            config,
            x,
        })
    }

    /// A read only view of the current window manager state.
    pub fn state(&self) -> &WindowSet {
        &self.state
    }

    /// Claim the root window, adopt pre-existing clients, install grabs and
    /// run the blocking event loop.
    pub fn run(&mut self) -> Result<()> {
        self.x.become_window_manager()?;
        ewmh::announce_support(&self.x)?;

        // Sweep what is already mapped before any client can race us.
        self.x.grab_server()?;
        let existing = self.x.existing_clients()?;
        for id in existing {
            if let Err(e) = self.frame(id, true) {
                warn!(%id, %e, "unable to adopt pre-existing window");
            }
        }
        self.x.ungrab_server()?;

        self.grab_bindings()?;

        ewmh::publish_current_desktop(&self.x, self.state.current_monitor().active_index())?;
        ewmh::publish_number_of_desktops(&self.x, self.state.desktop_count())?;
        self.refit_monitor(self.state.current_index())?;
        ewmh::publish_workarea(&self.x, self.state.current_monitor())?;

        if let Some(autostart) = Config::autostart_path() {
            if autostart.exists() {
                info!(?autostart, "running autostart script");
                if let Err(e) = util::spawn(autostart.to_string_lossy()) {
                    warn!(%e, "unable to run autostart script");
                }
            }
        }

        self.x.flush();
        info!("entering event loop");

        loop {
            let event = self.x.next_event()?;
            trace!(%event, "got event");

            self.update_current_monitor();
            self.focus_root_if_empty();

            if let Err(e) = self.handle_event(&event) {
                error!(%event, %e, "error while handling event");
            }

            self.x.flush();
        }
    }

    /// Dispatch one event to its handler.
    pub fn handle_event(&mut self, event: &XEvent) -> Result<()> {
        match event {
            XEvent::ButtonPress(ev) => self.on_button_press(ev),
            XEvent::ButtonRelease(ev) => self.on_button_release(ev),
            XEvent::ClientMessage(msg) => self.on_client_message(msg),
            XEvent::ConfigureRequest(req) => self.on_configure_request(req),
            XEvent::Destroy(id) => self.on_window_gone(*id),
            XEvent::Unmap(id) => self.on_unmap(*id),
            XEvent::Enter(pc) => self.on_enter(pc),
            XEvent::KeyPress(kc) => self.on_key_press(*kc),
            XEvent::Leave(pc) => self.on_leave(pc),
            XEvent::MapRequest(id) => self.on_map_request(*id),
            XEvent::Motion(ev) => self.on_motion(ev),
            XEvent::RandrNotify => self.on_randr(),
        }
    }

    // Recompute which monitor holds the pointer; a crossing republishes the
    // per-monitor root properties.
    fn update_current_monitor(&mut self) {
        let p = match self.x.cursor_position() {
            Ok(p) => p,
            Err(e) => {
                warn!(%e, "unable to query pointer");
                return;
            }
        };

        if let Some(ix) = self.state.monitor_containing(p) {
            if ix != self.state.current_index() {
                debug!(from = self.state.current_index(), to = ix, "pointer changed monitor");
                self.state.set_current(ix);
                let _ = ewmh::publish_client_list(&self.x, &self.state);
                let _ = ewmh::publish_workarea(&self.x, self.state.current_monitor());
            }
        }
    }

    fn focus_root_if_empty(&mut self) {
        if self.state.current_monitor().active_workspace().is_empty() {
            let _ = self.x.focus(self.x.root());
        }
    }

    /// Admit a window to the current workspace, decorating and mapping it.
    ///
    /// A second call for a known id is a no-op, as are calls for windows
    /// that opt out of management.
    pub(crate) fn frame(&mut self, id: Xid, pre_existing: bool) -> Result<()> {
        if self.state.contains(id) {
            trace!(%id, "window already framed");
            return Ok(());
        }

        let attrs = self.x.client_attributes(id)?;
        if attrs.override_redirect {
            debug!(%id, "skipping override-redirect window");
            return Ok(());
        }
        if pre_existing && !attrs.viewable {
            debug!(%id, "skipping unmapped pre-existing window");
            return Ok(());
        }

        let r = self
            .x
            .client_geometry(id)?
            .centered_in(&self.state.current_monitor().rect);

        if ewmh::net_wm_state_contains(&self.x, id, Atom::NetWmStateAbove) {
            self.x.raise(id)?;
        }

        self.x.set_border_width(id, self.config.border_width)?;
        self.x.set_border_color(id, self.config.border_unactive)?;
        self.x.add_to_save_set(id)?;
        self.x.set_client_event_mask(id)?;
        self.x.set_prop(
            id,
            Atom::NetWmWindowType,
            Prop::Atoms(vec![Atom::NetWindowTypeNormal.as_ref().to_owned()]),
        )?;
        self.x.position_client(id, r)?;
        self.x.map(id)?;

        self.state.insert(id, r);
        ewmh::publish_client_list(&self.x, &self.state)?;
        info!(%id, ?r, "framed new window");

        Ok(())
    }

    /// Tear a window down: unmap, drop from the save set, destroy and
    /// remove every trace from the state store.
    pub(crate) fn unframe(&mut self, id: Xid) -> Result<()> {
        if let Err(e) = self.x.unmap(id) {
            warn!(%id, %e, "unable to unmap window");
        }
        if let Err(e) = self.x.remove_from_save_set(id) {
            warn!(%id, %e, "unable to remove window from save set");
        }
        self.x.destroy(id)?;

        self.on_window_gone(id)
    }

    fn on_map_request(&mut self, id: Xid) -> Result<()> {
        if ewmh::has_window_type_in(&self.x, id, IGNORED_WINDOW_TYPES) {
            debug!(%id, "mapping ignored window type unmanaged");
            return self.x.map(id);
        }

        self.frame(id, false)?;

        if self.state.contains(id) {
            let ws_ix = self.state.current_monitor().active_index();
            ewmh::set_window_desktop(&self.x, id, ws_ix)?;
            ewmh::publish_number_of_desktops(&self.x, self.state.desktop_count())?;
            self.refit_monitor(self.state.current_index())?;
            ewmh::publish_workarea(&self.x, self.state.current_monitor())?;
        }

        Ok(())
    }

    // An unmap notify is only a client going away when we did not cause it
    // ourselves by hiding a workspace.
    fn on_unmap(&mut self, id: Xid) -> Result<()> {
        if let Some(n) = self.pending_unmaps.get_mut(&id) {
            *n -= 1;
            if *n == 0 {
                self.pending_unmaps.remove(&id);
            }
            trace!(%id, "suppressing self-induced unmap");
            return Ok(());
        }

        self.on_window_gone(id)
    }

    // A destroyed or unmapped window may live on any workspace of any
    // monitor; not finding it at all is fine (it was never managed).
    fn on_window_gone(&mut self, id: Xid) -> Result<()> {
        let location = self.state.find(id);
        self.pending_unmaps.remove(&id);
        if self.state.remove(id).is_none() {
            trace!(%id, "unmanaged window gone");
            return Ok(());
        }

        debug!(%id, "removed managed window");
        ewmh::publish_client_list(&self.x, &self.state)?;
        ewmh::publish_number_of_desktops(&self.x, self.state.desktop_count())?;
        ewmh::publish_workarea(&self.x, self.state.current_monitor())?;

        if let Some((mon_ix, ws_ix)) = location {
            let visible = self
                .state
                .monitor(mon_ix)
                .map(|m| m.active_index() == ws_ix)
                .unwrap_or(false);
            if visible {
                self.refit_monitor(mon_ix)?;
            }
        }

        Ok(())
    }

    // The WM owns the geometry of tiled clients: their requests are dropped
    // on the floor. Everything else is forwarded untouched.
    fn on_configure_request(&mut self, req: &ConfigureRequest) -> Result<()> {
        if let Some((mon_ix, ws_ix)) = self.state.find(req.id) {
            let tiling = self
                .state
                .monitor(mon_ix)
                .and_then(|m| m.workspace(ws_ix))
                .map(|ws| ws.tiling)
                .unwrap_or(false);

            if tiling {
                trace!(id = %req.id, "dropping configure request for tiled window");
                return Ok(());
            }

            if let Some(c) = self.state.client_mut(req.id) {
                let r = c.rect;
                c.rect = Rect {
                    x: req.x.unwrap_or(r.x),
                    y: req.y.unwrap_or(r.y),
                    w: req.w.unwrap_or(r.w),
                    h: req.h.unwrap_or(r.h),
                };
            }
        }

        self.x.forward_configure(req)
    }

    fn on_enter(&mut self, pc: &PointerChange) -> Result<()> {
        if !self.state.contains(pc.id) {
            return Ok(());
        }

        trace!(id = %pc.id, "focusing window under pointer");
        self.state.focused = Some(pc.id);
        self.x.focus(pc.id)?;
        self.x.set_border_color(pc.id, self.config.border_active)?;
        ewmh::publish_active_window(&self.x, pc.id)
    }

    fn on_leave(&mut self, pc: &PointerChange) -> Result<()> {
        if self.state.contains(pc.id) {
            self.x.set_border_color(pc.id, self.config.border_unactive)?;
        }

        Ok(())
    }

    fn on_key_press(&mut self, kc: KeyCode) -> Result<()> {
        let pressed = kc.ignoring_modifiers(LOCK_MASK | NUM_LOCK_MASK);

        let matches: Vec<ResolvedBind> = self
            .binds
            .iter()
            .filter(|b| b.code == pressed)
            .cloned()
            .collect();

        for bind in matches {
            if let Some(cmd) = &bind.exec {
                if let Err(e) = util::spawn(cmd) {
                    warn!(%cmd, %e, "unable to spawn bound command");
                }
            }
            if let Some(action) = bind.action {
                match action {
                    BoundAction::Role(role) => self.run_action(role)?,
                    BoundAction::SwitchTo(ix) => self.switch_workspace(ix)?,
                    BoundAction::MoveTo(ix) => self.move_focused_to_workspace(ix)?,
                }
            }
        }

        Ok(())
    }

    fn on_button_press(&mut self, ev: &ButtonEvent) -> Result<()> {
        let modmask = self.config.mod_key.mask();
        if ev.mask & modmask == 0 {
            // Not ours: hand the event back to the client it targeted.
            return self.x.replay_pointer();
        }

        if ev.child == self.x.root() || *ev.child == 0 {
            return Ok(());
        }

        if ev.button == MouseButton::Left {
            self.x.raise(ev.child)?;
        }

        let fullscreen = match self.state.client(ev.child) {
            Some(c) => c.fullscreen,
            None => return Ok(()),
        };
        if fullscreen {
            return Ok(());
        }

        let base = self.x.client_geometry(ev.child)?;
        self.drag.engage(ev.child, ev.button, ev.abs, base);
        trace!(id = %ev.child, ?ev.abs, "drag engaged");

        Ok(())
    }

    fn on_motion(&mut self, ev: &MotionEvent) -> Result<()> {
        if ev.mask & self.config.mod_key.mask() == 0 {
            return Ok(());
        }

        let id = match self.drag.id() {
            Some(id) => id,
            None => return Ok(()),
        };

        if matches!(self.drag, Drag::Resizing { .. })
            && self.state.current_monitor().active_workspace().tiling
        {
            // Interactive resizing only makes sense for floating layouts
            return Ok(());
        }

        if let Some(r) = self.drag.rect_for(ev.abs) {
            self.x.position_client(id, r)?;
        }

        Ok(())
    }

    fn on_button_release(&mut self, ev: &ButtonEvent) -> Result<()> {
        let drag = self.drag.take();
        let (id, anchor) = match (drag.id(), drag.anchor()) {
            (Some(id), Some(anchor)) => (id, anchor),
            _ => return Ok(()),
        };

        if !self.state.contains(id) {
            // The window went away mid-drag
            return Ok(());
        }

        let release = ev.abs;
        let final_rect = match drag.rect_for(release) {
            Some(r) => r,
            None => return Ok(()),
        };

        match drag {
            Drag::Moving { .. } => self.resolve_moved(id, anchor, release, final_rect),
            Drag::Resizing { .. } => {
                if !self.state.current_monitor().active_workspace().tiling {
                    if let Some(c) = self.state.client_mut(id) {
                        c.rect = final_rect;
                    }
                }
                Ok(())
            }
            Drag::Idle => Ok(()),
        }
    }

    // Work out what a completed drag-move meant: a cross-monitor transfer,
    // a tiled swap, or a plain floating reposition.
    fn resolve_moved(
        &mut self,
        id: Xid,
        anchor: Point,
        release: Point,
        final_rect: Rect,
    ) -> Result<()> {
        let src = self
            .state
            .monitor_containing(anchor)
            .unwrap_or(self.state.current_index());
        let dst = self.state.monitor_containing(release).unwrap_or(src);

        if src != dst {
            debug!(%id, src, dst, "drag moved window between monitors");
            if let Some(c) = self.state.client_mut(id) {
                c.rect = final_rect;
            }
            self.state.transfer(id, dst);

            let ws_ix = self
                .state
                .monitor(dst)
                .map(|m| m.active_index())
                .unwrap_or(0);
            ewmh::set_window_desktop(&self.x, id, ws_ix)?;
            ewmh::publish_client_list(&self.x, &self.state)?;
            self.refit_monitor(src)?;
            self.refit_monitor(dst)?;

            return Ok(());
        }

        let tiling = self
            .state
            .monitor(dst)
            .map(|m| m.active_workspace().tiling)
            .unwrap_or(false);

        if tiling {
            if let Some(other) = self.tiled_window_at(dst, release, id) {
                debug!(%id, %other, "swapping tiled windows after drag");
                if let Some(mon) = self.state.monitor_mut(dst) {
                    let ws = mon.active_workspace_mut();
                    if let (Some(a), Some(b)) = (ws.position_of(id), ws.position_of(other)) {
                        ws.swap(a, b);
                    }
                }
            }
            // Either way the layout snaps every window back into its slot
            self.refit_monitor(dst)?;
        } else if let Some(c) = self.state.client_mut(id) {
            c.rect = final_rect;
        }

        Ok(())
    }

    fn on_client_message(&mut self, msg: &ClientMessage) -> Result<()> {
        debug!(id = %msg.id, dtype = %msg.dtype, "client message");

        match msg.dtype.as_str() {
            "_NET_CURRENT_DESKTOP" => self.switch_workspace(msg.data[0] as usize),

            "_NET_WM_STATE" if self.config.auto_fullscreen => {
                let wanted = [
                    self.x.atom_id(Atom::NetWmStateFullscreen),
                    self.x.atom_id(Atom::NetWmStateMaximizedHorz),
                    self.x.atom_id(Atom::NetWmStateMaximizedVert),
                ];
                if !msg.data[1..3].iter().any(|a| wanted.contains(a)) {
                    return Ok(());
                }
                if !self.state.contains(msg.id) {
                    return Ok(());
                }

                let currently = self
                    .state
                    .client(msg.id)
                    .map(|c| c.fullscreen)
                    .unwrap_or(false);
                // data[0] per EWMH: 0 = remove, 1 = add, 2 = toggle
                match msg.data[0] {
                    0 => self.set_fullscreen(msg.id, false),
                    1 => self.set_fullscreen(msg.id, true),
                    2 => self.set_fullscreen(msg.id, !currently),
                    n => {
                        warn!(n, "invalid _NET_WM_STATE action");
                        Ok(())
                    }
                }
            }

            _ => Ok(()),
        }
    }

    fn on_randr(&mut self) -> Result<()> {
        let infos = self.x.monitors()?;
        info!(n = infos.len(), "outputs changed: re-enumerating monitors");

        let monitors = infos
            .iter()
            .enumerate()
            .map(|(ix, info)| {
                let rect = positioned_rect(info, ix, &self.config);
                match self.state.monitors().iter().find(|m| m.crtc == info.crtc) {
                    Some(existing) => {
                        let mut m = existing.clone();
                        m.rect = rect;
                        m.name = info.name.clone();
                        m
                    }
                    None => Monitor::new(info.crtc, info.name.clone(), rect, self.config.default_tiling),
                }
            })
            .collect();

        self.state.replace_monitors(monitors);

        for ix in 0..self.state.monitors().len() {
            self.refit_monitor(ix)?;
        }
        ewmh::publish_client_list(&self.x, &self.state)?;
        ewmh::publish_workarea(&self.x, self.state.current_monitor())?;
        ewmh::publish_current_desktop(&self.x, self.state.current_monitor().active_index())
    }

    /// Switch the current monitor to the given workspace: unmap outgoing,
    /// map incoming, re-sync tiling state and republish desktop properties.
    pub fn switch_workspace(&mut self, target: usize) -> Result<()> {
        if target >= WORKSPACE_COUNT {
            return Ok(());
        }

        let mon_ix = self.state.current_index();
        let from = self.state.current_monitor().active_index();
        if from == target {
            return Ok(());
        }

        debug!(from, to = target, "switching workspace");

        let outgoing = self.state.current_monitor().active_workspace().windows().to_vec();
        for id in outgoing {
            match self.x.unmap(id) {
                Ok(()) => *self.pending_unmaps.entry(id).or_insert(0) += 1,
                Err(e) => warn!(%id, %e, "unable to unmap outgoing window"),
            }
        }

        self.state.current_monitor_mut().set_active(target);

        let incoming = self.state.current_monitor().active_workspace().windows().to_vec();
        for &id in &incoming {
            if let Err(e) = self.x.map(id) {
                warn!(%id, %e, "unable to map incoming window");
            }
        }

        self.sync_workspace_tiling(mon_ix)?;

        // Broadcast after the unmap/map pair so observers see a consistent
        // snapshot.
        ewmh::publish_current_desktop(&self.x, target)?;
        ewmh::publish_number_of_desktops(&self.x, self.state.desktop_count())?;
        ewmh::publish_workarea(&self.x, self.state.current_monitor())?;

        if incoming.is_empty() {
            self.x.focus(self.x.root())?;
        }

        Ok(())
    }

    /// Move the focused window to the target workspace on the current
    /// monitor, then follow it there.
    pub fn move_focused_to_workspace(&mut self, target: usize) -> Result<()> {
        let id = match self.state.focused {
            Some(id) => id,
            None => return Ok(()),
        };
        if target >= WORKSPACE_COUNT
            || target == self.state.current_monitor().active_index()
        {
            return Ok(());
        }

        debug!(%id, target, "moving focused window to workspace");
        self.state.move_to_workspace(id, target);
        ewmh::set_window_desktop(&self.x, id, target)?;
        self.switch_workspace(target)?;
        ewmh::publish_client_list(&self.x, &self.state)
    }

    // Bring a workspace's tiling state back in line with its monitor after
    // a switch, unless it has detached.
    fn sync_workspace_tiling(&mut self, mon_ix: usize) -> Result<()> {
        let (detached, ws_tiling, mon_tiling) = {
            let mon = match self.state.monitor(mon_ix) {
                Some(m) => m,
                None => return Ok(()),
            };
            let ws = mon.active_workspace();
            (ws.detach_tiling, ws.tiling, mon.tiling)
        };

        if detached || ws_tiling == mon_tiling {
            if ws_tiling {
                self.refit_monitor(mon_ix)?;
            }
            return Ok(());
        }

        if mon_tiling {
            self.enable_tiling(mon_ix)
        } else {
            self.disable_tiling(mon_ix)
        }
    }

    // Snapshot floating geometry into the records, then lay the workspace
    // out.
    pub(crate) fn enable_tiling(&mut self, mon_ix: usize) -> Result<()> {
        let windows = match self.state.monitor(mon_ix) {
            Some(m) => m.active_workspace().windows().to_vec(),
            None => return Ok(()),
        };

        for id in windows {
            if let Ok(r) = self.x.client_geometry(id) {
                if let Some(c) = self.state.client_mut(id) {
                    c.rect = r;
                }
            }
        }

        if let Some(m) = self.state.monitor_mut(mon_ix) {
            m.active_workspace_mut().tiling = true;
        }

        self.refit_monitor(mon_ix)?;
        ewmh::publish_workarea(&self.x, self.state.current_monitor())
    }

    // Put every window back where it floated before tiling was enabled.
    pub(crate) fn disable_tiling(&mut self, mon_ix: usize) -> Result<()> {
        if let Some(m) = self.state.monitor_mut(mon_ix) {
            m.active_workspace_mut().tiling = false;
        }

        let windows = match self.state.monitor(mon_ix) {
            Some(m) => m.active_workspace().windows().to_vec(),
            None => return Ok(()),
        };

        for id in windows {
            let (rect, fullscreen) = match self.state.client(id) {
                Some(c) => (c.rect, c.fullscreen),
                None => continue,
            };
            if fullscreen {
                continue;
            }
            self.x.set_border_width(id, self.config.border_width)?;
            self.x.position_client(id, rect)?;
        }

        ewmh::publish_workarea(&self.x, self.state.current_monitor())
    }

    /// Re-derive the tiling space for a monitor and push every window of
    /// its active workspace into its slot.
    pub(crate) fn refit_monitor(&mut self, mon_ix: usize) -> Result<()> {
        let (mon_rect, tiling) = match self.state.monitor(mon_ix) {
            Some(m) => (m.rect, m.active_workspace().tiling),
            None => return Ok(()),
        };
        if !tiling {
            return Ok(());
        }

        // Refresh the cached tiling space from the current strut situation.
        let strut = ewmh::strut_for(&self.x, &mon_rect).unwrap_or_default();
        let ts = layout::tiling_space(&mon_rect, strut, self.config.outer_gap);
        if let Some(m) = self.state.monitor_mut(mon_ix) {
            m.tiling_space = ts;
        }

        let placements = match self.tiled_placements(mon_ix) {
            Some(p) => p,
            None => return Ok(()),
        };

        for (id, rect, fullscreen) in placements {
            if fullscreen {
                self.x.raise(id)?;
                self.x.set_border_width(id, 0)?;
                self.x.position_client(id, mon_rect)?;
            } else {
                self.x.set_border_width(id, self.config.border_width)?;
                self.x.position_client(id, rect)?;
            }
        }

        Ok(())
    }

    // The pre-gap pixel slots currently in effect for a monitor's active
    // workspace: the user resized layout when one is live, the catalog
    // projection otherwise. Also resets a layout index left stale by a
    // previous window population.
    pub(crate) fn current_slots(&mut self, mon_ix: usize) -> Option<Vec<Rect>> {
        let (ts, resized, resized_layout, layout_index, n) = {
            let mon = self.state.monitor(mon_ix)?;
            let ws = mon.active_workspace();
            (
                mon.tiling_space,
                ws.resized,
                ws.resized_layout.clone(),
                ws.layout_index,
                ws.len(),
            )
        };

        if n == 0 {
            return None;
        }

        if resized && resized_layout.len() == n {
            return Some(resized_layout);
        }

        let layouts = self.layouts.layouts_for(n)?;
        let ix = if layout_index < layouts.len() {
            layout_index
        } else {
            // A stale index from a previous population resets to the
            // first layout.
            if let Some(m) = self.state.monitor_mut(mon_ix) {
                m.active_workspace_mut().layout_index = 0;
            }
            0
        };

        Some(layout::pixel_slots(&layouts[ix], &ts))
    }

    // The slot rectangle for each window of a monitor's active workspace,
    // in sequence order. Fullscreen windows keep their slot assignment but
    // are flagged so placement can skip them.
    fn tiled_placements(&mut self, mon_ix: usize) -> Option<Vec<(Xid, Rect, bool)>> {
        let slots = self.current_slots(mon_ix)?;
        let (ts, windows) = {
            let mon = self.state.monitor(mon_ix)?;
            (mon.tiling_space, mon.active_workspace().windows().to_vec())
        };

        let rects = layout::apply_gaps(&slots, &ts, self.config.gap);

        Some(
            windows
                .into_iter()
                .zip(rects)
                .map(|(id, rect)| {
                    let fullscreen = self
                        .state
                        .client(id)
                        .map(|c| c.fullscreen)
                        .unwrap_or(false);
                    (id, rect, fullscreen)
                })
                .collect(),
        )
    }

    // The rectangle a window currently occupies under the active layout.
    pub(crate) fn tiled_rect_of(&mut self, mon_ix: usize, id: Xid) -> Option<Rect> {
        self.tiled_placements(mon_ix)?
            .into_iter()
            .find(|(w, _, _)| *w == id)
            .map(|(_, rect, _)| rect)
    }

    // Hit-test a root coordinate against the tiled rectangles of a
    // monitor's active workspace.
    fn tiled_window_at(&mut self, mon_ix: usize, p: Point, exclude: Xid) -> Option<Xid> {
        self.tiled_placements(mon_ix)?
            .into_iter()
            .find(|(id, rect, fullscreen)| {
                *id != exclude && !fullscreen && rect.contains_point(p)
            })
            .map(|(id, _, _)| id)
    }

    /// Apply or clear fullscreen for a window.
    pub(crate) fn set_fullscreen(&mut self, id: Xid, fullscreen: bool) -> Result<()> {
        let (mon_ix, ws_ix) = match self.state.find(id) {
            Some(loc) => loc,
            None => return Ok(()),
        };
        let currently = self.state.client(id).map(|c| c.fullscreen).unwrap_or(false);
        if currently == fullscreen {
            return Ok(());
        }

        let mon_rect = self.state.monitor(mon_ix).map(|m| m.rect).unwrap_or_default();
        let tiling = self
            .state
            .monitor(mon_ix)
            .and_then(|m| m.workspace(ws_ix))
            .map(|ws| ws.tiling)
            .unwrap_or(false);

        if fullscreen {
            debug!(%id, "entering fullscreen");
            if !tiling {
                // Keep the rect to restore on exit honest
                if let Ok(r) = self.x.client_geometry(id) {
                    if let Some(c) = self.state.client_mut(id) {
                        c.rect = r;
                    }
                }
            }
            if let Some(c) = self.state.client_mut(id) {
                c.fullscreen = true;
            }
            self.x.raise(id)?;
            self.x.set_border_width(id, 0)?;
            self.x.position_client(id, mon_rect)?;
        } else {
            debug!(%id, "leaving fullscreen");
            if let Some(c) = self.state.client_mut(id) {
                c.fullscreen = false;
            }
            self.x.set_border_width(id, self.config.border_width)?;
            if tiling {
                self.refit_monitor(mon_ix)?;
            } else {
                let rect = self.state.client(id).map(|c| c.rect).unwrap_or_default();
                self.x.position_client(id, rect)?;
            }
        }

        ewmh::set_fullscreen_state(&self.x, id, fullscreen)
    }

    // Probe the keyboard mapping and install all grabs for the active
    // config.
    fn grab_bindings(&mut self) -> Result<()> {
        let codes = match keycodes_from_xmodmap() {
            Ok(codes) => codes,
            Err(e) => {
                warn!(%e, "unable to probe keyboard mapping: keybindings disabled");
                Default::default()
            }
        };

        self.binds = resolve_binds(&self.config, &codes);
        let key_codes: Vec<KeyCode> = self.binds.iter().map(|b| b.code).collect();
        self.x.grab_keys(&key_codes)?;
        self.x.grab_buttons(self.config.mod_key.mask())?;

        Ok(())
    }

    // Swap in a freshly loaded config: new layout table, new grabs, new
    // borders, fresh layout.
    pub(crate) fn apply_config(&mut self, config: Config) -> Result<()> {
        self.config = config;
        self.layouts = self.config.layout_table();

        self.x.ungrab_keys()?;
        self.x.ungrab_buttons()?;
        self.grab_bindings()?;

        let focused = self.state.focused;
        let ids: Vec<Xid> = self.state.client_list();
        for id in ids {
            let color = if Some(id) == focused {
                self.config.border_active
            } else {
                self.config.border_unactive
            };
            self.x.set_border_color(id, color)?;
        }

        self.refit_monitor(self.state.current_index())?;
        ewmh::publish_workarea(&self.x, self.state.current_monitor())
    }
}

// Apply any configured position override for a monitor, preferring matches
// by output name and falling back to enumeration order.
fn positioned_rect(info: &MonitorInfo, ix: usize, config: &Config) -> Rect {
    let override_ = config.monitors.iter().enumerate().find_map(|(i, mc)| {
        match &mc.name {
            Some(name) => (name == &info.name).then_some(mc),
            None => (i == ix).then_some(mc),
        }
    });

    match override_ {
        Some(mc) => Rect {
            x: mc.x,
            y: mc.y,
            ..info.rect
        },
        None => info.rect,
    }
}

fn monitors_from(infos: &[MonitorInfo], config: &Config) -> Vec<Monitor> {
    infos
        .iter()
        .enumerate()
        .map(|(ix, info)| {
            Monitor::new(
                info.crtc,
                info.name.clone(),
                positioned_rect(info, ix, config),
                config.default_tiling,
            )
        })
        .collect()
}
