//! The state store: every managed window lives in exactly one place.
//!
//! Ownership is deliberately flat: [WindowSet] holds the single id -> record
//! map and workspaces hold plain id sequences into it. Monitors address
//! their workspaces by index. Nothing in here talks to the X server.
use crate::{
    pure::geometry::{Point, Rect},
    Xid,
};
use std::collections::HashMap;

/// Workspaces available on every monitor.
pub const WORKSPACE_COUNT: usize = 10;

/// The record kept for a managed top level window.
///
/// `rect` is the window's floating geometry: while a workspace is tiling,
/// placement is recomputed from the layout engine and this field keeps the
/// rectangle to restore when tiling is disabled or fullscreen exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Client {
    pub(crate) id: Xid,
    pub rect: Rect,
    pub fullscreen: bool,
}

impl Client {
    pub(crate) fn new(id: Xid, rect: Rect) -> Self {
        Self {
            id,
            rect,
            fullscreen: false,
        }
    }

    pub fn id(&self) -> Xid {
        self.id
    }
}

/// One virtual workspace: an ordered window sequence plus its tiling state.
///
/// The sequence order is both the tiling order and the focus cycle order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Workspace {
    windows: Vec<Xid>,
    pub tiling: bool,
    pub layout_index: usize,
    pub detach_tiling: bool,
    pub resized: bool,
    pub resized_layout: Vec<Rect>,
}

impl Workspace {
    pub fn windows(&self) -> &[Xid] {
        &self.windows
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn contains(&self, id: Xid) -> bool {
        self.windows.contains(&id)
    }

    pub fn position_of(&self, id: Xid) -> Option<usize> {
        self.windows.iter().position(|&w| w == id)
    }

    pub(crate) fn push(&mut self, id: Xid) {
        self.windows.push(id);
        self.sync_resized();
    }

    pub(crate) fn remove(&mut self, id: Xid) -> bool {
        match self.position_of(id) {
            Some(ix) => {
                self.windows.remove(ix);
                self.sync_resized();
                true
            }
            None => false,
        }
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.windows.swap(a, b);
    }

    // Move one window to a new sequence position, shifting the windows in
    // between. At the wrap points this cycles rather than exchanges, so n
    // repeated moves walk a window all the way around the sequence.
    pub(crate) fn move_window(&mut self, from: usize, to: usize) {
        if from < self.windows.len() && to < self.windows.len() {
            let id = self.windows.remove(from);
            self.windows.insert(to, id);
        }
    }

    /// Record a user resize projection for the current window population.
    pub(crate) fn set_resized_layout(&mut self, slots: Vec<Rect>) {
        self.resized = slots.len() == self.windows.len();
        self.resized_layout = if self.resized { slots } else { Vec::new() };
    }

    pub(crate) fn clear_resized(&mut self) {
        self.resized = false;
        self.resized_layout.clear();
    }

    // A resized layout is only meaningful for the exact window population it
    // was projected from: discard it whenever the count diverges.
    fn sync_resized(&mut self) {
        if self.resized && self.resized_layout.len() != self.windows.len() {
            self.clear_resized();
        }
    }
}

/// A physical output as reported by RandR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub rect: Rect,
    pub crtc: u32,
    pub name: String,
    /// Usable area after subtracting struts and the outer gap, refreshed on
    /// every reflow.
    pub tiling_space: Rect,
    /// Monitor wide tiling state, adopted by workspaces that do not detach.
    pub tiling: bool,
    workspaces: Vec<Workspace>,
    active: usize,
}

impl Monitor {
    pub fn new(crtc: u32, name: impl Into<String>, rect: Rect, tiling: bool) -> Self {
        let workspaces = (0..WORKSPACE_COUNT)
            .map(|_| Workspace {
                tiling,
                ..Workspace::default()
            })
            .collect();

        Self {
            rect,
            crtc,
            name: name.into(),
            tiling_space: rect,
            tiling,
            workspaces,
            active: 0,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub(crate) fn set_active(&mut self, ix: usize) {
        if ix < self.workspaces.len() {
            self.active = ix;
        }
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspace(&self, ix: usize) -> Option<&Workspace> {
        self.workspaces.get(ix)
    }

    pub(crate) fn workspace_mut(&mut self, ix: usize) -> Option<&mut Workspace> {
        self.workspaces.get_mut(ix)
    }

    pub fn active_workspace(&self) -> &Workspace {
        &self.workspaces[self.active]
    }

    pub(crate) fn active_workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspaces[self.active]
    }

    /// Index of the highest workspace holding at least one window.
    pub fn highest_occupied_index(&self) -> Option<usize> {
        self.workspaces
            .iter()
            .enumerate()
            .filter(|(_, w)| !w.is_empty())
            .map(|(ix, _)| ix)
            .last()
    }
}

/// All window manager state: monitors, workspaces and the owning client map.
///
/// Every mutation of the managed window population goes through here so the
/// structural invariants (one record per id, one workspace per record) hold
/// by construction.
#[derive(Debug, Default, Clone)]
pub struct WindowSet {
    clients: HashMap<Xid, Client>,
    monitors: Vec<Monitor>,
    current: usize,
    /// The window that last received pointer enter focus, if any.
    pub focused: Option<Xid>,
}

impl WindowSet {
    pub fn new(monitors: Vec<Monitor>) -> Self {
        Self {
            clients: HashMap::new(),
            monitors,
            current: 0,
            focused: None,
        }
    }

    pub fn contains(&self, id: Xid) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn client(&self, id: Xid) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub(crate) fn client_mut(&mut self, id: Xid) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Admit a window to the current monitor's active workspace.
    ///
    /// A second insert for a known id is a no-op.
    pub fn insert(&mut self, id: Xid, rect: Rect) {
        if self.contains(id) || self.monitors.is_empty() {
            return;
        }

        self.clients.insert(id, Client::new(id, rect));
        self.monitors[self.current].active_workspace_mut().push(id);
    }

    /// Drop a window from the store and from whichever workspace holds it.
    pub fn remove(&mut self, id: Xid) -> Option<Client> {
        let client = self.clients.remove(&id)?;

        if let Some((m, w)) = self.find(id) {
            self.monitors[m].workspaces[w].remove(id);
        }
        if self.focused == Some(id) {
            self.focused = None;
        }

        Some(client)
    }

    /// Locate a window's (monitor, workspace) indices by scanning all
    /// workspaces; windows parked on non-visible workspaces are still found.
    pub fn find(&self, id: Xid) -> Option<(usize, usize)> {
        self.monitors.iter().enumerate().find_map(|(m, mon)| {
            mon.workspaces
                .iter()
                .position(|ws| ws.contains(id))
                .map(|w| (m, w))
        })
    }

    /// Detach a window from its current workspace and append it to the
    /// destination monitor's active workspace. Geometry is the caller's
    /// responsibility.
    pub(crate) fn transfer(&mut self, id: Xid, dst_mon: usize) {
        if !self.contains(id) || dst_mon >= self.monitors.len() {
            return;
        }

        if let Some((m, w)) = self.find(id) {
            self.monitors[m].workspaces[w].remove(id);
        }
        self.monitors[dst_mon].active_workspace_mut().push(id);
    }

    /// Move a window to another workspace of the monitor currently holding
    /// it.
    pub(crate) fn move_to_workspace(&mut self, id: Xid, ws_ix: usize) {
        if ws_ix >= WORKSPACE_COUNT {
            return;
        }

        if let Some((m, w)) = self.find(id) {
            if w != ws_ix {
                self.monitors[m].workspaces[w].remove(id);
                self.monitors[m].workspaces[ws_ix].push(id);
            }
        }
    }

    /// Install a freshly enumerated monitor list, re-homing any windows
    /// whose monitor vanished onto the first remaining one.
    pub(crate) fn replace_monitors(&mut self, monitors: Vec<Monitor>) {
        if monitors.is_empty() {
            return;
        }

        let orphans: Vec<Xid> = self
            .monitors
            .iter()
            .filter(|old| !monitors.iter().any(|m| m.crtc == old.crtc))
            .flat_map(|old| old.workspaces.iter())
            .flat_map(|ws| ws.windows.iter().copied())
            .collect();

        self.monitors = monitors;
        if self.current >= self.monitors.len() {
            self.current = 0;
        }

        for id in orphans {
            self.monitors[0].active_workspace_mut().push(id);
        }
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub(crate) fn monitors_mut(&mut self) -> &mut Vec<Monitor> {
        &mut self.monitors
    }

    pub fn monitor(&self, ix: usize) -> Option<&Monitor> {
        self.monitors.get(ix)
    }

    pub(crate) fn monitor_mut(&mut self, ix: usize) -> Option<&mut Monitor> {
        self.monitors.get_mut(ix)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub(crate) fn set_current(&mut self, ix: usize) {
        if ix < self.monitors.len() {
            self.current = ix;
        }
    }

    pub fn current_monitor(&self) -> &Monitor {
        &self.monitors[self.current]
    }

    pub(crate) fn current_monitor_mut(&mut self) -> &mut Monitor {
        &mut self.monitors[self.current]
    }

    /// The monitor under the given root coordinate, if any.
    pub fn monitor_containing(&self, p: Point) -> Option<usize> {
        self.monitors.iter().position(|m| m.rect.contains_point(p))
    }

    /// All managed ids on the current monitor in workspace-then-sequence
    /// order: the value published as `_NET_CLIENT_LIST`.
    pub fn client_list(&self) -> Vec<Xid> {
        self.current_monitor()
            .workspaces
            .iter()
            .flat_map(|ws| ws.windows.iter().copied())
            .collect()
    }

    /// The desktop count published as `_NET_NUMBER_OF_DESKTOPS`.
    pub fn desktop_count(&self) -> u32 {
        let mon = self.current_monitor();
        let highest = mon.highest_occupied_index().map(|ix| ix + 1).unwrap_or(0);

        (mon.active_index() + 1).max(highest) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    fn two_monitor_set() -> WindowSet {
        WindowSet::new(vec![
            Monitor::new(1, "DP-1", Rect::new(0, 0, 1920, 1080), false),
            Monitor::new(2, "DP-2", Rect::new(1920, 0, 1920, 1080), false),
        ])
    }

    #[test]
    fn insert_is_idempotent() {
        let mut s = two_monitor_set();

        s.insert(Xid(10), Rect::new(0, 0, 800, 600));
        s.insert(Xid(10), Rect::new(5, 5, 100, 100));

        assert_eq!(s.len(), 1);
        assert_eq!(s.client(Xid(10)).unwrap().rect, Rect::new(0, 0, 800, 600));
        assert_eq!(s.current_monitor().active_workspace().len(), 1);
    }

    #[test]
    fn every_window_lives_in_exactly_one_workspace() {
        let mut s = two_monitor_set();
        for id in 1..=5u32 {
            s.insert(Xid(id), Rect::new(0, 0, 100, 100));
        }
        s.transfer(Xid(3), 1);
        s.move_to_workspace(Xid(4), 7);

        for id in 1..=5u32 {
            let holders: usize = s
                .monitors()
                .iter()
                .flat_map(|m| m.workspaces())
                .filter(|ws| ws.contains(Xid(id)))
                .count();

            assert_eq!(holders, 1, "window {id}");
        }
    }

    #[test]
    fn remove_clears_workspace_and_focus() {
        let mut s = two_monitor_set();
        s.insert(Xid(7), Rect::new(0, 0, 100, 100));
        s.focused = Some(Xid(7));

        let removed = s.remove(Xid(7));

        assert!(removed.is_some());
        assert_eq!(s.focused, None);
        assert_eq!(s.find(Xid(7)), None);
        assert!(s.current_monitor().active_workspace().is_empty());
    }

    #[test]
    fn find_searches_all_monitors_and_workspaces() {
        let mut s = two_monitor_set();
        s.insert(Xid(1), Rect::new(0, 0, 100, 100));
        s.move_to_workspace(Xid(1), 4);
        s.set_current(1);
        s.insert(Xid(2), Rect::new(0, 0, 100, 100));

        assert_eq!(s.find(Xid(1)), Some((0, 4)));
        assert_eq!(s.find(Xid(2)), Some((1, 0)));
        assert_eq!(s.find(Xid(99)), None);
    }

    #[test]
    fn transfer_appends_to_destination_active_workspace() {
        let mut s = two_monitor_set();
        s.insert(Xid(1), Rect::new(0, 0, 100, 100));
        s.monitor_mut(1).unwrap().set_active(3);

        s.transfer(Xid(1), 1);

        assert_eq!(s.find(Xid(1)), Some((1, 3)));
    }

    #[test]
    fn population_change_discards_a_stale_resized_layout() {
        let mut s = two_monitor_set();
        s.insert(Xid(1), Rect::new(0, 0, 100, 100));
        s.insert(Xid(2), Rect::new(0, 0, 100, 100));

        let ws = s.current_monitor_mut().active_workspace_mut();
        ws.set_resized_layout(vec![Rect::new(0, 0, 900, 1074), Rect::new(900, 0, 1014, 1074)]);
        assert!(ws.resized);

        s.insert(Xid(3), Rect::new(0, 0, 100, 100));

        let ws = s.current_monitor().active_workspace();
        assert!(!ws.resized);
        assert!(ws.resized_layout.is_empty());
    }

    #[test]
    fn resized_layout_of_wrong_arity_is_not_recorded() {
        let mut s = two_monitor_set();
        s.insert(Xid(1), Rect::new(0, 0, 100, 100));

        let ws = s.current_monitor_mut().active_workspace_mut();
        ws.set_resized_layout(vec![Rect::default(), Rect::default()]);

        assert!(!ws.resized);
        assert!(ws.resized_layout.is_empty());
    }

    #[test_case(Point::new(100, 100), Some(0); "first monitor")]
    #[test_case(Point::new(2100, 200), Some(1); "second monitor")]
    #[test_case(Point::new(4000, 0), None; "outside all monitors")]
    #[test]
    fn monitor_containing(p: Point, expected: Option<usize>) {
        assert_eq!(two_monitor_set().monitor_containing(p), expected);
    }

    #[test]
    fn client_list_is_workspace_then_sequence_ordered() {
        let mut s = two_monitor_set();
        s.insert(Xid(1), Rect::default());
        s.insert(Xid(2), Rect::default());
        s.move_to_workspace(Xid(1), 2);
        s.insert(Xid(3), Rect::default());

        assert_eq!(s.client_list(), vec![Xid(2), Xid(3), Xid(1)]);
    }

    #[test]
    fn desktop_count_tracks_active_and_occupied() {
        let mut s = two_monitor_set();
        assert_eq!(s.desktop_count(), 1);

        s.insert(Xid(1), Rect::default());
        s.move_to_workspace(Xid(1), 5);
        assert_eq!(s.desktop_count(), 6);

        s.current_monitor_mut().set_active(8);
        assert_eq!(s.desktop_count(), 9);
    }

    #[test]
    fn active_workspace_pointer_stays_in_bounds() {
        let mut s = two_monitor_set();

        s.current_monitor_mut().set_active(42);

        assert_eq!(s.current_monitor().active_index(), 0);
        // the accessor would panic if the pointer escaped the array
        let _ = s.current_monitor().active_workspace();
    }
}
