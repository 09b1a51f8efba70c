//! The action layer: the high level commands keybindings dispatch to.
use crate::{
    config::Config,
    core::{bindings::Action, drag::MIN_DRAG_SIZE, WindowManager},
    pure::layout::{project_resize, Axis},
    x::{ewmh, XConn},
    Result, Xid,
};
use tracing::{debug, info};

/// Step applied to the gap by the increase / decrease actions.
const GAP_STEP: i32 = 2;

// Which sequence neighbor an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    fn neighbor_of(&self, ix: usize, n: usize) -> usize {
        match self {
            Dir::Right => (ix + 1) % n,
            Dir::Left => (ix + n - 1) % n,
        }
    }
}

impl<X: XConn> WindowManager<X> {
    /// Run one of the named actions against the current state.
    pub fn run_action(&mut self, action: Action) -> Result<()> {
        debug!(action = action.as_ref(), "running action");

        match action {
            Action::ToggleTiling => self.toggle_tiling(),
            Action::DetachTiling => self.detach_tiling(),
            Action::ToggleFullscreen => self.toggle_fullscreen(),
            Action::Quit => self.quit_focused(),
            Action::ForceQuit => self.force_quit_focused(),
            Action::SwapWindowLeft => self.swap_focused(Dir::Left),
            Action::SwapWindowRight => self.swap_focused(Dir::Right),
            Action::FocusWindowLeft => self.focus_neighbor(Dir::Left),
            Action::FocusWindowRight => self.focus_neighbor(Dir::Right),
            Action::MoveXLeft => self.nudge_focused(-super::MOVE_STEP, 0),
            Action::MoveXRight => self.nudge_focused(super::MOVE_STEP, 0),
            Action::MoveYUp => self.nudge_focused(0, -super::MOVE_STEP),
            Action::MoveYDown => self.nudge_focused(0, super::MOVE_STEP),
            Action::ResizeXScaleUp => self.resize_focused(Axis::X, true),
            Action::ResizeXScaleDown => self.resize_focused(Axis::X, false),
            Action::ResizeYScaleUp => self.resize_focused(Axis::Y, true),
            Action::ResizeYScaleDown => self.resize_focused(Axis::Y, false),
            Action::NextLayout => self.next_layout(),
            Action::IncreaseGap => self.adjust_gap(GAP_STEP),
            Action::DecreaseGap => self.adjust_gap(-GAP_STEP),
            Action::ReloadConfig => self.reload_config(),
        }
    }

    /// Flip tiling for the current monitor, or for the current workspace
    /// alone when it has detached.
    pub fn toggle_tiling(&mut self) -> Result<()> {
        let mon_ix = self.state.current_index();
        let (detached, ws_tiling, mon_tiling) = {
            let mon = self.state.current_monitor();
            let ws = mon.active_workspace();
            (ws.detach_tiling, ws.tiling, mon.tiling)
        };

        let enable = if detached { !ws_tiling } else { !mon_tiling };
        if !detached {
            self.state.current_monitor_mut().tiling = enable;
        }

        if enable {
            self.enable_tiling(mon_ix)
        } else {
            self.disable_tiling(mon_ix)
        }
    }

    /// Toggle whether the current workspace follows its monitor's tiling
    /// state; rejoining re-synchronizes immediately.
    pub fn detach_tiling(&mut self) -> Result<()> {
        let mon_ix = self.state.current_index();
        let detached = {
            let ws = self.state.current_monitor_mut().active_workspace_mut();
            ws.detach_tiling = !ws.detach_tiling;
            ws.detach_tiling
        };
        debug!(detached, "workspace tiling detach toggled");

        if !detached {
            self.sync_workspace_tiling(mon_ix)?;
        }

        Ok(())
    }

    /// Toggle fullscreen for the focused window.
    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        let id = match self.state.focused {
            Some(id) => id,
            None => return Ok(()),
        };
        let fullscreen = self
            .state
            .client(id)
            .map(|c| c.fullscreen)
            .unwrap_or(false);

        self.set_fullscreen(id, !fullscreen)
    }

    /// Politely ask the focused window to close.
    pub fn quit_focused(&mut self) -> Result<()> {
        let id = match self.state.focused {
            Some(id) => id,
            None => return Ok(()),
        };

        if !ewmh::send_delete(&self.x, id)? {
            info!(%id, "window does not support WM_DELETE_WINDOW; use force-quit");
        }

        Ok(())
    }

    /// Destroy the focused window outright.
    pub fn force_quit_focused(&mut self) -> Result<()> {
        match self.state.focused {
            Some(id) => self.unframe(id),
            None => Ok(()),
        }
    }

    // Move the focused window one step through the sequence (cycling at
    // the ends) and follow it with the pointer.
    fn swap_focused(&mut self, dir: Dir) -> Result<()> {
        let id = match self.state.focused {
            Some(id) => id,
            None => return Ok(()),
        };
        let mon_ix = self.state.current_index();

        {
            let ws = self.state.current_monitor_mut().active_workspace_mut();
            let n = ws.len();
            let ix = match ws.position_of(id) {
                Some(ix) if n > 1 => ix,
                _ => return Ok(()),
            };
            ws.move_window(ix, dir.neighbor_of(ix, n));
        }

        self.refit_monitor(mon_ix)?;
        self.warp_to(id)
    }

    // Warp the pointer to the neighboring window; the resulting enter event
    // moves focus.
    fn focus_neighbor(&mut self, dir: Dir) -> Result<()> {
        let id = match self.state.focused {
            Some(id) => id,
            None => return Ok(()),
        };

        let target = {
            let ws = self.state.current_monitor().active_workspace();
            let n = ws.len();
            match ws.position_of(id) {
                Some(ix) if n > 1 => ws.windows()[dir.neighbor_of(ix, n)],
                _ => return Ok(()),
            }
        };

        self.warp_to(target)
    }

    // Keyboard driven move of the focused window; floating only.
    fn nudge_focused(&mut self, dx: i32, dy: i32) -> Result<()> {
        if self.state.current_monitor().active_workspace().tiling {
            return Ok(());
        }
        let id = match self.state.focused {
            Some(id) => id,
            None => return Ok(()),
        };

        let rect = match self.state.client_mut(id) {
            Some(c) => {
                c.rect = c.rect.translated(dx, dy);
                c.rect
            }
            None => return Ok(()),
        };

        self.x.position_client(id, rect)
    }

    // Resize the focused window: directly when floating, through the slot
    // projection when tiling.
    fn resize_focused(&mut self, axis: Axis, up: bool) -> Result<()> {
        let id = match self.state.focused {
            Some(id) => id,
            None => return Ok(()),
        };
        let amount = self.config.resize_amount as i32;
        let delta = if up { amount } else { -amount };
        let mon_ix = self.state.current_index();

        if !self.state.current_monitor().active_workspace().tiling {
            let (dw, dh) = match axis {
                Axis::X => (delta, 0),
                Axis::Y => (0, delta),
            };
            let rect = match self.state.client_mut(id) {
                Some(c) => {
                    c.rect = c.rect.resized_clamped(dw, dh, MIN_DRAG_SIZE);
                    c.rect
                }
                None => return Ok(()),
            };

            return self.x.position_client(id, rect);
        }

        let slots = match self.current_slots(mon_ix) {
            Some(slots) => slots,
            None => return Ok(()),
        };
        let (ts, focused_ix) = {
            let mon = self.state.current_monitor();
            match mon.active_workspace().position_of(id) {
                Some(ix) => (mon.tiling_space, ix),
                None => return Ok(()),
            }
        };

        match project_resize(&slots, focused_ix, axis, delta, &ts) {
            Some(projected) => {
                self.state
                    .current_monitor_mut()
                    .active_workspace_mut()
                    .set_resized_layout(projected);
                self.refit_monitor(mon_ix)
            }
            None => {
                debug!("resize projection rejected: no change");
                Ok(())
            }
        }
    }

    /// Advance the current workspace to its next layout, dropping any user
    /// resize.
    pub fn next_layout(&mut self) -> Result<()> {
        let mon_ix = self.state.current_index();
        let n = self.state.current_monitor().active_workspace().len();
        let count = self.layouts.len_for(n);
        if count == 0 {
            return Ok(());
        }

        {
            let ws = self.state.current_monitor_mut().active_workspace_mut();
            ws.layout_index = (ws.layout_index + 1) % count;
            ws.clear_resized();
        }

        self.refit_monitor(mon_ix)
    }

    // Grow or shrink the inter-window gap, clamped at zero.
    fn adjust_gap(&mut self, delta: i32) -> Result<()> {
        self.config.gap = (self.config.gap as i32 + delta).max(0) as u32;
        debug!(gap = self.config.gap, "gap adjusted");

        self.refit_monitor(self.state.current_index())
    }

    /// Re-read the config file and apply it to the running manager.
    pub fn reload_config(&mut self) -> Result<()> {
        info!("reloading config");
        self.apply_config(Config::load())
    }

    // Warp the pointer into the middle of the given window.
    fn warp_to(&mut self, id: Xid) -> Result<()> {
        let mon_ix = self.state.current_index();

        let rect = if self.state.current_monitor().active_workspace().tiling {
            self.tiled_rect_of(mon_ix, id)
        } else {
            None
        };
        let rect = match rect.or_else(|| self.state.client(id).map(|c| c.rect)) {
            Some(r) => r,
            None => return Ok(()),
        };

        self.x
            .warp_pointer(id, (rect.w / 2) as i16, (rect.h / 2) as i16)
    }
}
