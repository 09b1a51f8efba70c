//! Keybinding data types and resolution from symbolic names to grabbable
//! key codes.
use crate::{config::Config, util::spawn_for_output, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{AsRefStr, EnumString};
use tracing::warn;

/// The Shift modifier bit in an X state mask.
pub const SHIFT_MASK: u16 = 1 << 0;
/// The Caps-Lock modifier bit in an X state mask.
pub const LOCK_MASK: u16 = 1 << 1;
/// Num-Lock is Mod2 on effectively every modern keymap.
pub const NUM_LOCK_MASK: u16 = 1 << 4;

/// The modifier key all window manager chords hang off.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModKey {
    Mod1,
    Mod2,
    Mod3,
    Mod4,
    Mod5,
}

impl Default for ModKey {
    fn default() -> Self {
        ModKey::Mod1
    }
}

impl ModKey {
    /// The X state mask bit for this modifier.
    pub fn mask(&self) -> u16 {
        match self {
            ModKey::Mod1 => 1 << 3,
            ModKey::Mod2 => 1 << 4,
            ModKey::Mod3 => 1 << 5,
            ModKey::Mod4 => 1 << 6,
            ModKey::Mod5 => 1 << 7,
        }
    }
}

/// A grabbable modifier mask + keycode pair.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct KeyCode {
    /// The held modifier mask
    pub mask: u16,
    /// The key code that was pressed
    pub code: u8,
}

impl KeyCode {
    /// A copy of this KeyCode with the given modifiers stripped from the
    /// mask; used to ignore Caps- and Num-Lock when matching bindings.
    pub fn ignoring_modifiers(&self, mask: u16) -> KeyCode {
        KeyCode {
            mask: self.mask & !mask,
            code: self.code,
        }
    }
}

/// The named actions a keybinding can invoke.
#[derive(
    AsRefStr, EnumString, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ToggleTiling,
    DetachTiling,
    ToggleFullscreen,
    Quit,
    ForceQuit,
    SwapWindowLeft,
    SwapWindowRight,
    FocusWindowLeft,
    FocusWindowRight,
    MoveXLeft,
    MoveXRight,
    MoveYUp,
    MoveYDown,
    ResizeXScaleUp,
    ResizeXScaleDown,
    ResizeYScaleUp,
    ResizeYScaleDown,
    NextLayout,
    IncreaseGap,
    DecreaseGap,
    ReloadConfig,
}

/// What a resolved binding does when its chord fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundAction {
    /// One of the named action roles
    Role(Action),
    /// Switch the current monitor to the given workspace
    SwitchTo(usize),
    /// Move the focused window to the given workspace, then switch to it
    MoveTo(usize),
}

/// A keybinding with its symbolic key resolved to a grabbable keycode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBind {
    pub code: KeyCode,
    /// Shell command spawned when the chord fires, before any role runs
    pub exec: Option<String>,
    pub action: Option<BoundAction>,
}

/// Symbolic key name -> keycode, as reported by the X server's current
/// keyboard mapping.
pub type CodeMap = HashMap<String, u8>;

/// Probe the current keyboard mapping via `xmodmap -pke`.
///
/// Lines look like `keycode 38 = a A a A`; every keysym name on a line maps
/// to that keycode, first occurrence winning.
pub fn keycodes_from_xmodmap() -> Result<CodeMap> {
    let output = spawn_for_output("xmodmap -pke")?;
    let mut map = HashMap::new();

    for line in output.lines() {
        let mut parts = line.split_whitespace();
        if let (Some("keycode"), Some(code), Some("=")) = (parts.next(), parts.next(), parts.next())
        {
            if let Ok(code) = code.parse::<u8>() {
                for name in parts {
                    map.entry(name.to_lowercase()).or_insert(code);
                }
            }
        }
    }

    Ok(map)
}

/// Resolve the configured keybindings plus the implicit workspace chords
/// (mod+1..9,0 to switch, with shift to move-then-switch).
///
/// Binds whose key name has no keycode in the current mapping are logged
/// and skipped rather than failing the whole set.
pub fn resolve_binds(config: &Config, codes: &CodeMap) -> Vec<ResolvedBind> {
    let modmask = config.mod_key.mask();
    let mut binds = Vec::with_capacity(config.keybinds.len() + 20);

    for kb in &config.keybinds {
        let code = match codes.get(&kb.key.to_lowercase()) {
            Some(&code) => code,
            None => {
                warn!(key = %kb.key, "no keycode for bound key: skipping");
                continue;
            }
        };
        let mask = if kb.shift {
            modmask | SHIFT_MASK
        } else {
            modmask
        };

        binds.push(ResolvedBind {
            code: KeyCode { mask, code },
            exec: kb.exec.clone(),
            action: kb.role.map(BoundAction::Role),
        });
    }

    for digit in 0..10u32 {
        let target = if digit == 0 { 9 } else { digit as usize - 1 };
        let code = match codes.get(&digit.to_string()) {
            Some(&code) => code,
            None => continue,
        };

        binds.push(ResolvedBind {
            code: KeyCode {
                mask: modmask,
                code,
            },
            exec: None,
            action: Some(BoundAction::SwitchTo(target)),
        });
        binds.push(ResolvedBind {
            code: KeyCode {
                mask: modmask | SHIFT_MASK,
                code,
            },
            exec: None,
            action: Some(BoundAction::MoveTo(target)),
        });
    }

    binds
}
