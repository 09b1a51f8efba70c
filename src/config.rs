//! User facing configuration.
//!
//! The schema below is read from `$HOME/.config/escher/escher.toml`. A
//! missing file is not an error (the defaults apply to every field) and a
//! file that fails to parse is reported via `notify-send` and otherwise
//! ignored. Unrecognized keys are skipped.
use crate::{
    core::bindings::{Action, ModKey},
    pure::layout::{LayoutSlot, LayoutTable, SlotLayout},
    util, Result,
};
use serde::Deserialize;
use std::{env, fs, path::PathBuf};
use tracing::{info, warn};

/// The main user facing configuration.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Pixels carved out of every slot edge between tiled windows
    pub gap: u32,
    /// Pixels reserved around the whole tiling space
    pub outer_gap: u32,
    /// Step in pixels for keyboard driven resizes
    pub resize_amount: u32,
    /// Window border width in pixels
    pub border_width: u32,
    /// The modifier all chords hang off
    pub mod_key: ModKey,
    /// Border color of the focused window
    pub border_active: u32,
    /// Border color of unfocused windows
    pub border_unactive: u32,
    /// Whether monitors start out tiling
    pub default_tiling: bool,
    /// Whether fullscreen requests from clients are honored automatically
    pub auto_fullscreen: bool,
    /// Positional overrides for monitors, keyed by output name when given
    pub monitors: Vec<MonitorConfig>,
    /// User keybindings
    pub keybinds: Vec<Keybind>,
    /// Layout catalog overrides, keyed by window count
    pub layouts: Vec<LayoutConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gap: 6,
            outer_gap: 0,
            resize_amount: 20,
            border_width: 3,
            mod_key: ModKey::Mod1,
            border_active: 0xa6da95,
            border_unactive: 0x8bd5ca,
            default_tiling: false,
            auto_fullscreen: false,
            monitors: Vec::new(),
            keybinds: Vec::new(),
            layouts: Vec::new(),
        }
    }
}

/// One keybinding: a symbolic key, an optional shell command and an
/// optional action role. A bind may carry both; exec runs first.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Keybind {
    pub key: String,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub exec: Option<String>,
    #[serde(default)]
    pub role: Option<Action>,
}

/// An (x, y) override for a monitor's position in root space.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// RandR output name; nameless entries apply by enumeration order
    #[serde(default)]
    pub name: Option<String>,
    pub x: i32,
    pub y: i32,
}

/// The layout options for one window count.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub windows: usize,
    pub options: Vec<LayoutOption>,
}

/// One layout: a slot per window.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LayoutOption {
    pub slots: Vec<SlotConfig>,
}

/// One percentage slot; values are clamped into [0, 1] on conversion.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SlotConfig {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Config {
    /// Where the config file is expected to live.
    pub fn path() -> Option<PathBuf> {
        env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("escher")
                .join("escher.toml")
        })
    }

    /// Where the autostart script is expected to live.
    pub fn autostart_path() -> Option<PathBuf> {
        env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("escher")
                .join("autostart.sh")
        })
    }

    /// Load the config file if it exists and parses.
    ///
    /// Returns Ok(None) when no file is present; a file that fails to read
    /// or parse is an Err for the caller to log and fall back from.
    pub fn try_load() -> Result<Option<Config>> {
        let path = match Self::path() {
            Some(p) if p.exists() => p,
            _ => return Ok(None),
        };

        let raw = fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;

        Ok(Some(config))
    }

    /// Load the user config, falling back to the defaults and notifying on
    /// a broken file.
    pub fn load() -> Config {
        match Self::try_load() {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!("no config file found: using defaults");
                Config::default()
            }
            Err(e) => {
                warn!(%e, "unable to load config file: using defaults");
                let _ = util::notify(&format!("config error: {e}"));
                Config::default()
            }
        }
    }

    /// The layout catalog: built-in entries with the user's overrides
    /// applied on top.
    pub fn layout_table(&self) -> LayoutTable {
        let mut table = LayoutTable::default();

        for lc in &self.layouts {
            let layouts = lc
                .options
                .iter()
                .map(|opt| {
                    SlotLayout::new(
                        opt.slots
                            .iter()
                            .map(|s| {
                                LayoutSlot::new(
                                    s.x.clamp(0.0, 1.0),
                                    s.y.clamp(0.0, 1.0),
                                    s.w.clamp(0.0, 1.0),
                                    s.h.clamp(0.0, 1.0),
                                )
                            })
                            .collect(),
                    )
                })
                .collect();

            table.set(lc.windows, layouts);
        }

        table
    }
}
