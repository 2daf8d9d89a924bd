use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use cross_xdg::BaseDirs;
use nu_ansi_term::{Color, Style};
use serde::Deserialize;
use tracing::warn;

use crate::engine::EngineConfig;
use crate::tape::{Cell, CellMode};

/// Styles for the debug trace table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceColors {
    pub header: Style,
    pub symbol: Style,
    pub cell: Style,
}

impl Default for TraceColors {
    fn default() -> Self {
        // Catppuccin Mocha accents
        Self {
            header: Color::Rgb(137, 180, 250).bold(),
            symbol: Style::new().fg(Color::Rgb(249, 226, 175)),
            cell: Style::new().fg(Color::Rgb(166, 227, 161)),
        }
    }
}

/// User defaults read from `bf.toml`. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub nested_loops: bool,
    pub eof: Cell,
    pub cell_mode: CellMode,
    pub trace_delay: Duration,
    pub colors: TraceColors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nested_loops: true,
            eof: 0,
            cell_mode: CellMode::Unbounded,
            trace_delay: Duration::from_millis(10),
            colors: TraceColors::default(),
        }
    }
}

/// On-disk shape of `bf.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    engine: EngineSection,
    colors: ColorSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngineSection {
    nested_loops: Option<bool>,
    eof: Option<Cell>,
    cell_mode: Option<String>,
    trace_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ColorSection {
    trace_header: Option<String>,
    trace_symbol: Option<String>,
    trace_cell: Option<String>,
}

impl Settings {
    /// Load `bf.toml` from the XDG config home, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match Self::parse(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), "ignoring settings file: {e}");
                Self::default()
            }
        }
    }

    /// Parse settings text. Unknown keys are ignored; a cell mode or colour
    /// that is not recognised keeps its default.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let file: FileSettings = toml::from_str(content)?;
        let mut cfg = Settings::default();

        let engine = file.engine;
        if let Some(v) = engine.nested_loops {
            cfg.nested_loops = v;
        }
        if let Some(v) = engine.eof {
            cfg.eof = v;
        }
        if let Some(raw) = engine.cell_mode {
            match parse_cell_mode(&raw) {
                Some(mode) => cfg.cell_mode = mode,
                None => warn!("unknown cell_mode {raw:?}"),
            }
        }
        if let Some(v) = engine.trace_delay_ms {
            cfg.trace_delay = Duration::from_millis(v);
        }

        let colors = file.colors;
        macro_rules! set {
            ($field:ident, $value:expr) => {
                if let Some(raw) = $value {
                    match parse_color(&raw) {
                        Some(c) => cfg.colors.$field = Style::new().fg(c),
                        None => warn!("unknown colour {raw:?}"),
                    }
                }
            };
        }

        set!(header, colors.trace_header);
        set!(symbol, colors.trace_symbol);
        set!(cell, colors.trace_cell);

        Ok(cfg)
    }

    pub fn engine_config(&self, debug: bool) -> EngineConfig {
        EngineConfig {
            nested_loops: self.nested_loops,
            eof_sentinel: self.eof,
            debug,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

/// Boolean words accepted by `--nested-loops` and `--debug`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "y" | "yes" | "1" | "on" => Some(true),
        "false" | "n" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn parse_cell_mode(value: &str) -> Option<CellMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "unbounded" => Some(CellMode::Unbounded),
        "wrapping" | "byte" => Some(CellMode::Wrapping),
        _ => None,
    }
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        return None;
    }

    let name = s.to_ascii_lowercase();
    Some(match name.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" | "purple" => Color::Purple,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "darkgray" | "dark_gray" => Color::DarkGray,
        "lightred" | "light_red" => Color::LightRed,
        "lightgreen" | "light_green" => Color::LightGreen,
        "lightblue" | "light_blue" => Color::LightBlue,
        "lightmagenta" | "light_magenta" => Color::LightPurple,
        "lightcyan" | "light_cyan" => Color::LightCyan,
        _ => return None,
    })
}
