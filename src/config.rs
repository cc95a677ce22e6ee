use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::position::{Side, DEFAULT_PRECEDENCE};
use crate::step::{PositionHint, ProgrammaticStep};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tour: TourOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// The recognized tour option set.
///
/// Every field has a default so a tour runs with an empty configuration;
/// [`TourOptions::set_option`] applies dynamic overrides by name with the
/// same silent-fallback validation the annotation scan uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourOptions {
    /// Extra style class applied to tooltip boxes.
    #[serde(default)]
    pub tooltip_style: String,
    /// Extra style class applied to the highlight frame.
    #[serde(default)]
    pub highlight_style: String,
    /// Default tooltip placement for steps that do not declare one.
    #[serde(default)]
    pub tooltip_position: PositionHint,
    /// Elimination order for automatic placement.
    #[serde(default = "default_position_precedence")]
    pub position_precedence: Vec<Side>,
    #[serde(default = "default_overlay_opacity")]
    pub overlay_opacity: f64,
    #[serde(default = "default_true")]
    pub show_bullets: bool,
    #[serde(default = "default_true")]
    pub show_progress: bool,
    #[serde(default = "default_next_label")]
    pub next_label: String,
    #[serde(default = "default_prev_label")]
    pub prev_label: String,
    #[serde(default = "default_skip_label")]
    pub skip_label: String,
    #[serde(default = "default_done_label")]
    pub done_label: String,
    #[serde(default = "default_true")]
    pub show_step_numbers: bool,
    #[serde(default = "default_true")]
    pub show_buttons: bool,
    /// Glyph shown on a badge with no text.
    #[serde(default = "default_badge_glyph")]
    pub default_badge_glyph: String,
    /// Tooltip text substituted for badge-kind steps during a tour.
    #[serde(default = "default_badge_text")]
    pub default_badge_text: String,
    /// Seconds before a badge auto-dismisses; zero or less stays until a
    /// key press or click.
    #[serde(default)]
    pub default_badge_duration: i64,
    /// Seconds before autoplay advances a step that declares no duration;
    /// -1 waits for manual input.
    #[serde(default = "default_step_duration")]
    pub default_step_duration: i64,
    #[serde(default)]
    pub auto_play: bool,
    /// Skip the document annotation scan entirely.
    #[serde(default)]
    pub ignore_annotations: bool,
    /// The programmatic step list.
    #[serde(default)]
    pub steps: Vec<ProgrammaticStep>,
}

fn default_position_precedence() -> Vec<Side> {
    DEFAULT_PRECEDENCE.to_vec()
}

fn default_overlay_opacity() -> f64 {
    0.8
}

fn default_true() -> bool {
    true
}

fn default_next_label() -> String {
    "Next".to_string()
}

fn default_prev_label() -> String {
    "Previous".to_string()
}

fn default_skip_label() -> String {
    "Skip".to_string()
}

fn default_done_label() -> String {
    "Done".to_string()
}

fn default_badge_glyph() -> String {
    "\u{2798}".to_string()
}

fn default_badge_text() -> String {
    "Note this!".to_string()
}

fn default_step_duration() -> i64 {
    -1
}

impl Default for TourOptions {
    fn default() -> Self {
        Self {
            tooltip_style: String::new(),
            highlight_style: String::new(),
            tooltip_position: PositionHint::Auto,
            position_precedence: default_position_precedence(),
            overlay_opacity: default_overlay_opacity(),
            show_bullets: true,
            show_progress: true,
            next_label: default_next_label(),
            prev_label: default_prev_label(),
            skip_label: default_skip_label(),
            done_label: default_done_label(),
            show_step_numbers: true,
            show_buttons: true,
            default_badge_glyph: default_badge_glyph(),
            default_badge_text: default_badge_text(),
            default_badge_duration: 0,
            default_step_duration: default_step_duration(),
            auto_play: false,
            ignore_annotations: false,
            steps: Vec::new(),
        }
    }
}

impl TourOptions {
    /// Defaults the annotation scan substitutes for absent/invalid values.
    pub fn scan_defaults(&self) -> crate::document::ScanDefaults {
        crate::document::ScanDefaults {
            kind: crate::step::StepKind::Badge,
            duration_secs: self.default_step_duration,
            position: self.tooltip_position,
        }
    }

    /// Apply one option by name. A value failing its type/enum check is
    /// silently replaced by the option's default; unrecognized names are
    /// ignored. Never errors to the caller.
    pub fn set_option(&mut self, name: &str, value: serde_json::Value) {
        let defaults = TourOptions::default();
        match name {
            "tooltip_style" => {
                self.tooltip_style = string_or(value, defaults.tooltip_style);
            }
            "highlight_style" => {
                self.highlight_style = string_or(value, defaults.highlight_style);
            }
            "tooltip_position" => {
                self.tooltip_position = value
                    .as_str()
                    .and_then(PositionHint::parse)
                    .unwrap_or(defaults.tooltip_position);
            }
            "position_precedence" => {
                self.position_precedence =
                    parse_precedence(&value).unwrap_or(defaults.position_precedence);
            }
            "overlay_opacity" => {
                self.overlay_opacity = value
                    .as_f64()
                    .filter(|o| (0.0..=1.0).contains(o))
                    .unwrap_or(defaults.overlay_opacity);
            }
            "show_bullets" => self.show_bullets = value.as_bool().unwrap_or(defaults.show_bullets),
            "show_progress" => {
                self.show_progress = value.as_bool().unwrap_or(defaults.show_progress);
            }
            "next_label" => self.next_label = string_or(value, defaults.next_label),
            "prev_label" => self.prev_label = string_or(value, defaults.prev_label),
            "skip_label" => self.skip_label = string_or(value, defaults.skip_label),
            "done_label" => self.done_label = string_or(value, defaults.done_label),
            "show_step_numbers" => {
                self.show_step_numbers = value.as_bool().unwrap_or(defaults.show_step_numbers);
            }
            "show_buttons" => self.show_buttons = value.as_bool().unwrap_or(defaults.show_buttons),
            "default_badge_glyph" => {
                self.default_badge_glyph = string_or(value, defaults.default_badge_glyph);
            }
            "default_badge_text" => {
                self.default_badge_text = string_or(value, defaults.default_badge_text);
            }
            "default_badge_duration" => {
                self.default_badge_duration =
                    value.as_i64().unwrap_or(defaults.default_badge_duration);
            }
            "default_step_duration" => {
                self.default_step_duration =
                    value.as_i64().unwrap_or(defaults.default_step_duration);
            }
            "auto_play" => self.auto_play = value.as_bool().unwrap_or(defaults.auto_play),
            "ignore_annotations" => {
                self.ignore_annotations = value.as_bool().unwrap_or(defaults.ignore_annotations);
            }
            "steps" => {
                self.steps = serde_json::from_value(value).unwrap_or(defaults.steps);
            }
            other => {
                tracing::debug!(option = other, "ignoring unrecognized option");
            }
        }
    }

    /// Apply a batch of options. A `BTreeMap` keeps application order
    /// deterministic.
    pub fn set_options(&mut self, options: BTreeMap<String, serde_json::Value>) {
        for (name, value) in options {
            self.set_option(&name, value);
        }
    }
}

fn string_or(value: serde_json::Value, default: String) -> String {
    match value {
        serde_json::Value::String(s) => s,
        _ => default,
    }
}

fn parse_precedence(value: &serde_json::Value) -> Option<Vec<Side>> {
    let entries = value.as_array()?;
    let mut sides = Vec::with_capacity(entries.len());
    for entry in entries {
        sides.push(Side::parse(entry.as_str()?)?);
    }
    Some(sides)
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

/// Demo host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
}

fn default_tick_rate() -> u64 {
    100
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Config {
    /// Path to the project-local config file.
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("cicerone.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the tour runs without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // Project config in the working directory (primary config location)
        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/cicerone/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("cicerone").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with CICERONE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("CICERONE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to cicerone.toml
    pub fn save(&self) -> Result<()> {
        let config_path = Self::project_config_path();

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(&config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to the logs directory
    pub fn logs_path(&self) -> PathBuf {
        PathBuf::from(".cicerone").join("logs")
    }
}
