use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hook::OutputFormat;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Where the user overlay is looked up when no `--config` is given.
pub const DEFAULT_OVERLAY_PATH: &str = "~/.config/infra-guard/config.toml";

const DEFAULT_LOG_PATH: &str = "~/.local/share/infra-guard/decisions.log";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Tool names whose `command` input is routed to the guard.
    #[serde(default)]
    pub guarded_tools: Vec<String>,
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Decision log file. A leading `~` is expanded.
    #[serde(default = "default_log_path")]
    pub path: String,
    /// A `log::LevelFilter` name. `off` disables the log; levels below `info`
    /// are raised to `info` so every decision is still recorded.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_log_path(),
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    DEFAULT_LOG_PATH.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One `[[rules]]` entry, uncompiled.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RuleConfig {
    pub name: String,
    pub patterns: Vec<String>,
    pub reason: String,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
    #[serde(default)]
    ruleset: RulesetOverlay,
    #[serde(default)]
    rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    guarded_tools: Vec<String>,
    #[serde(default)]
    remove_guarded_tools: Vec<String>,
    output_format: Option<OutputFormat>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    enabled: Option<bool>,
    path: Option<String>,
    level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RulesetOverlay {
    /// Drop every default rule before adding the overlay's `[[rules]]`.
    #[serde(default)]
    replace: bool,
    /// Names of default rules to drop.
    #[serde(default)]
    remove: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

/// Merge user rules into the ordered default rules.
/// A rule with an existing name takes that rule's slot; new names append.
fn merge_rules(base: &mut Vec<RuleConfig>, add: Vec<RuleConfig>, ruleset: &RulesetOverlay) {
    if ruleset.replace {
        base.clear();
    } else {
        base.retain(|rule| !ruleset.remove.contains(&rule.name));
    }
    for rule in add {
        match base.iter_mut().find(|r| r.name == rule.name) {
            Some(slot) => *slot = rule,
            None => base.push(rule),
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the user overlay from `path`, or from
    ///    ~/.config/infra-guard/config.toml when `path` is `None`
    ///
    /// Lists merge, scalars override, same-named rules are replaced in place.
    /// A missing overlay file is not an error; an unparseable one is reported
    /// on stderr and ignored.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::default_config();
        let path = path.map_or_else(default_overlay_path, Path::to_path_buf);
        if let Some(overlay) = Self::load_overlay(&path) {
            config.apply_overlay(overlay);
        }
        config
    }

    fn load_overlay(path: &Path) -> Option<ConfigOverlay> {
        let content = std::fs::read_to_string(path).ok()?;
        match parse_overlay(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("infra-guard: {}: {e}", path.display());
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        merge_list(
            &mut self.settings.guarded_tools,
            s.guarded_tools,
            &s.remove_guarded_tools,
            s.replace,
        );
        if let Some(v) = s.output_format {
            self.settings.output_format = v;
        }

        let l = overlay.logging;
        if let Some(v) = l.enabled {
            self.logging.enabled = v;
        }
        if let Some(v) = l.path {
            self.logging.path = v;
        }
        if let Some(v) = l.level {
            self.logging.level = v;
        }

        merge_rules(&mut self.rules, overlay.rules, &overlay.ruleset);
    }

    /// Apply an overlay from a TOML string.
    pub fn apply_overlay_str(&mut self, toml_str: &str) -> Result<()> {
        let overlay = parse_overlay(toml_str)?;
        self.apply_overlay(overlay);
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// The decision log path with `~` expanded.
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.logging.path).into_owned())
    }
}

fn parse_overlay(content: &str) -> Result<ConfigOverlay> {
    Ok(toml::from_str(content)?)
}

fn default_overlay_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_OVERLAY_PATH).into_owned())
}
