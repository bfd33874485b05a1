//! Once-drop configuration
//!
//! Options live in the `[OnceDrop]` table (or as dotted `OnceDrop.Key` lines):
//!
//! ```toml
//! OnceDrop.Enable         = 1          # bool
//! OnceDrop.NpcEntry       = 12056      # creature entry
//! OnceDrop.Chance         = 1.0        # percent
//! OnceDrop.AllowRepeat    = 0          # bool
//! OnceDrop.ResetOnStartup = 0          # bool
//! ```
//!
//! Loading fails closed: a missing or malformed option falls back to its
//! default and logs a warning.

use crate::ConfigError;
use serde::Serialize;
use std::path::Path;

/// Creature entry of the default target (Baron Geddon)
pub const DEFAULT_NPC_ENTRY: u32 = 12056;
/// Item entry of the default reward (Talisman of Binding Shard)
pub const DEFAULT_ITEM_ENTRY: u32 = 17782;
pub const DEFAULT_ITEM_NAME: &str = "Talisman of Binding Shard";
pub const DEFAULT_GATE_KEY: &str = "geddon_17782_once";
pub const DEFAULT_CHANCE_PERCENT: f64 = 1.0;

/// Name of the options table
pub const OPTIONS_SECTION: &str = "OnceDrop";

const OPT_ENABLE: &str = "Enable";
const OPT_NPC_ENTRY: &str = "NpcEntry";
const OPT_CHANCE: &str = "Chance";
const OPT_ALLOW_REPEAT: &str = "AllowRepeat";
const OPT_RESET: &str = "ResetOnStartup";
const OPT_ITEM_ENTRY: &str = "ItemEntry";
const OPT_ITEM_NAME: &str = "ItemName";
const OPT_GATE_KEY: &str = "GateKey";

/// Validated once-drop settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnceDropConfig {
    pub enabled: bool,
    /// Creature entry whose corpse can receive the reward
    pub target_entry: u32,
    /// Drop chance in percent, always within [0, 100]
    pub chance_percent: f64,
    /// Keep the gate open after the first grant
    pub allow_repeat: bool,
    /// Clear the persisted gate whenever configuration is loaded
    pub reset_on_startup: bool,
    /// Reward item entry
    pub item_entry: u32,
    /// Reward display name used in announcements
    pub item_name: String,
    /// Key of the persisted gate record
    pub gate_key: String,
}

impl Default for OnceDropConfig {
    fn default() -> Self {
        OnceDropConfig {
            enabled: true,
            target_entry: DEFAULT_NPC_ENTRY,
            chance_percent: DEFAULT_CHANCE_PERCENT,
            allow_repeat: false,
            reset_on_startup: false,
            item_entry: DEFAULT_ITEM_ENTRY,
            item_name: DEFAULT_ITEM_NAME.to_string(),
            gate_key: DEFAULT_GATE_KEY.to_string(),
        }
    }
}

impl OnceDropConfig {
    /// Load from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(path.to_path_buf()),
        })?;
        Self::parse(&content).map_err(|e| ConfigError::Parse {
            error: e,
            path: Some(path.to_path_buf()),
        })
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content).map_err(|e| ConfigError::Parse {
            error: e,
            path: None,
        })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(Self::from_options(&table))
    }

    /// Build a config from a parsed options document.
    ///
    /// Looks for the `[OnceDrop]` table; anything absent or invalid takes
    /// its default.
    pub fn from_options(root: &toml::Table) -> Self {
        let defaults = OnceDropConfig::default();
        let section = match root.get(OPTIONS_SECTION) {
            Some(toml::Value::Table(section)) => section,
            Some(other) => {
                tracing::warn!(
                    found = other.type_str(),
                    "[{}] is not a table, using defaults",
                    OPTIONS_SECTION
                );
                return defaults;
            }
            None => return defaults,
        };

        let mut config = OnceDropConfig {
            enabled: bool_option(section, OPT_ENABLE).unwrap_or(defaults.enabled),
            target_entry: u32_option(section, OPT_NPC_ENTRY).unwrap_or(defaults.target_entry),
            chance_percent: f64_option(section, OPT_CHANCE).unwrap_or(defaults.chance_percent),
            allow_repeat: bool_option(section, OPT_ALLOW_REPEAT).unwrap_or(defaults.allow_repeat),
            reset_on_startup: bool_option(section, OPT_RESET)
                .unwrap_or(defaults.reset_on_startup),
            item_entry: u32_option(section, OPT_ITEM_ENTRY).unwrap_or(defaults.item_entry),
            item_name: string_option(section, OPT_ITEM_NAME).unwrap_or(defaults.item_name),
            gate_key: string_option(section, OPT_GATE_KEY).unwrap_or(defaults.gate_key),
        };
        config.normalize();
        config
    }

    /// Apply the entry fallbacks and clamp the chance
    pub fn normalize(&mut self) {
        if self.target_entry == 0 {
            self.target_entry = DEFAULT_NPC_ENTRY;
        }
        if self.item_entry == 0 {
            self.item_entry = DEFAULT_ITEM_ENTRY;
        }
        if !self.chance_percent.is_finite() {
            self.chance_percent = DEFAULT_CHANCE_PERCENT;
        }
        self.chance_percent = self.chance_percent.clamp(0.0, 100.0);
    }
}

fn invalid(key: &str, value: &toml::Value) {
    tracing::warn!(
        option = %format!("{}.{}", OPTIONS_SECTION, key),
        value = %value,
        "Invalid option value, using default"
    );
}

fn bool_option(section: &toml::Table, key: &str) -> Option<bool> {
    let value = section.get(key)?;
    let parsed = match value {
        toml::Value::Boolean(b) => Some(*b),
        toml::Value::Integer(i) => Some(*i != 0),
        toml::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        invalid(key, value);
    }
    parsed
}

fn u32_option(section: &toml::Table, key: &str) -> Option<u32> {
    let value = section.get(key)?;
    let parsed = match value {
        toml::Value::Integer(i) => u32::try_from(*i).ok(),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        invalid(key, value);
    }
    parsed
}

fn f64_option(section: &toml::Table, key: &str) -> Option<f64> {
    let value = section.get(key)?;
    let parsed = match value {
        toml::Value::Float(f) => Some(*f),
        toml::Value::Integer(i) => Some(*i as f64),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        invalid(key, value);
    }
    parsed
}

fn string_option(section: &toml::Table, key: &str) -> Option<String> {
    let value = section.get(key)?;
    match value {
        toml::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => {
            invalid(key, value);
            None
        }
    }
}
