//! Configuration loading and management
//!
//! Handles parsing of `.taskdesk.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// File name of the configuration at the board root
pub const CONFIG_FILE: &str = ".taskdesk.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// Department list
    #[serde(default)]
    pub departments: DepartmentsConfig,

    /// Task configuration
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Avatar upload configuration
    #[serde(default)]
    pub avatar: AvatarConfig,

    /// Change watching configuration
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Actor-related configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActorConfig {
    /// Profile id used when no actor is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Closed list of departments tasks and members can belong to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentsConfig {
    #[serde(default = "default_departments")]
    pub names: Vec<String>,
}

fn default_departments() -> Vec<String> {
    [
        "Desenvolvimento",
        "Vendas",
        "Logística",
        "Marketing",
        "Financeiro",
        "Recursos Humanos",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

impl Default for DepartmentsConfig {
    fn default() -> Self {
        Self {
            names: default_departments(),
        }
    }
}

impl DepartmentsConfig {
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|entry| entry == name)
    }
}

/// Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Maximum checklist items on a new task
    #[serde(default = "default_max_checklist_items")]
    pub max_checklist_items: usize,
}

fn default_max_checklist_items() -> usize {
    20
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_checklist_items: default_max_checklist_items(),
        }
    }
}

/// Avatar upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Side of the square avatar produced by cropping, in pixels
    #[serde(default = "default_avatar_output_size")]
    pub output_size: u32,

    /// Largest accepted upload, in bytes
    #[serde(default = "default_avatar_max_bytes")]
    pub max_bytes: u64,

    /// Accepted upload content types
    #[serde(default = "default_avatar_types")]
    pub allowed_types: Vec<String>,

    /// Width of the initial crop as a percentage of the displayed image
    #[serde(default = "default_avatar_initial_crop")]
    pub initial_crop_percent: u8,
}

fn default_avatar_output_size() -> u32 {
    300
}

fn default_avatar_max_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_avatar_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/gif", "image/webp"]
        .iter()
        .map(|kind| kind.to_string())
        .collect()
}

fn default_avatar_initial_crop() -> u8 {
    90
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            output_size: default_avatar_output_size(),
            max_bytes: default_avatar_max_bytes(),
            allowed_types: default_avatar_types(),
            initial_crop_percent: default_avatar_initial_crop(),
        }
    }
}

/// Change watching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period before a burst of file events becomes one change token
    #[serde(default = "default_watch_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_watch_debounce_ms() -> u64 {
    300
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_watch_debounce_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a `.taskdesk.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the board root, or return defaults
    pub fn load_from_root(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.departments.validate()?;

        if self.tasks.max_checklist_items == 0 {
            return Err(Error::InvalidConfig(
                "tasks.max_checklist_items must be > 0".to_string(),
            ));
        }

        self.avatar.validate()?;

        if let Some(actor) = &self.actor.default {
            if actor.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "actor.default cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl DepartmentsConfig {
    fn validate(&self) -> Result<()> {
        if self.names.is_empty() {
            return Err(Error::InvalidConfig(
                "departments.names cannot be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for name in &self.names {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(Error::InvalidConfig(
                    "departments.names cannot include empty entries".to_string(),
                ));
            }
            if trimmed != name {
                return Err(Error::InvalidConfig(format!(
                    "departments.names entry '{name}' has surrounding whitespace"
                )));
            }
            if !seen.insert(trimmed) {
                return Err(Error::InvalidConfig(format!(
                    "departments.names has duplicate entry '{trimmed}'"
                )));
            }
        }
        Ok(())
    }
}

impl AvatarConfig {
    fn validate(&self) -> Result<()> {
        if self.output_size == 0 {
            return Err(Error::InvalidConfig(
                "avatar.output_size must be > 0".to_string(),
            ));
        }
        if self.max_bytes == 0 {
            return Err(Error::InvalidConfig(
                "avatar.max_bytes must be > 0".to_string(),
            ));
        }
        if self.allowed_types.is_empty() {
            return Err(Error::InvalidConfig(
                "avatar.allowed_types cannot be empty".to_string(),
            ));
        }
        if self.initial_crop_percent == 0 || self.initial_crop_percent > 100 {
            return Err(Error::InvalidConfig(
                "avatar.initial_crop_percent must be within 1..=100".to_string(),
            ));
        }
        Ok(())
    }
}
