//! Configuration management for `taskdeck`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. Explicit overrides from the embedding application
//! 2. Environment variables (`TASKDECK_*`)
//! 3. YAML config file (`taskdeck.yaml`)
//! 4. Defaults

use crate::error::{Result, StoreError};
use crate::storage::DEFAULT_MAX_CAPACITY;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename looked up by [`load_config`].
pub const DEFAULT_CONFIG_FILENAME: &str = "taskdeck.yaml";

const ENV_PREFIX: &str = "TASKDECK_";
const KEY_MAX_CAPACITY: &str = "max-capacity";
const KEY_SNAPSHOT_PATH: &str = "snapshot-path";
const KEY_LOG_LEVEL: &str = "log-level";
const KEY_LOG_FILE: &str = "log-file";

/// Settings consumed when constructing a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of lists plus tasks.
    pub max_capacity: usize,
    /// Where the snapshot exporter reads and writes, if anywhere.
    pub snapshot_path: Option<PathBuf>,
    /// Tracing filter directive, e.g. `taskdeck=debug`.
    pub log_level: Option<String>,
    /// Optional JSON log file.
    pub log_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            snapshot_path: None,
            log_level: None,
            log_file: None,
        }
    }
}

impl StoreConfig {
    /// Resolve typed settings from a merged layer.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `max-capacity` is not a positive integer.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = layer.get(KEY_MAX_CAPACITY) {
            let max = raw.trim().parse::<usize>().map_err(|_| {
                StoreError::Config(format!("max-capacity must be an integer, got '{raw}'"))
            })?;
            if max == 0 {
                return Err(StoreError::Config(
                    "max-capacity must be greater than zero".to_string(),
                ));
            }
            config.max_capacity = max;
        }

        config.snapshot_path = non_blank(layer.get(KEY_SNAPSHOT_PATH)).map(PathBuf::from);
        config.log_level = non_blank(layer.get(KEY_LOG_LEVEL)).map(str::to_string);
        config.log_file = non_blank(layer.get(KEY_LOG_FILE)).map(PathBuf::from);

        Ok(config)
    }
}

/// A flat key/value configuration layer.
///
/// Keys are normalized on insert: lower-cased, with `_` and `.` mapped to
/// `-`, so `max_capacity`, `MAX-CAPACITY` and `snapshot.path` all land on
/// the same entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    values: HashMap<String, String>,
}

impl ConfigLayer {
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(&normalize_key(key))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `TASKDECK_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }
}

/// Overrides supplied directly by the embedding application.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_capacity: Option<usize>,
    pub snapshot_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        if let Some(max) = self.max_capacity {
            layer.insert(KEY_MAX_CAPACITY, max.to_string());
        }
        if let Some(path) = &self.snapshot_path {
            layer.insert(KEY_SNAPSHOT_PATH, path.to_string_lossy().to_string());
        }
        if let Some(level) = &self.log_level {
            layer.insert(KEY_LOG_LEVEL, level.clone());
        }
        layer
    }
}

/// Load configuration with the standard precedence order.
///
/// `config_file` defaults to `taskdeck.yaml` in the current directory.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or a value
/// is invalid.
pub fn load_config(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<StoreConfig> {
    let file_layer = match config_file {
        Some(path) => ConfigLayer::from_yaml(path)?,
        None => ConfigLayer::from_yaml(Path::new(DEFAULT_CONFIG_FILENAME))?,
    };
    let merged = ConfigLayer::merge_layers(&[file_layer, ConfigLayer::from_env(), overrides.as_layer()]);
    StoreConfig::from_layer(&merged)
}

fn non_blank(raw: Option<&String>) -> Option<&str> {
    raw.map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '.'], "-")
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
