// ─── Relaunch Configuration ───
// Persisted user choices: release, Java executable and JVM tuning.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error};

use crate::core::error::{RelaunchError, RelaunchResult};

pub const DEFAULT_MAX_MEMORY: &str = "4096M";
pub const DEFAULT_GC_TYPE: &str = "G1GC";

/// Immutable configuration value. Updates go through the `with_*` methods,
/// each returning a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaunchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    java_path: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    args: String,
    #[serde(deserialize_with = "null_as_default_max_memory")]
    max_memory: String,
    #[serde(deserialize_with = "null_as_default_gc_type")]
    gc_type: String,
    #[serde(deserialize_with = "null_as_default")]
    jvm_flags: BTreeSet<String>,
}

// An explicit `null` reads like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_max_memory<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| DEFAULT_MAX_MEMORY.into()))
}

fn null_as_default_gc_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| DEFAULT_GC_TYPE.into()))
}

impl Default for RelaunchConfig {
    fn default() -> Self {
        Self {
            selected_version: None,
            latest_version: None,
            java_path: None,
            args: String::new(),
            max_memory: DEFAULT_MAX_MEMORY.into(),
            gc_type: DEFAULT_GC_TYPE.into(),
            jvm_flags: BTreeSet::new(),
        }
    }
}

impl RelaunchConfig {
    /// Read the config file. Absence is not an error: defaults are returned.
    pub fn try_load(path: &Path) -> RelaunchResult<Self> {
        if !path.exists() {
            debug!("No relauncher config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| RelaunchError::ConfigIo {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| RelaunchError::ConfigIo {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Like [`Self::try_load`], but logs failures and substitutes defaults.
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_else(|e| {
            error!("Unable to read config: {}", e);
            Self::default()
        })
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> RelaunchResult<()> {
        let to_config_err = |reason: String| RelaunchError::ConfigIo {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| to_config_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| to_config_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| to_config_err(e.to_string()))?;

        debug!("Saved relauncher config to {:?}", path);
        Ok(())
    }

    pub fn selected_version(&self) -> Option<&str> {
        self.selected_version.as_deref()
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.latest_version.as_deref()
    }

    pub fn java_path(&self) -> Option<&str> {
        self.java_path.as_deref()
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn max_memory(&self) -> &str {
        &self.max_memory
    }

    pub fn gc_type(&self) -> &str {
        &self.gc_type
    }

    pub fn jvm_flags(&self) -> &BTreeSet<String> {
        &self.jvm_flags
    }

    pub fn with_selected_version(self, version: impl Into<String>) -> Self {
        Self {
            selected_version: Some(version.into()),
            ..self
        }
    }

    pub fn with_latest_version(self, version: impl Into<String>) -> Self {
        Self {
            latest_version: Some(version.into()),
            ..self
        }
    }

    /// Doubled backslashes in the path are collapsed to `/`.
    pub fn with_java_path(self, path: impl AsRef<str>) -> Self {
        Self {
            java_path: Some(path.as_ref().replace("\\\\", "/")),
            ..self
        }
    }

    pub fn with_args(self, args: impl Into<String>) -> Self {
        Self {
            args: args.into(),
            ..self
        }
    }

    pub fn with_max_memory(self, max_memory: impl Into<String>) -> Self {
        Self {
            max_memory: max_memory.into(),
            ..self
        }
    }

    pub fn with_gc_type(self, gc_type: impl Into<String>) -> Self {
        Self {
            gc_type: gc_type.into(),
            ..self
        }
    }

    pub fn with_jvm_flags<I, S>(self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            jvm_flags: flags.into_iter().map(Into::into).collect(),
            ..self
        }
    }
}
