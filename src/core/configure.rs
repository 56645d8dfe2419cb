// ─── Configuration Step ───
// Decides when the user's selection needs (re)configuration and defines the
// collaborator that performs it.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::catalog::{find_release, Release};
use crate::core::config::RelaunchConfig;
use crate::core::error::{RelaunchError, RelaunchResult};
use crate::core::java::{self, memory, MIN_JAVA_MAJOR};

/// Why configuration is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationReason {
    NoSelectedRelease,
    /// The selected name is not in the catalog.
    UnknownRelease(String),
    /// Unset, or not a regular file.
    InvalidJavaPath,
    /// A newer release appeared since the last configuration.
    NewRelease(String),
}

pub struct ConfigurationRequest<'a> {
    pub releases: &'a [Release],
    pub config: &'a RelaunchConfig,
    pub memory_ceiling_mb: u64,
    pub reasons: Vec<ConfigurationReason>,
}

impl ConfigurationRequest<'_> {
    /// Newest release of the catalog.
    pub fn latest(&self) -> Option<&Release> {
        self.releases.first()
    }
}

/// Produces a complete configuration, or declines.
///
/// The result must name a catalog release and an existing Java executable.
pub trait Configurator {
    fn configure(&self, request: &ConfigurationRequest<'_>) -> RelaunchResult<RelaunchConfig>;
}

/// Reasons `config` cannot be used as is. Empty means launch directly.
pub fn configuration_reasons(
    config: &RelaunchConfig,
    releases: &[Release],
) -> Vec<ConfigurationReason> {
    let mut reasons = Vec::new();

    match config.selected_version() {
        None => reasons.push(ConfigurationReason::NoSelectedRelease),
        Some(name) if find_release(releases, name).is_none() => {
            reasons.push(ConfigurationReason::UnknownRelease(name.to_string()))
        }
        Some(_) => {}
    }

    let java_ok = config
        .java_path()
        .is_some_and(|path| java::is_java_executable(Path::new(path)));
    if !java_ok {
        reasons.push(ConfigurationReason::InvalidJavaPath);
    }

    if let Some(latest) = releases.first() {
        if config.latest_version() != Some(latest.name.as_str()) {
            reasons.push(ConfigurationReason::NewRelease(latest.name.clone()));
        }
    }

    reasons
}

type JavaLocator = Box<dyn Fn(u32) -> Option<PathBuf>>;

/// Non-interactive configurator: keeps what is valid, picks the newest
/// release and the first suitable Java otherwise.
pub struct HeadlessConfigurator {
    locate_java: JavaLocator,
}

impl HeadlessConfigurator {
    pub fn new() -> Self {
        Self {
            locate_java: Box::new(|min_major| java::find_java_binary(min_major).map(|i| i.path)),
        }
    }

    pub fn with_java_locator(locate_java: impl Fn(u32) -> Option<PathBuf> + 'static) -> Self {
        Self {
            locate_java: Box::new(locate_java),
        }
    }
}

impl Default for HeadlessConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurator for HeadlessConfigurator {
    fn configure(&self, request: &ConfigurationRequest<'_>) -> RelaunchResult<RelaunchConfig> {
        let mut config = request.config.clone();

        for reason in &request.reasons {
            if let ConfigurationReason::NewRelease(name) = reason {
                info!("New Cleanroom release available: {}", name);
            }
        }

        let keep_selection = config
            .selected_version()
            .is_some_and(|name| find_release(request.releases, name).is_some());
        if !keep_selection {
            let latest = request.latest().ok_or_else(|| {
                RelaunchError::ConfigurationAborted("no releases to choose from".into())
            })?;
            info!("Selecting Cleanroom release {}", latest.name);
            config = config.with_selected_version(latest.name.clone());
        }

        let java_ok = config
            .java_path()
            .is_some_and(|path| java::is_java_executable(Path::new(path)));
        if !java_ok {
            let found = (self.locate_java)(MIN_JAVA_MAJOR).ok_or_else(|| {
                RelaunchError::ConfigurationAborted(format!(
                    "no Java {MIN_JAVA_MAJOR}+ installation found, set javaPath in the config"
                ))
            })?;
            info!("Using Java executable {:?}", found);
            config = config.with_java_path(found.to_string_lossy());
        }

        let clamped = memory::clamp_memory(config.max_memory(), request.memory_ceiling_mb);
        if clamped != config.max_memory() {
            warn!(
                "maxMemory {} exceeds physical memory, lowering to {}",
                config.max_memory(),
                clamped
            );
            config = config.with_max_memory(clamped);
        }

        Ok(config)
    }
}
