// ─── Relaunch Context ───
// The single explicit value threaded through every component call:
// cache root, config location, wrapper bundle, and the host's startup data.

use std::path::{Path, PathBuf};

use crate::core::extraction::Bundle;

const CACHE_DIR_NAME: &str = ".cleanroom";
const CACHE_SUBDIR: &str = "relauncher";
const CONFIG_FILE: &str = "config/relauncher.json";

/// Options that take a separate value token on a JVM command line.
const VALUE_OPTIONS: &[&str] = &["-cp", "-classpath", "--class-path", "-p", "--module-path"];
const CLASSPATH_OPTIONS: &[&str] = &["-cp", "-classpath", "--class-path"];

/// Key/value startup arguments of the host, forwarded unchanged to the child.
///
/// Iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs(Vec<(String, String)>);

impl LaunchArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LaunchArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Self::new();
        for (k, v) in iter {
            args.insert(k, v);
        }
        args
    }
}

#[derive(Debug, Clone)]
pub struct RelaunchContext {
    cache_root: PathBuf,
    config_path: PathBuf,
    bundle: Bundle,
    launch_args: LaunchArgs,
    inherited_runtime_args: Vec<String>,
    runtime_classpath: String,
    parent_pid: u32,
}

impl RelaunchContext {
    /// Build a context for the current process.
    ///
    /// Runtime flags and classpath are read from this process's own command
    /// line; use the `with_*` methods to override them.
    pub fn new(game_dir: &Path, bundle: Bundle, launch_args: LaunchArgs) -> Self {
        let argv: Vec<String> = std::env::args().collect();
        Self {
            cache_root: default_cache_root(),
            config_path: game_dir.join(CONFIG_FILE),
            bundle,
            launch_args,
            inherited_runtime_args: jvm_input_arguments(&argv),
            runtime_classpath: jvm_classpath(&argv).unwrap_or_default(),
            parent_pid: std::process::id(),
        }
    }

    pub fn with_cache_root(mut self, cache_root: PathBuf) -> Self {
        self.cache_root = cache_root;
        self
    }

    pub fn with_config_path(mut self, config_path: PathBuf) -> Self {
        self.config_path = config_path;
        self
    }

    pub fn with_inherited_runtime_args(mut self, args: Vec<String>) -> Self {
        self.inherited_runtime_args = args;
        self
    }

    pub fn with_runtime_classpath(mut self, classpath: impl Into<String>) -> Self {
        self.runtime_classpath = classpath.into();
        self
    }

    pub fn with_parent_pid(mut self, pid: u32) -> Self {
        self.parent_pid = pid;
        self
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn launch_args(&self) -> &LaunchArgs {
        &self.launch_args
    }

    pub fn inherited_runtime_args(&self) -> &[String] {
        &self.inherited_runtime_args
    }

    pub fn runtime_classpath(&self) -> &str {
        &self.runtime_classpath
    }

    pub fn parent_pid(&self) -> u32 {
        self.parent_pid
    }

    pub fn releases_cache_path(&self) -> PathBuf {
        self.cache_root.join("releases.json")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.cache_root.join("versions")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.cache_root.join("libraries")
    }

    pub fn natives_dir(&self) -> PathBuf {
        self.cache_root.join("natives")
    }
}

/// `~/.cleanroom/relauncher`, or a relative fallback when no home exists.
pub fn default_cache_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
        .join(CACHE_SUBDIR)
}

/// JVM options of a command line: everything after the program name up to
/// the main class or `-jar`, minus classpath/module-path pairs.
pub fn jvm_input_arguments(argv: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    let mut iter = argv.iter().skip(1);
    while let Some(arg) = iter.next() {
        if !arg.starts_with('-') || arg == "-jar" {
            break;
        }
        if VALUE_OPTIONS.contains(&arg.as_str()) {
            iter.next();
            continue;
        }
        args.push(arg.clone());
    }
    args
}

/// The classpath value given on a JVM command line, if any.
pub fn jvm_classpath(argv: &[String]) -> Option<String> {
    let mut iter = argv.iter().skip(1);
    while let Some(arg) = iter.next() {
        if !arg.starts_with('-') || arg == "-jar" {
            return None;
        }
        if CLASSPATH_OPTIONS.contains(&arg.as_str()) {
            return iter.next().cloned();
        }
        if VALUE_OPTIONS.contains(&arg.as_str()) {
            iter.next();
        }
    }
    None
}
