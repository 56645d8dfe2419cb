// ─── Version Profile ───
// Mojang-style version JSON describing one descriptor: entry class plus
// libraries, with OS rules and native classifiers.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::core::error::{RelaunchError, RelaunchResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    /// Maven repository base for libraries without explicit downloads.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    #[serde(default)]
    pub natives: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<DownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<std::collections::HashMap<String, DownloadArtifact>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub path: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl VersionProfile {
    pub fn from_file(path: &Path) -> RelaunchResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| RelaunchError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl LibraryEntry {
    /// Mojang rule semantics: no rules means allowed; otherwise start
    /// disallowed and let the last matching rule decide.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let Some(rules) = &self.rules else {
            return true;
        };

        let current_os = current_os_name();
        let mut allowed = false;
        for rule in rules {
            let os_matches = match rule.os.as_ref().and_then(|os| os.name.as_deref()) {
                None => true,
                Some(name) => name == current_os,
            };
            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }
        allowed
    }

    /// Native classifier for this OS, with `${arch}` substituted.
    pub fn native_classifier_for_current_os(&self) -> Option<String> {
        let classifier = self.natives.as_ref()?.get(current_os_name())?.as_str()?;
        let arch = if cfg!(target_pointer_width = "64") {
            "64"
        } else {
            "32"
        };
        Some(classifier.replace("${arch}", arch))
    }

    /// The main jar: explicit download info, or derived from the coordinate.
    ///
    /// Natives-only entries (a `natives` map and no artifact) have none.
    pub fn main_artifact(&self) -> RelaunchResult<Option<DownloadArtifact>> {
        if let Some(artifact) = self.downloads.as_ref().and_then(|d| d.artifact.clone()) {
            return Ok(Some(artifact));
        }
        if self.natives.is_some() {
            return Ok(None);
        }
        Ok(Some(DownloadArtifact {
            path: maven_local_path(&self.name)?,
            sha1: None,
            url: None,
        }))
    }

    /// Download info for this OS's native classifier, if any.
    pub fn native_artifact(&self) -> Option<DownloadArtifact> {
        let classifier = self.native_classifier_for_current_os()?;
        self.downloads
            .as_ref()?
            .classifiers
            .as_ref()?
            .get(&classifier)
            .cloned()
    }
}

/// Mojang OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

/// `group:artifact:version[:classifier][@ext]` to its repository-relative path.
pub fn maven_local_path(coordinate: &str) -> RelaunchResult<String> {
    let (coord, extension) = coordinate
        .rsplit_once('@')
        .unwrap_or((coordinate, "jar"));
    let parts: Vec<&str> = coord.split(':').collect();

    let (group, artifact, version, classifier) = match parts.as_slice() {
        [g, a, v] => (*g, *a, *v, None),
        [g, a, v, c] => (*g, *a, *v, Some(*c)),
        _ => return Err(RelaunchError::InvalidMavenCoordinate(coordinate.to_string())),
    };
    if [group, artifact, version].iter().any(|part| part.is_empty()) {
        return Err(RelaunchError::InvalidMavenCoordinate(coordinate.to_string()));
    }

    let file_name = match classifier {
        Some(c) => format!("{artifact}-{version}-{c}.{extension}"),
        None => format!("{artifact}-{version}.{extension}"),
    };
    Ok(format!(
        "{}/{artifact}/{version}/{file_name}",
        group.replace('.', "/")
    ))
}

/// Join a profile-supplied relative path under `root`, refusing anything
/// that would escape it.
pub fn join_relative(root: &Path, relative: &str) -> RelaunchResult<PathBuf> {
    let rel = Path::new(relative);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(RelaunchError::Other(format!(
            "Refusing library path outside the libraries directory: {relative}"
        )));
    }
    Ok(root.join(rel))
}
