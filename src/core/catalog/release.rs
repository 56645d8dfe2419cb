use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::RelaunchResult;

/// A named, orderable version of the target loader. Ordinal 0 is the newest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub tag: String,
    pub ordinal: usize,
}

impl Release {
    pub fn new(name: impl Into<String>, tag: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            ordinal,
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Supplies releases, newest first, deduplicated by name.
///
/// Fails with `CatalogUnavailable` when nothing can be listed at all.
pub trait ReleaseCatalog {
    fn releases(&self) -> RelaunchResult<Vec<Release>>;
}

/// Live listing of releases, e.g. over HTTP. Order is newest first.
pub trait ReleaseSource {
    fn fetch(&self) -> RelaunchResult<Vec<Release>>;
}

impl ReleaseCatalog for Vec<Release> {
    fn releases(&self) -> RelaunchResult<Vec<Release>> {
        Ok(normalize(self.clone()))
    }
}

/// Drop later duplicates by name and renumber ordinals by position.
pub fn normalize(releases: Vec<Release>) -> Vec<Release> {
    let mut seen = HashSet::new();
    releases
        .into_iter()
        .filter(|release| seen.insert(release.name.clone()))
        .enumerate()
        .map(|(ordinal, release)| Release { ordinal, ..release })
        .collect()
}

/// Find a release by exact name.
pub fn find_release<'a>(releases: &'a [Release], name: &str) -> Option<&'a Release> {
    releases.iter().find(|release| release.name == name)
}
