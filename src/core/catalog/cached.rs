// ─── Cached Release Catalog ───
// Live query first; the last successful listing on disk is the fallback.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::release::{normalize, Release, ReleaseCatalog, ReleaseSource};
use crate::core::error::{RelaunchError, RelaunchResult};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedReleases {
    fetched_at: DateTime<Utc>,
    releases: Vec<Release>,
}

pub struct CachedReleaseCatalog<S> {
    source: S,
    cache_file: PathBuf,
}

impl<S: ReleaseSource> CachedReleaseCatalog<S> {
    pub fn new(source: S, cache_file: PathBuf) -> Self {
        Self { source, cache_file }
    }

    fn read_cache(&self) -> Option<CachedReleases> {
        let raw = std::fs::read_to_string(&self.cache_file).ok()?;
        match serde_json::from_str::<CachedReleases>(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!("Ignoring unreadable release cache {:?}: {}", self.cache_file, e);
                None
            }
        }
    }

    fn write_cache(&self, releases: &[Release]) {
        let payload = CachedReleases {
            fetched_at: Utc::now(),
            releases: releases.to_vec(),
        };
        if let Err(e) = write_json(&self.cache_file, &payload) {
            warn!("Unable to cache releases at {:?}: {}", self.cache_file, e);
        }
    }
}

impl<S: ReleaseSource> ReleaseCatalog for CachedReleaseCatalog<S> {
    fn releases(&self) -> RelaunchResult<Vec<Release>> {
        let live_error = match self.source.fetch() {
            Ok(releases) if !releases.is_empty() => {
                let releases = normalize(releases);
                self.write_cache(&releases);
                return Ok(releases);
            }
            Ok(_) => "release query returned no releases".to_string(),
            Err(e) => e.to_string(),
        };

        warn!("Release query failed ({}), trying cache", live_error);
        match self.read_cache() {
            Some(cached) if !cached.releases.is_empty() => {
                info!(
                    "Using {} cached releases fetched at {}",
                    cached.releases.len(),
                    cached.fetched_at.to_rfc3339()
                );
                Ok(normalize(cached.releases))
            }
            _ => Err(RelaunchError::CatalogUnavailable(live_error)),
        }
    }
}

fn write_json(path: &Path, value: &CachedReleases) -> RelaunchResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RelaunchError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| RelaunchError::io(path, e))
}
