// ─── GitHub Release Source ───
// Lists Cleanroom releases from the GitHub REST API.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use super::release::{Release, ReleaseSource};
use crate::core::error::{RelaunchError, RelaunchResult};
use crate::core::http;

const CLEANROOM_RELEASES_URL: &str =
    "https://api.github.com/repos/CleanroomMC/Cleanroom/releases?per_page=100";
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
struct GithubRelease {
    #[serde(default)]
    name: Option<String>,
    tag_name: String,
    #[serde(default)]
    draft: bool,
}

pub struct GithubReleaseSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl GithubReleaseSource {
    pub fn new() -> RelaunchResult<Self> {
        Self::with_url(CLEANROOM_RELEASES_URL)
    }

    pub fn with_url(url: impl Into<String>) -> RelaunchResult<Self> {
        Ok(Self {
            client: http::client(Duration::from_secs(REQUEST_TIMEOUT_SECS))?,
            url: url.into(),
        })
    }
}

impl ReleaseSource for GithubReleaseSource {
    fn fetch(&self) -> RelaunchResult<Vec<Release>> {
        info!("Querying Cleanroom releases from {}", self.url);

        let resp = self
            .client
            .get(&self.url)
            .header("Accept", "application/vnd.github+json")
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelaunchError::DownloadFailed {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let releases: Vec<GithubRelease> = resp.json()?;
        debug!("GitHub returned {} release entries", releases.len());
        Ok(into_releases(releases))
    }
}

/// Drafts are skipped; an empty release name falls back to the tag.
fn into_releases(raw: Vec<GithubRelease>) -> Vec<Release> {
    raw.into_iter()
        .filter(|release| !release.draft)
        .enumerate()
        .map(|(ordinal, release)| {
            let name = release
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| release.tag_name.clone());
            Release::new(name.trim(), release.tag_name, ordinal)
        })
        .collect()
}
