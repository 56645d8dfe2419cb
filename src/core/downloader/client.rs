use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::core::error::{RelaunchError, RelaunchResult};
use crate::core::http;

const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Blocking, SHA-1 validated downloader.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> RelaunchResult<Self> {
        Ok(Self {
            client: http::client(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))?,
        })
    }

    /// Download a single file to `dest`, optionally validating SHA-1.
    ///
    /// Creates parent directories as needed. Nothing is written when the
    /// checksum does not match, and `dest` only ever holds a complete file.
    pub fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> RelaunchResult<()> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RelaunchError::io(parent, e))?;
        }

        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelaunchError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes()?;

        if let Some(expected) = sha1_expected {
            let actual = sha1_hex(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(RelaunchError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        write_atomically(dest, &bytes)?;

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    /// Validate an existing file's SHA-1.
    pub fn validate_sha1(path: &Path, expected: &str) -> RelaunchResult<bool> {
        let bytes = std::fs::read(path).map_err(|e| RelaunchError::io(path, e))?;
        Ok(sha1_hex(&bytes).eq_ignore_ascii_case(expected))
    }
}

/// Write `bytes` to `<dest>.part`, then rename it over `dest`.
fn write_atomically(dest: &Path, bytes: &[u8]) -> RelaunchResult<()> {
    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let written = std::fs::File::create(&part).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = std::fs::remove_file(&part);
        return Err(RelaunchError::io(&part, e));
    }

    std::fs::rename(&part, dest).map_err(|e| {
        let _ = std::fs::remove_file(&part);
        RelaunchError::io(dest, e)
    })
}

fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
