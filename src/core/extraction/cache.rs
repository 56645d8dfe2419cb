// ─── Resource Extraction Cache ───
// Keeps `<cache_root>/wrapper` in sync with the bundle. The MD5 of the
// cached wrapper class is compared against the manifest's `WrapperHash` and
// every bundled file must be present. Otherwise the tree is rebuilt in a
// staging directory and swapped in.

use std::io::Read;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tracing::{debug, error, info, warn};

use super::bundle::{Bundle, WRAPPER_HASH_ATTRIBUTE, WRAPPER_ROOT};
use crate::core::error::{RelaunchError, RelaunchResult};

/// Wrapper class relative to the extracted root; its hash gates extraction.
pub const WRAPPER_CLASS: &str = "com/cleanroommc/relauncher/wrapper/RelaunchMainWrapper.class";

/// Expected and observed state of the cached wrapper tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub expected_hash: String,
    pub cached_path: PathBuf,
    /// `None` when the wrapper class is absent or unreadable.
    pub observed_hash: Option<String>,
    /// Bundled files with no counterpart in the cache.
    pub missing_files: Vec<PathBuf>,
}

impl CacheEntry {
    pub fn is_current(&self) -> bool {
        self.missing_files.is_empty()
            && self
                .observed_hash
                .as_deref()
                .is_some_and(|observed| observed.eq_ignore_ascii_case(&self.expected_hash))
    }
}

pub struct ExtractionCache {
    cached_path: PathBuf,
}

impl ExtractionCache {
    pub fn new(cache_root: &Path) -> Self {
        Self {
            cached_path: cache_root.join(WRAPPER_ROOT),
        }
    }

    pub fn cached_path(&self) -> &Path {
        &self.cached_path
    }

    /// Compare the bundle's expected hash with what is on disk.
    pub fn inspect(&self, bundle: &Bundle) -> RelaunchResult<CacheEntry> {
        let expected_hash = bundle
            .manifest_attribute(WRAPPER_HASH_ATTRIBUTE)
            .map_err(|e| self.extraction_err(format!("unable to read bundle manifest: {e}")))?
            .ok_or_else(|| {
                self.extraction_err(format!("bundle manifest has no {WRAPPER_HASH_ATTRIBUTE}"))
            })?;

        let wrapper_class = self.cached_path.join(WRAPPER_CLASS);
        let observed_hash = if wrapper_class.is_file() {
            match md5_file(&wrapper_class) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    error!("Unable to hash cached wrapper {:?}: {}", wrapper_class, e);
                    None
                }
            }
        } else {
            None
        };

        let missing_files = bundle
            .wrapper_files()
            .map_err(|e| self.extraction_err(format!("unable to list bundle: {e}")))?
            .into_iter()
            .filter(|relative| !self.cached_path.join(relative).is_file())
            .collect();

        Ok(CacheEntry {
            expected_hash,
            cached_path: self.cached_path.clone(),
            observed_hash,
            missing_files,
        })
    }

    /// Make the cached tree match the bundle and return its absolute path.
    ///
    /// A current cache is left untouched.
    pub fn ensure_extracted(&self, bundle: &Bundle) -> RelaunchResult<PathBuf> {
        let entry = self.inspect(bundle)?;

        if entry.is_current() {
            debug!("Wrapper cache at {:?} is current", self.cached_path);
        } else {
            info!(
                "Wrapper cache stale (expected {}, found {}, {} files missing), extracting",
                entry.expected_hash,
                entry.observed_hash.as_deref().unwrap_or("nothing"),
                entry.missing_files.len()
            );
            self.rebuild(bundle)?;
        }

        absolute(&self.cached_path).map_err(|e| self.extraction_err(e.to_string()))
    }

    /// Extract into `wrapper.partial`, then swap it in. The previous tree is
    /// kept as `wrapper.backup` until the swap succeeds.
    fn rebuild(&self, bundle: &Bundle) -> RelaunchResult<()> {
        let staging = self.cached_path.with_extension("partial");
        let backup = self.cached_path.with_extension("backup");
        remove_path(&staging).map_err(|e| self.extraction_err(format!("unable to clear staging: {e}")))?;
        remove_path(&backup).map_err(|e| self.extraction_err(format!("unable to clear backup: {e}")))?;

        let copied = match bundle.copy_wrapper_into(&staging) {
            Ok(copied) => copied,
            Err(e) => {
                let _ = remove_path(&staging);
                return Err(self.extraction_err(e.to_string()));
            }
        };

        let had_previous = self.cached_path.exists();
        if had_previous {
            std::fs::rename(&self.cached_path, &backup).map_err(|e| {
                let _ = remove_path(&staging);
                self.extraction_err(format!("unable to move previous extraction aside: {e}"))
            })?;
        }

        if let Err(e) = std::fs::rename(&staging, &self.cached_path) {
            if had_previous {
                let _ = std::fs::rename(&backup, &self.cached_path);
            }
            let _ = remove_path(&staging);
            return Err(self.extraction_err(format!("unable to activate extraction: {e}")));
        }

        if had_previous {
            if let Err(e) = remove_path(&backup) {
                warn!("Unable to remove previous extraction {:?}: {}", backup, e);
            }
        }

        info!("Extracted {} wrapper files into {:?}", copied, self.cached_path);
        Ok(())
    }

    fn extraction_err(&self, reason: String) -> RelaunchError {
        RelaunchError::Extraction {
            path: self.cached_path.clone(),
            reason,
        }
    }
}

/// Extract the wrapper root of `bundle` under `cache_root` if stale.
pub fn ensure_extracted(bundle: &Bundle, cache_root: &Path) -> RelaunchResult<PathBuf> {
    ExtractionCache::new(cache_root).ensure_extracted(bundle)
}

/// Lowercase hex MD5 of a file's contents.
pub fn md5_file(path: &Path) -> RelaunchResult<String> {
    let mut file = std::fs::File::open(path).map_err(|e| RelaunchError::io(path, e))?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer).map_err(|e| RelaunchError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else if path.exists() {
        std::fs::remove_file(path)
    } else {
        Ok(())
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    let resolved = std::fs::canonicalize(path)?;

    // Extended-length prefixes confuse the JVM classpath parser.
    #[cfg(target_os = "windows")]
    {
        if let Some(stripped) = resolved.to_string_lossy().strip_prefix(r"\\?\") {
            return Ok(PathBuf::from(stripped));
        }
    }

    Ok(resolved)
}
