// ─── Profile Version Resolver ───
// Turns a release into descriptors by reading its version profiles,
// downloading missing libraries and unpacking native jars.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::descriptor::{VersionDescriptor, VersionResolver};
use super::profile::{join_relative, DownloadArtifact, VersionProfile};
use crate::core::catalog::Release;
use crate::core::context::RelaunchContext;
use crate::core::downloader::Downloader;
use crate::core::error::{RelaunchError, RelaunchResult};

pub const CLEANROOM_PROFILE_BASE: &str =
    "https://github.com/CleanroomMC/Cleanroom/releases/download";
pub const CLEANROOM_MAVEN: &str = "https://maven.cleanroommc.com";
const PROFILE_FILE: &str = "version.json";

pub struct ProfileVersionResolver {
    versions_dir: PathBuf,
    libraries_dir: PathBuf,
    natives_dir: PathBuf,
    profile_base_url: String,
    default_repository: String,
    /// `None` resolves strictly from what is already on disk.
    downloader: Option<Downloader>,
}

impl ProfileVersionResolver {
    pub fn new(ctx: &RelaunchContext, downloader: Option<Downloader>) -> Self {
        Self {
            versions_dir: ctx.versions_dir(),
            libraries_dir: ctx.libraries_dir(),
            natives_dir: ctx.natives_dir(),
            profile_base_url: CLEANROOM_PROFILE_BASE.into(),
            default_repository: CLEANROOM_MAVEN.into(),
            downloader,
        }
    }

    pub fn with_profile_base_url(mut self, url: impl Into<String>) -> Self {
        self.profile_base_url = url.into();
        self
    }

    /// Profile files of a release, sorted by file name. Fetches
    /// `version.json` for the release tag when none are cached.
    fn profile_files(&self, release: &Release) -> RelaunchResult<Vec<PathBuf>> {
        let dir = self.versions_dir.join(&release.name);
        let mut files = list_json_files(&dir)?;

        if files.is_empty() {
            let dest = dir.join(PROFILE_FILE);
            let url = format!(
                "{}/{}/{}",
                self.profile_base_url.trim_end_matches('/'),
                release.tag,
                PROFILE_FILE
            );
            info!("Fetching version profile for {} from {}", release.name, url);
            self.fetch(&url, &dest, None)?;
            files.push(dest);
        }

        Ok(files)
    }

    fn fetch(&self, url: &str, dest: &Path, sha1: Option<&str>) -> RelaunchResult<()> {
        match &self.downloader {
            Some(downloader) => downloader.download_file(url, dest, sha1),
            None => Err(RelaunchError::Other(format!(
                "{} is missing and downloads are disabled",
                dest.display()
            ))),
        }
    }

    /// Make sure `artifact` is on disk, downloading it when absent or when the
    /// cached copy fails its SHA-1.
    fn materialize(
        &self,
        artifact: &DownloadArtifact,
        repository: Option<&str>,
    ) -> RelaunchResult<PathBuf> {
        let dest = join_relative(&self.libraries_dir, &artifact.path)?;
        if dest.is_file() {
            let Some(expected) = artifact.sha1.as_deref() else {
                return Ok(dest);
            };
            match Downloader::validate_sha1(&dest, expected) {
                Ok(true) => return Ok(dest),
                Ok(false) => warn!("Cached library {:?} failed its SHA-1 check, fetching again", dest),
                Err(e) => warn!("Unable to verify cached library {:?}: {}", dest, e),
            }
        }

        let url = artifact.url.clone().unwrap_or_else(|| {
            let repo = repository.unwrap_or(&self.default_repository);
            format!("{}/{}", repo.trim_end_matches('/'), artifact.path)
        });
        self.fetch(&url, &dest, artifact.sha1.as_deref())?;
        Ok(dest)
    }

    fn describe(
        &self,
        profile: &VersionProfile,
        natives_dir: &Path,
    ) -> RelaunchResult<VersionDescriptor> {
        let mut library_paths = Vec::new();
        let mut native_jars = Vec::new();

        for lib in &profile.libraries {
            if !lib.is_allowed_for_current_os() {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }

            if let Some(artifact) = lib.main_artifact()? {
                library_paths.push(self.materialize(&artifact, lib.url.as_deref())?);
            }
            if let Some(native) = lib.native_artifact() {
                native_jars.push(self.materialize(&native, lib.url.as_deref())?);
            }
        }

        let mut natives_paths = Vec::new();
        if !native_jars.is_empty() {
            std::fs::create_dir_all(natives_dir).map_err(|e| RelaunchError::io(natives_dir, e))?;
            for jar in &native_jars {
                extract_natives(jar, natives_dir)?;
            }
            natives_paths.push(natives_dir.to_path_buf());
        }

        info!(
            "Profile {} resolved: {} libraries, {} native jars",
            profile.id.as_deref().unwrap_or("<unnamed>"),
            library_paths.len(),
            native_jars.len()
        );

        Ok(VersionDescriptor {
            main_class: profile.main_class.clone(),
            library_paths,
            natives_paths,
        })
    }
}

impl VersionResolver for ProfileVersionResolver {
    fn resolve(&self, release: &Release) -> RelaunchResult<Vec<VersionDescriptor>> {
        let natives_dir = self.natives_dir.join(&release.name);
        // Natives are unpacked fresh for every resolution.
        if natives_dir.exists() {
            std::fs::remove_dir_all(&natives_dir).map_err(|e| RelaunchError::io(&natives_dir, e))?;
        }

        let mut descriptors = Vec::new();
        let mut natives_listed = false;
        for file in self.profile_files(release)? {
            let profile = VersionProfile::from_file(&file)?;
            let mut descriptor = self.describe(&profile, &natives_dir)?;
            // Every profile unpacks into the same directory; list it once.
            if natives_listed {
                descriptor.natives_paths.clear();
            }
            natives_listed |= !descriptor.natives_paths.is_empty();
            descriptors.push(descriptor);
        }
        Ok(descriptors)
    }
}

fn list_json_files(dir: &Path) -> RelaunchResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| RelaunchError::io(dir, e))? {
        let path = entry.map_err(|e| RelaunchError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy top-level `.dll`/`.so`/`.dylib`/`.jnilib` entries of a native jar.
fn extract_natives(jar: &Path, dest_dir: &Path) -> RelaunchResult<()> {
    let file = std::fs::File::open(jar).map_err(|e| RelaunchError::io(jar, e))?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut extracted = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        if name.contains("META-INF") || name.contains('/') || name.contains('\\') {
            continue;
        }
        let is_native = [".dll", ".so", ".dylib", ".jnilib"]
            .iter()
            .any(|ext| name.ends_with(ext));
        if !is_native {
            continue;
        }

        let dest = dest_dir.join(&name);
        let mut out = std::fs::File::create(&dest).map_err(|e| RelaunchError::io(&dest, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| RelaunchError::io(&dest, e))?;
        debug!("Extracted native: {}", name);
        extracted += 1;
    }

    if extracted == 0 {
        warn!("Native jar {:?} contained no libraries for this platform", jar);
    }
    Ok(())
}
