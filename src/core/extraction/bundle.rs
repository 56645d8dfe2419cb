// ─── Wrapper Bundle ───
// The relauncher's own shipped resources: a manifest carrying the expected
// wrapper hash, and the `wrapper/` class tree to place on the child classpath.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{RelaunchError, RelaunchResult};

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const WRAPPER_HASH_ATTRIBUTE: &str = "WrapperHash";
pub const WRAPPER_ROOT: &str = "wrapper";

/// Where the bundled resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bundle {
    /// An unpacked resource tree.
    Directory(PathBuf),
    /// The tool's own jar archive.
    Archive(PathBuf),
}

impl Bundle {
    /// Read a main-section attribute from the bundle manifest.
    pub fn manifest_attribute(&self, key: &str) -> RelaunchResult<Option<String>> {
        let manifest = match self {
            Bundle::Directory(root) => {
                let path = root.join(MANIFEST_PATH);
                std::fs::read_to_string(&path).map_err(|e| RelaunchError::io(path, e))?
            }
            Bundle::Archive(jar) => {
                let mut archive = open_archive(jar)?;
                let mut entry = archive.by_name(MANIFEST_PATH)?;
                let mut raw = String::new();
                entry
                    .read_to_string(&mut raw)
                    .map_err(|e| RelaunchError::io(jar, e))?;
                raw
            }
        };
        Ok(parse_manifest_attribute(&manifest, key))
    }

    /// Relative paths of every file under `wrapper/`.
    pub fn wrapper_files(&self) -> RelaunchResult<Vec<PathBuf>> {
        let mut files = match self {
            Bundle::Directory(root) => {
                let mut files = Vec::new();
                list_tree(&root.join(WRAPPER_ROOT), Path::new(""), &mut files)?;
                files
            }
            Bundle::Archive(jar) => {
                let mut archive = open_archive(jar)?;
                let mut files = Vec::new();
                for i in 0..archive.len() {
                    let entry = archive.by_index(i)?;
                    if entry.is_dir() {
                        continue;
                    }
                    if let Some(relative) = entry.enclosed_name().and_then(|name| {
                        name.strip_prefix(WRAPPER_ROOT).ok().map(Path::to_path_buf)
                    }) {
                        if !relative.as_os_str().is_empty() {
                            files.push(relative);
                        }
                    }
                }
                files
            }
        };
        files.sort();
        Ok(files)
    }

    /// Copy every entry under `wrapper/` into `dest`, keeping relative layout.
    /// Returns the number of files written.
    pub fn copy_wrapper_into(&self, dest: &Path) -> RelaunchResult<usize> {
        match self {
            Bundle::Directory(root) => copy_tree(&root.join(WRAPPER_ROOT), dest),
            Bundle::Archive(jar) => copy_archive_subtree(jar, WRAPPER_ROOT, dest),
        }
    }
}

/// Main-section lookup in a jar manifest. Continuation lines start with a
/// single space; the section ends at the first blank line.
pub fn parse_manifest_attribute(manifest: &str, key: &str) -> Option<String> {
    let mut current: Option<(String, String)> = None;

    for line in manifest.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(rest);
            }
            continue;
        }
        if let Some((name, value)) = current.take() {
            if name.eq_ignore_ascii_case(key) {
                return Some(value);
            }
        }
        current = line
            .split_once(':')
            .map(|(name, value)| (name.trim().to_string(), value.trim_start().to_string()));
    }

    current
        .filter(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value)
}

fn open_archive(jar: &Path) -> RelaunchResult<zip::ZipArchive<std::fs::File>> {
    let file = std::fs::File::open(jar).map_err(|e| RelaunchError::io(jar, e))?;
    Ok(zip::ZipArchive::new(file)?)
}

fn copy_tree(source: &Path, destination: &Path) -> RelaunchResult<usize> {
    std::fs::create_dir_all(destination).map_err(|e| RelaunchError::io(destination, e))?;

    let mut copied = 0;
    for entry in std::fs::read_dir(source).map_err(|e| RelaunchError::io(source, e))? {
        let entry = entry.map_err(|e| RelaunchError::io(source, e))?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| RelaunchError::io(&src_path, e))?;

        if file_type.is_dir() {
            copied += copy_tree(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path).map_err(|e| RelaunchError::io(&dst_path, e))?;
            debug!("Moved {:?} to {:?}", src_path, dst_path);
            copied += 1;
        }
    }

    Ok(copied)
}

fn list_tree(dir: &Path, prefix: &Path, files: &mut Vec<PathBuf>) -> RelaunchResult<()> {
    for entry in std::fs::read_dir(dir).map_err(|e| RelaunchError::io(dir, e))? {
        let entry = entry.map_err(|e| RelaunchError::io(dir, e))?;
        let relative = prefix.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| RelaunchError::io(entry.path(), e))?;
        if file_type.is_dir() {
            list_tree(&entry.path(), &relative, files)?;
        } else if file_type.is_file() {
            files.push(relative);
        }
    }
    Ok(())
}

fn copy_archive_subtree(jar: &Path, prefix: &str, destination: &Path) -> RelaunchResult<usize> {
    let mut archive = open_archive(jar)?;
    std::fs::create_dir_all(destination).map_err(|e| RelaunchError::io(destination, e))?;

    let mut copied = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry
            .enclosed_name()
            .and_then(|name| name.strip_prefix(prefix).ok().map(Path::to_path_buf))
        else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let dst_path = destination.join(&relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&dst_path).map_err(|e| RelaunchError::io(&dst_path, e))?;
            continue;
        }
        if let Some(parent) = dst_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RelaunchError::io(parent, e))?;
        }
        let mut out = std::fs::File::create(&dst_path).map_err(|e| RelaunchError::io(&dst_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| RelaunchError::io(&dst_path, e))?;
        debug!("Moved {}!/{} to {:?}", jar.display(), entry.name(), dst_path);
        copied += 1;
    }

    Ok(copied)
}
