// ─── Java Runtime Inspection ───
// Probes a Java executable for its version and vendor, and locates
// candidate executables for the headless configurator.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::core::error::{RelaunchError, RelaunchResult};

/// Oldest Java major the relaunched game runs on.
pub const MIN_JAVA_MAJOR: u32 = 21;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaInstallation {
    pub path: PathBuf,
    pub version: String,
    pub major: u32,
    pub is_64bit: bool,
    pub vendor: String,
}

/// A configured Java path is only usable when it names a regular file.
pub fn is_java_executable(path: &Path) -> bool {
    path.is_file()
}

pub fn inspect_java_binary(path: &Path) -> Option<JavaInstallation> {
    probe::probe_java(path)
}

/// Probe `path` and require at least `min_major`.
pub fn check_minimum(path: &Path, min_major: u32) -> RelaunchResult<JavaInstallation> {
    if !is_java_executable(path) {
        return Err(RelaunchError::JavaExecution(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let install = inspect_java_binary(path).ok_or_else(|| {
        RelaunchError::JavaExecution(format!("unable to query version of {}", path.display()))
    })?;

    require_major(install, min_major)
}

fn require_major(install: JavaInstallation, min_major: u32) -> RelaunchResult<JavaInstallation> {
    if install.major < min_major {
        return Err(RelaunchError::JavaExecution(format!(
            "Java {} at {} is too old, {} or newer is required",
            install.version,
            install.path.display(),
            min_major
        )));
    }
    Ok(install)
}

/// Executables worth probing, in preference order: `JAVA_HOME` first,
/// then every `PATH` entry.
pub fn candidate_java_binaries() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(home) = std::env::var_os("JAVA_HOME") {
        candidates.push(PathBuf::from(home).join("bin").join(java_exe()));
    }
    if let Some(path) = std::env::var_os("PATH") {
        candidates.extend(std::env::split_paths(&path).map(|dir| dir.join(java_exe())));
    }

    candidates.retain(|p| is_java_executable(p));
    candidates.dedup();
    candidates
}

/// First candidate satisfying `min_major`.
pub fn find_java_binary(min_major: u32) -> Option<JavaInstallation> {
    candidate_java_binaries()
        .into_iter()
        .find_map(|candidate| match check_minimum(&candidate, min_major) {
            Ok(install) => Some(install),
            Err(e) => {
                debug!("Skipping Java candidate {:?}: {}", candidate, e);
                None
            }
        })
}

fn parse_major_version(version: &str) -> u32 {
    let first_part = version.split('.').next().unwrap_or("0");
    let major: u32 = first_part
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    // Legacy "1.8.0_402" style.
    if major == 1 {
        version
            .split('.')
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(major)
    } else {
        major
    }
}

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

mod probe {
    use super::*;

    #[instrument]
    pub fn probe_java(path: &Path) -> Option<JavaInstallation> {
        let output = match Command::new(path)
            .args(["-XshowSettings:properties", "-version"])
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Unable to run {:?}: {}", path, e);
                return None;
            }
        };

        let version_output = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
        parse_output(path, &version_output)
    }

    pub(super) fn parse_output(path: &Path, version_output: &str) -> Option<JavaInstallation> {
        debug!(
            "Probing {:?}: {}",
            path,
            version_output.lines().next().unwrap_or("")
        );

        let version_str = parse_version_string(version_output)?;
        let major = parse_major_version(&version_str);
        let lower_output = version_output.to_ascii_lowercase();
        let is_64bit = lower_output.contains("sun.arch.data.model = 64")
            || lower_output.contains("os.arch = amd64")
            || lower_output.contains("os.arch = x86_64")
            || lower_output.contains("os.arch = aarch64");

        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        Some(JavaInstallation {
            path: canonical,
            version: version_str,
            major,
            is_64bit,
            vendor: parse_vendor(version_output),
        })
    }

    fn parse_version_string(output: &str) -> Option<String> {
        output.lines().find_map(|line| {
            let start = line.find('"')?;
            let end = line[start + 1..].find('"')?;
            Some(line[start + 1..start + 1 + end].to_string())
        })
    }

    fn parse_vendor(output: &str) -> String {
        for (needle, vendor) in [
            ("Temurin", "Temurin"),
            ("Adoptium", "Adoptium"),
            ("GraalVM", "GraalVM"),
            ("Zulu", "Azul Zulu"),
            ("OpenJDK", "OpenJDK"),
        ] {
            if output.contains(needle) {
                return vendor.to_string();
            }
        }
        "unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMURIN_21: &str = "Property settings:\n    java.version = 21.0.4\n    os.arch = amd64\n    sun.arch.data.model = 64\n\nopenjdk version \"21.0.4\" 2024-07-16 LTS\nOpenJDK Runtime Environment Temurin-21.0.4+7 (build 21.0.4+7-LTS)\n";

    #[test]
    fn major_version_formats() {
        assert_eq!(parse_major_version("21.0.4"), 21);
        assert_eq!(parse_major_version("1.8.0_402"), 8);
        assert_eq!(parse_major_version("22-ea"), 22);
        assert_eq!(parse_major_version("garbage"), 0);
    }

    #[test]
    fn parses_probe_output() {
        let install = probe::parse_output(Path::new("/opt/jdk/bin/java"), TEMURIN_21).unwrap();
        assert_eq!(install.version, "21.0.4");
        assert_eq!(install.major, 21);
        assert!(install.is_64bit);
        assert_eq!(install.vendor, "Temurin");
    }

    #[test]
    fn output_without_version_is_rejected() {
        assert!(probe::parse_output(Path::new("java"), "Error: could not open jvm.cfg").is_none());
    }

    #[test]
    fn directory_is_not_a_java_executable() {
        let temp = tempfile::tempdir().unwrap();
        assert!(!is_java_executable(temp.path()));
        assert!(matches!(
            check_minimum(temp.path(), MIN_JAVA_MAJOR),
            Err(RelaunchError::JavaExecution(_))
        ));
    }

    #[test]
    fn old_java_fails_minimum_check() {
        let output = "openjdk version \"17.0.2\" 2022-01-18\nOpenJDK Runtime Environment (build 17.0.2+8)\n";
        let install = probe::parse_output(Path::new("/usr/bin/java"), output).unwrap();
        assert_eq!(install.major, 17);

        let err = require_major(install.clone(), MIN_JAVA_MAJOR).unwrap_err();
        assert!(err.to_string().contains("too old"));
        assert!(require_major(install, 17).is_ok());
    }
}
