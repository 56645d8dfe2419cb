// ─── Environment Probe ───
// Answers one question: is the target loader already running in this process?

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Class file that only exists on a Cleanroom classpath.
pub const CLEANROOM_MARKER: &str = "com/cleanroommc/boot/Main.class";

/// Capability supplied by the embedding layer.
pub trait EnvironmentProbe {
    fn is_target_active(&self) -> bool;
}

impl<F> EnvironmentProbe for F
where
    F: Fn() -> bool,
{
    fn is_target_active(&self) -> bool {
        self()
    }
}

/// Run a probe capability. A panicking capability counts as "not active".
pub fn probe(capability: &dyn EnvironmentProbe) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| capability.is_target_active())) {
        Ok(active) => active,
        Err(_) => {
            warn!("Environment probe failed; assuming target runtime is not active");
            false
        }
    }
}

/// Looks for a marker class in every classpath entry, directories and jars alike.
#[derive(Debug, Clone)]
pub struct ClasspathMarkerProbe {
    entries: Vec<PathBuf>,
    marker: String,
}

impl ClasspathMarkerProbe {
    pub fn new(entries: Vec<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            entries,
            marker: marker.into(),
        }
    }

    /// Split a platform classpath string and probe for the Cleanroom marker.
    pub fn cleanroom(classpath: &str) -> Self {
        let entries = if classpath.is_empty() {
            Vec::new()
        } else {
            std::env::split_paths(classpath).collect()
        };
        Self::new(entries, CLEANROOM_MARKER)
    }

    fn entry_has_marker(&self, entry: &Path) -> bool {
        if entry.is_dir() {
            return entry.join(&self.marker).is_file();
        }

        let Ok(file) = std::fs::File::open(entry) else {
            return false;
        };
        match zip::ZipArchive::new(file) {
            Ok(mut archive) => archive.by_name(&self.marker).is_ok(),
            Err(e) => {
                debug!("Classpath entry {:?} is not an archive: {}", entry, e);
                false
            }
        }
    }
}

impl EnvironmentProbe for ClasspathMarkerProbe {
    fn is_target_active(&self) -> bool {
        self.entries.iter().any(|entry| self.entry_has_marker(entry))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn closure_outcome_is_passed_through() {
        assert!(probe(&|| true));
        assert!(!probe(&|| false));
    }

    #[test]
    fn panicking_capability_reads_as_inactive() {
        let failing = || -> bool { panic!("marker lookup exploded") };
        assert!(!probe(&failing));
        // Idempotent: a second call behaves the same.
        assert!(!probe(&failing));
    }

    #[test]
    fn marker_found_in_directory_entry() {
        let temp = tempfile::tempdir().unwrap();
        let marker = temp.path().join(CLEANROOM_MARKER);
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(&marker, b"\xCA\xFE\xBA\xBE").unwrap();

        let probe_cap = ClasspathMarkerProbe::new(vec![temp.path().to_path_buf()], CLEANROOM_MARKER);
        assert!(probe(&probe_cap));
    }

    #[test]
    fn marker_found_in_jar_entry() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("cleanroom.jar");
        {
            let file = std::fs::File::create(&jar).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            writer
                .start_file(CLEANROOM_MARKER, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"\xCA\xFE\xBA\xBE").unwrap();
            writer.finish().unwrap();
        }

        let classpath = std::env::join_paths([temp.path().join("missing.jar"), jar])
            .unwrap()
            .into_string()
            .unwrap();
        assert!(probe(&ClasspathMarkerProbe::cleanroom(&classpath)));
    }

    #[test]
    fn unresolvable_marker_is_inactive_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let not_a_jar = temp.path().join("launchwrapper.jar");
        std::fs::write(&not_a_jar, b"plain text").unwrap();

        let probe_cap = ClasspathMarkerProbe::new(
            vec![not_a_jar, temp.path().join("nope")],
            CLEANROOM_MARKER,
        );
        assert!(!probe(&probe_cap));
        assert!(!probe(&ClasspathMarkerProbe::cleanroom("")));
    }
}
