// ─── Version Descriptors ───
// What a resolver hands back, and the checks the relauncher applies before
// trusting it.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::catalog::Release;
use crate::core::error::{RelaunchError, RelaunchResult};

/// Resolved, locally materialized entry class plus library and native paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub main_class: String,
    pub library_paths: Vec<PathBuf>,
    pub natives_paths: Vec<PathBuf>,
}

/// Materializes a release. Every returned path must exist on disk when
/// `resolve` returns.
pub trait VersionResolver {
    fn resolve(&self, release: &Release) -> RelaunchResult<Vec<VersionDescriptor>>;
}

/// Descriptors of one release, verified and in resolver order.
#[derive(Debug, Clone)]
pub struct ResolvedRelease {
    release: Release,
    descriptors: Vec<VersionDescriptor>,
}

impl ResolvedRelease {
    pub fn release(&self) -> &Release {
        &self.release
    }

    pub fn descriptors(&self) -> &[VersionDescriptor] {
        &self.descriptors
    }

    /// Entry class of the first descriptor.
    pub fn main_class(&self) -> &str {
        &self.descriptors[0].main_class
    }

    pub fn library_paths(&self) -> impl Iterator<Item = &Path> {
        self.descriptors
            .iter()
            .flat_map(|d| d.library_paths.iter().map(PathBuf::as_path))
    }

    pub fn natives_paths(&self) -> impl Iterator<Item = &Path> {
        self.descriptors
            .iter()
            .flat_map(|d| d.natives_paths.iter().map(PathBuf::as_path))
    }
}

/// Run the resolver and verify its output.
///
/// Any failure, including an empty result or a path that is not on disk,
/// becomes `VersionResolution` for `release`.
pub fn resolve_release(
    resolver: &dyn VersionResolver,
    release: &Release,
) -> RelaunchResult<ResolvedRelease> {
    info!("Preparing Cleanroom v{} and its libraries...", release.name);

    let to_resolution_err = |reason: String| RelaunchError::VersionResolution {
        release: release.name.clone(),
        reason,
    };

    let descriptors = resolver
        .resolve(release)
        .map_err(|e| to_resolution_err(e.to_string()))?;

    if descriptors.is_empty() {
        return Err(to_resolution_err("resolver produced no descriptors".into()));
    }

    for descriptor in &descriptors {
        let paths = descriptor
            .library_paths
            .iter()
            .chain(descriptor.natives_paths.iter());
        for path in paths {
            if !is_materialized(path) {
                return Err(to_resolution_err(format!(
                    "{} is not present on disk",
                    path.display()
                )));
            }
        }
    }

    let resolved = ResolvedRelease {
        release: release.clone(),
        descriptors,
    };
    debug!(
        "Resolved {} descriptors, {} libraries, {} native paths",
        resolved.descriptors.len(),
        resolved.library_paths().count(),
        resolved.natives_paths().count()
    );
    Ok(resolved)
}

/// Files must be openable; directories must be listable.
fn is_materialized(path: &Path) -> bool {
    if path.is_dir() {
        std::fs::read_dir(path).is_ok()
    } else {
        std::fs::File::open(path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(RelaunchResult<Vec<VersionDescriptor>>);

    impl VersionResolver for Fixed {
        fn resolve(&self, _release: &Release) -> RelaunchResult<Vec<VersionDescriptor>> {
            match &self.0 {
                Ok(descriptors) => Ok(descriptors.clone()),
                Err(e) => Err(RelaunchError::Other(e.to_string())),
            }
        }
    }

    fn release() -> Release {
        Release::new("0.3.0-alpha", "0.3.0-alpha", 0)
    }

    #[test]
    fn concatenates_descriptors_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = ["loader.jar", "addon.jar", "asm.jar"]
            .iter()
            .map(|name| {
                let p = temp.path().join(name);
                std::fs::write(&p, b"jar").unwrap();
                p
            })
            .collect();

        let resolver = Fixed(Ok(vec![
            VersionDescriptor {
                main_class: "top.outlands.foundation.boot.Foundation".into(),
                library_paths: vec![paths[0].clone(), paths[2].clone()],
                natives_paths: vec![temp.path().to_path_buf()],
            },
            VersionDescriptor {
                main_class: "addon.Main".into(),
                library_paths: vec![paths[1].clone()],
                natives_paths: vec![],
            },
        ]));

        let resolved = resolve_release(&resolver, &release()).unwrap();
        assert_eq!(resolved.main_class(), "top.outlands.foundation.boot.Foundation");
        let libs: Vec<_> = resolved.library_paths().collect();
        assert_eq!(libs, vec![paths[0].as_path(), paths[2].as_path(), paths[1].as_path()]);
        assert_eq!(resolved.natives_paths().count(), 1);
    }

    #[test]
    fn resolver_failure_names_the_release() {
        let resolver = Fixed(Err(RelaunchError::Other("HTTP 503".into())));
        let err = resolve_release(&resolver, &release()).unwrap_err();
        match err {
            RelaunchError::VersionResolution { release, reason } => {
                assert_eq!(release, "0.3.0-alpha");
                assert!(reason.contains("HTTP 503"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_library_breaks_the_materialization_guarantee() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = Fixed(Ok(vec![VersionDescriptor {
            main_class: "Main".into(),
            library_paths: vec![temp.path().join("never-downloaded.jar")],
            natives_paths: vec![],
        }]));

        let err = resolve_release(&resolver, &release()).unwrap_err();
        assert!(matches!(err, RelaunchError::VersionResolution { .. }));
    }

    #[test]
    fn empty_resolution_is_an_error() {
        let err = resolve_release(&Fixed(Ok(vec![])), &release()).unwrap_err();
        assert!(matches!(err, RelaunchError::VersionResolution { .. }));
    }
}
