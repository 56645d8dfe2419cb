// ─── Relauncher ───
// The whole run: probe, list releases, configure, resolve, extract the
// wrapper, assemble the command line and hand over to the child.

use std::time::Instant;

use tracing::{error, info};

use crate::core::catalog::{
    find_release, CachedReleaseCatalog, GithubReleaseSource, Release, ReleaseCatalog,
};
use crate::core::config::RelaunchConfig;
use crate::core::configure::{
    configuration_reasons, ConfigurationRequest, Configurator, HeadlessConfigurator,
};
use crate::core::context::RelaunchContext;
use crate::core::downloader::Downloader;
use crate::core::error::{RelaunchError, RelaunchResult};
use crate::core::extraction::ensure_extracted;
use crate::core::java::memory_ceiling_mb;
use crate::core::launch::{assemble, launch, AssemblyInput, ProcessExitTerminator, Terminator};
use crate::core::probe::{probe, ClasspathMarkerProbe, EnvironmentProbe};
use crate::core::version::{resolve_release, ProfileVersionResolver, VersionResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaunchOutcome {
    /// The target runtime is already loaded; nothing was done.
    AlreadyActive,
    /// The child ran to completion with this exit code.
    Relaunched(i32),
}

/// One relaunch attempt over injected collaborators.
pub struct Relauncher<'a> {
    ctx: &'a RelaunchContext,
    probe: &'a dyn EnvironmentProbe,
    catalog: &'a dyn ReleaseCatalog,
    resolver: &'a dyn VersionResolver,
    configurator: &'a dyn Configurator,
    terminator: &'a dyn Terminator,
    memory_ceiling_mb: Option<u64>,
}

impl<'a> Relauncher<'a> {
    pub fn new(
        ctx: &'a RelaunchContext,
        probe: &'a dyn EnvironmentProbe,
        catalog: &'a dyn ReleaseCatalog,
        resolver: &'a dyn VersionResolver,
        configurator: &'a dyn Configurator,
        terminator: &'a dyn Terminator,
    ) -> Self {
        Self {
            ctx,
            probe,
            catalog,
            resolver,
            configurator,
            terminator,
            memory_ceiling_mb: None,
        }
    }

    /// Fix the memory ceiling instead of reading physical memory.
    pub fn with_memory_ceiling_mb(mut self, ceiling: u64) -> Self {
        self.memory_ceiling_mb = Some(ceiling);
        self
    }

    pub fn run(&self) -> RelaunchResult<RelaunchOutcome> {
        if probe(self.probe) {
            info!("Cleanroom is already loaded, skipping relaunch");
            return Ok(RelaunchOutcome::AlreadyActive);
        }

        let started = Instant::now();
        let releases = self.catalog.releases()?;
        if releases.is_empty() {
            return Err(RelaunchError::CatalogUnavailable(
                "release listing is empty".into(),
            ));
        }
        info!("{} Cleanroom releases available", releases.len());

        let config = self.configured(&releases)?;
        let release = selected_release(&config, &releases)?;

        let resolved = resolve_release(self.resolver, release)?;
        let wrapper = ensure_extracted(self.ctx.bundle(), self.ctx.cache_root())?;

        let args = assemble(&AssemblyInput {
            config: &config,
            inherited_runtime_args: self.ctx.inherited_runtime_args(),
            resolved: &resolved,
            wrapper_classpath: &wrapper,
            launch_args: self.ctx.launch_args(),
            parent_pid: self.ctx.parent_pid(),
        });
        info!(
            "Prepared relaunch of Cleanroom {} in {:.2?}",
            release,
            started.elapsed()
        );

        let code = launch(args, self.terminator)?;
        Ok(RelaunchOutcome::Relaunched(code))
    }

    /// Load the persisted config and run the configurator when it is
    /// incomplete or a newer release appeared.
    fn configured(&self, releases: &[Release]) -> RelaunchResult<RelaunchConfig> {
        let path = self.ctx.config_path();
        let config = RelaunchConfig::load(path);

        let reasons = configuration_reasons(&config, releases);
        if reasons.is_empty() {
            return Ok(config);
        }
        info!("Configuration required: {:?}", reasons);

        let request = ConfigurationRequest {
            releases,
            config: &config,
            memory_ceiling_mb: self.memory_ceiling_mb.unwrap_or_else(memory_ceiling_mb),
            reasons,
        };
        let configured = self.configurator.configure(&request).map_err(|e| match e {
            RelaunchError::ConfigurationAborted(_) => e,
            other => RelaunchError::ConfigurationAborted(other.to_string()),
        })?;

        let configured = match releases.first() {
            Some(latest) => configured.with_latest_version(latest.name.clone()),
            None => configured,
        };
        let remaining = configuration_reasons(&configured, releases);
        if !remaining.is_empty() {
            return Err(RelaunchError::ConfigurationAborted(format!(
                "configuration is still incomplete: {remaining:?}"
            )));
        }

        if let Err(e) = configured.save(path) {
            error!("Unable to save relauncher config: {}", e);
        }
        Ok(configured)
    }
}

fn selected_release<'r>(
    config: &RelaunchConfig,
    releases: &'r [Release],
) -> RelaunchResult<&'r Release> {
    config
        .selected_version()
        .and_then(|name| find_release(releases, name))
        .ok_or_else(|| RelaunchError::ConfigurationAborted("no release selected".into()))
}

/// Relaunch with the production collaborators: classpath marker probe,
/// GitHub catalog cached under the cache root, profile resolver with
/// downloads, headless configuration, and process exit on completion.
pub fn relaunch(ctx: &RelaunchContext) -> RelaunchResult<RelaunchOutcome> {
    let probe = ClasspathMarkerProbe::cleanroom(ctx.runtime_classpath());
    let catalog = CachedReleaseCatalog::new(GithubReleaseSource::new()?, ctx.releases_cache_path());
    let resolver = ProfileVersionResolver::new(ctx, Some(Downloader::new()?));
    let configurator = HeadlessConfigurator::new();

    Relauncher::new(
        ctx,
        &probe,
        &catalog,
        &resolver,
        &configurator,
        &ProcessExitTerminator,
    )
    .run()
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::path::{Path, PathBuf};

    use md5::{Digest, Md5};

    use super::*;
    use crate::core::context::LaunchArgs;
    use crate::core::extraction::cache::WRAPPER_CLASS;
    use crate::core::extraction::Bundle;
    use crate::core::version::VersionDescriptor;

    /// Shared log of collaborator calls, in order.
    #[derive(Default)]
    struct Calls(RefCell<Vec<&'static str>>);

    impl Calls {
        fn push(&self, call: &'static str) {
            self.0.borrow_mut().push(call);
        }

        fn snapshot(&self) -> Vec<&'static str> {
            self.0.borrow().clone()
        }
    }

    struct Catalog<'c>(&'c Calls, Vec<Release>);

    impl ReleaseCatalog for Catalog<'_> {
        fn releases(&self) -> RelaunchResult<Vec<Release>> {
            self.0.push("catalog");
            Ok(self.1.clone())
        }
    }

    struct Resolver<'c> {
        calls: &'c Calls,
        library: PathBuf,
    }

    impl VersionResolver for Resolver<'_> {
        fn resolve(&self, _release: &Release) -> RelaunchResult<Vec<VersionDescriptor>> {
            self.calls.push("resolve");
            Ok(vec![VersionDescriptor {
                main_class: "top.outlands.foundation.boot.Foundation".into(),
                library_paths: vec![self.library.clone()],
                natives_paths: vec![],
            }])
        }
    }

    struct Configure<'c> {
        calls: &'c Calls,
        java: Option<PathBuf>,
    }

    impl Configurator for Configure<'_> {
        fn configure(&self, request: &ConfigurationRequest<'_>) -> RelaunchResult<RelaunchConfig> {
            self.calls.push("configure");
            match &self.java {
                Some(java) => Ok(request
                    .config
                    .clone()
                    .with_selected_version(request.releases[1].name.clone())
                    .with_java_path(java.to_string_lossy())),
                None => Err(RelaunchError::ConfigurationAborted("closed".into())),
            }
        }
    }

    #[derive(Default)]
    struct Recording(Cell<Option<i32>>);

    impl Terminator for Recording {
        fn terminate(&self, code: i32) {
            self.0.set(Some(code));
        }
    }

    struct Fixture {
        temp: tempfile::TempDir,
        ctx: RelaunchContext,
        library: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();

        let bundle = root.join("bundle");
        let class_bytes = b"wrapper";
        std::fs::create_dir_all(bundle.join("META-INF")).unwrap();
        std::fs::write(
            bundle.join("META-INF/MANIFEST.MF"),
            format!("WrapperHash: {}\n", hex::encode(Md5::digest(class_bytes))),
        )
        .unwrap();
        let class = bundle.join("wrapper").join(WRAPPER_CLASS);
        std::fs::create_dir_all(class.parent().unwrap()).unwrap();
        std::fs::write(class, class_bytes).unwrap();

        let library = root.join("cleanroom.jar");
        std::fs::write(&library, b"jar").unwrap();

        let ctx = RelaunchContext::new(&root.join("game"), Bundle::Directory(bundle), LaunchArgs::new())
            .with_cache_root(root.join("cache"))
            .with_inherited_runtime_args(vec![])
            .with_parent_pid(1);

        Fixture { temp, ctx, library }
    }

    fn catalog(calls: &Calls) -> Catalog<'_> {
        Catalog(
            calls,
            vec![Release::new("v3", "v3", 0), Release::new("v2", "v2", 1)],
        )
    }

    #[test]
    fn already_active_short_circuits() {
        let fx = fixture();
        let calls = Calls::default();
        let active = || true;
        let terminator = Recording::default();

        let outcome = Relauncher::new(
            &fx.ctx,
            &active,
            &catalog(&calls),
            &Resolver { calls: &calls, library: fx.library.clone() },
            &Configure { calls: &calls, java: None },
            &terminator,
        )
        .run()
        .unwrap();

        assert_eq!(outcome, RelaunchOutcome::AlreadyActive);
        assert!(calls.snapshot().is_empty());
        assert_eq!(terminator.0.get(), None);
    }

    #[test]
    fn declining_configurator_halts_before_resolution() {
        let fx = fixture();
        let calls = Calls::default();
        let inactive = || false;

        let err = Relauncher::new(
            &fx.ctx,
            &inactive,
            &catalog(&calls),
            &Resolver { calls: &calls, library: fx.library.clone() },
            &Configure { calls: &calls, java: None },
            &Recording::default(),
        )
        .with_memory_ceiling_mb(8192)
        .run()
        .unwrap_err();

        assert!(matches!(err, RelaunchError::ConfigurationAborted(_)));
        assert_eq!(calls.snapshot(), vec!["catalog", "configure"]);
        assert!(!fx.ctx.config_path().exists());
    }

    #[test]
    fn empty_catalog_is_unavailable() {
        let fx = fixture();
        let calls = Calls::default();
        let inactive = || false;

        let err = Relauncher::new(
            &fx.ctx,
            &inactive,
            &Catalog(&calls, vec![]),
            &Resolver { calls: &calls, library: fx.library.clone() },
            &Configure { calls: &calls, java: None },
            &Recording::default(),
        )
        .run()
        .unwrap_err();

        assert!(matches!(err, RelaunchError::CatalogUnavailable(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn configures_then_relaunches() {
        let fx = fixture();
        let calls = Calls::default();
        let inactive = || false;
        let terminator = Recording::default();
        // /bin/true ignores the JVM arguments and exits 0.
        let java = Path::new("/bin/true").to_path_buf();

        let outcome = Relauncher::new(
            &fx.ctx,
            &inactive,
            &catalog(&calls),
            &Resolver { calls: &calls, library: fx.library.clone() },
            &Configure { calls: &calls, java: Some(java) },
            &terminator,
        )
        .with_memory_ceiling_mb(8192)
        .run()
        .unwrap();

        assert_eq!(outcome, RelaunchOutcome::Relaunched(0));
        assert_eq!(terminator.0.get(), Some(0));
        assert_eq!(calls.snapshot(), vec!["catalog", "configure", "resolve"]);

        let saved = RelaunchConfig::load(fx.ctx.config_path());
        assert_eq!(saved.selected_version(), Some("v2"));
        assert_eq!(saved.latest_version(), Some("v3"));
        assert!(fx.temp.path().join("cache/wrapper").join(WRAPPER_CLASS).is_file());

        // A complete config skips the configurator on the next run.
        let calls = Calls::default();
        Relauncher::new(
            &fx.ctx,
            &inactive,
            &catalog(&calls),
            &Resolver { calls: &calls, library: fx.library.clone() },
            &Configure { calls: &calls, java: None },
            &Recording::default(),
        )
        .run()
        .unwrap();
        assert_eq!(calls.snapshot(), vec!["catalog", "resolve"]);
    }
}
