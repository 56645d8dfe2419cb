pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::RelaunchConfig;
pub use crate::core::configure::{ConfigurationRequest, Configurator, HeadlessConfigurator};
pub use crate::core::context::{LaunchArgs, RelaunchContext};
pub use crate::core::error::{RelaunchError, RelaunchResult};
pub use crate::core::extraction::Bundle;
pub use crate::core::launch::{ProcessExitTerminator, Terminator};
pub use crate::core::relauncher::{relaunch, RelaunchOutcome, Relauncher};

/// Install the fmt subscriber. Safe to call when the host already set one.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,relauncher_lib=debug")),
        )
        .try_init();

    if installed.is_ok() {
        tracing::info!("Cleanroom relauncher v{} starting...", env!("CARGO_PKG_VERSION"));
    }
}
