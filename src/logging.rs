//! Purpose: Install a `tracing` subscriber for the library and the CLI.
//! Exports: `init_from_env`, `init_cli`, `LOG_ENV`.
//! Role: Optional; a host process that owns logging simply never calls these.
//! Invariants: Output goes to stderr so stdout stays reserved for replies.
//! Invariants: Installing twice is a no-op.
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "OSRM_MARSHAL_LOG";

/// Installs a subscriber only when `OSRM_MARSHAL_LOG` is set.
pub fn init_from_env() {
    let Ok(env_filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return;
    };
    install(env_filter);
}

/// `OSRM_MARSHAL_LOG` wins over the verbosity flag when set.
pub fn init_cli(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    install(env_filter);
}

fn install(env_filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
