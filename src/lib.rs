//! Ballot Registry
//!
//! An owner-administered registry of candidates and voters with a global
//! open/closed switch and a one-vote-per-registered-address tally.

pub mod config;
pub mod errors;
pub mod identity;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use errors::{Error, Result};
pub use registry::{BallotRegistry, RegistryEvent, SharedRegistry};
pub use types::{Address, CandidateId};

use config::LoggingConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with `RUST_LOG`, defaulting to `ballot_registry=info`
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ballot_registry=info".into()),
        )
        .try_init()
        .map_err(|e| internal_error!("Failed to install subscriber: {}", e))?;

    tracing::info!("🗳️  Ballot registry v{} initialized", VERSION);
    Ok(())
}

/// Initialize logging from a [`LoggingConfig`]
///
/// `RUST_LOG` still takes precedence over the configured level.
pub fn init_with_config(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ballot_registry={}", logging.level).into());

    let installed = match logging.format.as_str() {
        "compact" => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .try_init(),
    };
    installed.map_err(|e| internal_error!("Failed to install subscriber: {}", e))?;

    tracing::info!("🗳️  Ballot registry v{} initialized", VERSION);
    Ok(())
}
