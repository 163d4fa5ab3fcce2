//! Storefront configuration

use clap::Args;

pub mod observability;
pub mod store;

pub use observability::{LogFormat, LoggingConfig};
pub use store::{StoreBackend, StoreConfig};

/// Application settings: where records live and how changes are announced.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Persistence settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Broadcast change notifications to in-process subscribers.
    #[arg(long, env = "LIVE_UPDATES", default_value_t = false)]
    pub live_updates: bool,
}

impl AppConfig {
    /// Process-local configuration with nothing persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                ..StoreConfig::default()
            },
            live_updates: false,
        }
    }
}
