//! Store Config

use std::path::PathBuf;

use clap::Args;

/// Where records are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    /// Process memory; nothing survives a restart.
    Memory,

    /// One JSON file per collection in the data directory.
    #[default]
    File,

    /// `PostgreSQL` JSONB tables.
    Postgres,
}

/// Store settings.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Persistence backend (memory, file, postgres)
    #[arg(long = "store", env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::File)]
    pub backend: StoreBackend,

    /// Directory holding the JSON collection files
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// `PostgreSQL` connection string, required by the postgres backend
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: PathBuf::from("./data"),
            database_url: None,
        }
    }
}
