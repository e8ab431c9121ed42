use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use refbookd::error::{RefbookdError, Result};
use refbookd::lookup::LookupService;
use refbookd::persist::{PersistenceMode, SqliteCatalog};
use refbookd::seed;
use refbookd::server;

/// Process settings, read from an optional `refbookd.toml` in the
/// working directory and `REFBOOKD_`-prefixed environment variables.
#[derive(Debug, Deserialize)]
struct Settings {
    #[serde(default = "default_listen")]
    listen: String,
    #[serde(default = "default_database_path")]
    database_path: String,
    #[serde(default)]
    recreate_database_on_startup: bool,
    #[serde(default)]
    seed_file: Option<PathBuf>,
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_owned()
}

fn default_database_path() -> String {
    "refbookd.db".to_owned()
}

impl Settings {
    fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name("refbookd").required(false))
            .add_source(Environment::with_prefix("REFBOOKD").try_parsing(true))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| RefbookdError::Config(e.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("refbookd=info")),
        )
        .init();

    let settings = Settings::load()?;

    if settings.recreate_database_on_startup {
        match fs::remove_file(&settings.database_path) {
            Ok(()) => info!(path = %settings.database_path, "removed existing database"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(RefbookdError::Config(format!(
                    "could not remove {}: {e}",
                    settings.database_path
                )));
            }
        }
    }

    let mode = if settings.database_path == ":memory:" {
        PersistenceMode::InMemory
    } else {
        PersistenceMode::File(PathBuf::from(&settings.database_path))
    };
    let catalog = SqliteCatalog::new(mode)?;

    if let Some(seed_file) = &settings.seed_file {
        seed::load_file(&catalog, seed_file)?;
    }

    let lookup = LookupService::new(Arc::new(catalog));
    let app = server::router(lookup);

    let listener = tokio::net::TcpListener::bind(&settings.listen)
        .await
        .map_err(|e| RefbookdError::Config(format!("could not bind {}: {e}", settings.listen)))?;
    info!(listen = %settings.listen, "refbookd serving");
    axum::serve(listener, app)
        .await
        .map_err(|e| RefbookdError::Server(e.to_string()))?;
    Ok(())
}
