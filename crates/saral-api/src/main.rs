//! SARAL server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid with
//! `SARAL_*` environment variables, opens the SQLite store, seeds schemes and
//! operator accounts, and serves the JSON API over HTTP.
//!
//! # Citizen hashes
//!
//! Intake channels must never send raw identifiers. To print the salted hash
//! for an identifier read from stdin:
//!
//! ```
//! echo 9876543210 | cargo run -p saral-api --bin saral-server -- --hash-citizen
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use saral_api::{AppState, ServerConfig, seed::seed};
use saral_core::citizen::hash_citizen_id;
use saral_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "SARAL case intake and triage server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the salted hash of a citizen identifier read from stdin and exit.
  #[arg(long)]
  hash_citizen: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SARAL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if cli.hash_citizen {
    let raw = read_stdin_line()?;
    let hash = hash_citizen_id(&raw, &server_cfg.citizen_salt)
      .context("cannot hash citizen identifier")?;
    println!("{hash}");
    return Ok(());
  }

  let store_path = store_location(&server_cfg.store_path)?;
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  seed(&store, &server_cfg)
    .await
    .context("failed to seed reference data")?;

  if server_cfg.mock_otp == ServerConfig::default().mock_otp {
    tracing::warn!("shared mock OTP is the built-in default; set SARAL_MOCK_OTP");
  }

  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg.clone()),
  };

  let app = saral_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn read_stdin_line() -> anyhow::Result<String> {
  use std::io::{self, BufRead};
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim().to_string())
}

/// Resolve the configured store path and make sure its directory exists.
fn store_location(configured: &Path) -> anyhow::Result<PathBuf> {
  let path = expand_tilde(configured);
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent).with_context(|| {
      format!("failed to create store directory {parent:?}")
    })?;
  }
  Ok(path)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_directory_is_created() {
    let root = tempfile::tempdir().unwrap();
    let configured = root.path().join("share/saral/saral.db");

    let path = store_location(&configured).unwrap();
    assert_eq!(path, configured);
    assert!(root.path().join("share/saral").is_dir());
    assert!(!path.exists());

    // Existing directories and bare file names are fine.
    store_location(&configured).unwrap();
    assert_eq!(store_location(Path::new("saral.db")).unwrap(), Path::new("saral.db"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let path = expand_tilde(Path::new("~/x/saral.db"));
    assert_eq!(path, PathBuf::from(home).join("x/saral.db"));
    assert_eq!(expand_tilde(Path::new("/srv/saral.db")), Path::new("/srv/saral.db"));
  }
}
