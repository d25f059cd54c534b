//! Roster server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `ROSTER_*`
//! environment overrides, opens the SQLite store and the media directory,
//! and serves the application over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash`:
//!
//! ```sh
//! cargo run -p roster-server --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use roster_core::registry::Registry;
use roster_image::QrRenderer;
use roster_server::{AppState, ServerConfig, auth::AuthConfig, media::FsBlobStore};
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster student records server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password read from stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();
  tracing_subscriber::fmt().with_env_filter(filter).init();

  let cli = Cli::parse();
  if cli.hash_password {
    println!("{}", hash_password(&read_password()?)?);
    return Ok(());
  }

  let cfg = load_config(cli.config)?;
  serve(cfg).await
}

/// File first, then `ROSTER_*` overrides; `~` is expanded in both paths.
fn load_config(file: PathBuf) -> anyhow::Result<ServerConfig> {
  let mut cfg: ServerConfig = config::Config::builder()
    .add_source(config::File::from(file).required(false))
    .add_source(config::Environment::with_prefix("ROSTER"))
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("invalid configuration")?;

  cfg.store_path = expand_tilde(&cfg.store_path);
  cfg.media_dir = expand_tilde(&cfg.media_dir);
  Ok(cfg)
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("cannot open store {:?}", cfg.store_path))?;
  tokio::fs::create_dir_all(&cfg.media_dir)
    .await
    .with_context(|| format!("cannot create media dir {:?}", cfg.media_dir))?;

  let registry = Registry::new(store, FsBlobStore::new(&cfg.media_dir), QrRenderer);
  let auth = AuthConfig {
    username:      cfg.auth_username.clone(),
    password_hash: cfg.auth_password_hash.clone(),
  };
  let address = format!("{}:{}", cfg.host, cfg.port);
  let state = AppState {
    registry: Arc::new(registry),
    config:   Arc::new(cfg),
    auth:     Arc::new(auth),
  };

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("cannot bind {address}"))?;
  tracing::info!(%address, media_dir = ?state.config.media_dir, "roster listening");

  axum::serve(listener, roster_server::router(state))
    .await
    .context("server error")
}

fn hash_password(password: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2: {e}"))?;
  Ok(hash.to_string())
}

fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
