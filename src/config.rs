//! Application configuration.
//!
//! Values come from `config.toml`, then the environment (a `.env` file is
//! loaded first if present), then built-in defaults.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== Config File ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
  database: Option<DatabaseConfig>,
  server: Option<ServerConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseConfig {
  path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerConfig {
  addr: Option<String>,
  port: Option<u16>,
}

fn load_config_file() -> AppConfig {
  let Ok(contents) = std::fs::read_to_string("config.toml") else {
    return AppConfig::default();
  };
  match parse_config(&contents) {
    Ok(config) => config,
    Err(e) => {
      tracing::warn!("Ignoring malformed config.toml: {}", e);
      AppConfig::default()
    }
  }
}

fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(contents)
}

// ==================== Database Configuration ====================

/// Default database location
pub const DEFAULT_DATABASE_PATH: &str = "data/study.db";

/// Load database path with priority: config.toml > .env / DATABASE_PATH > default
pub fn load_database_path() -> PathBuf {
  let _ = dotenvy::dotenv();

  if let Some(path) = load_config_file().database.and_then(|db| db.path) {
    tracing::info!("Using database from config.toml: {}", path);
    return PathBuf::from(path);
  }

  if let Ok(path) = std::env::var("DATABASE_PATH") {
    tracing::info!("Using database from DATABASE_PATH env: {}", path);
    return PathBuf::from(path);
  }

  let default = PathBuf::from(DEFAULT_DATABASE_PATH);
  tracing::info!("Using default database path: {}", default.display());
  default
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3000;

/// Full bind address with priority: config.toml > SERVER_ADDR / PORT env > defaults
pub fn server_bind_addr() -> String {
  let _ = dotenvy::dotenv();
  let server = load_config_file().server.unwrap_or_default();

  let addr = server
    .addr
    .or_else(|| std::env::var("SERVER_ADDR").ok())
    .unwrap_or_else(|| SERVER_ADDR.to_string());
  let port = server
    .port
    .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
    .unwrap_or(SERVER_PORT);

  format!("{}:{}", addr, port)
}

// ==================== Attempt Configuration ====================

/// Quiz attempts expire after this many hours without access
pub const ATTEMPT_EXPIRY_HOURS: i64 = 6;

/// Probability threshold for attempt cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each attempt access
pub const ATTEMPT_CLEANUP_THRESHOLD: u8 = 25;

// ==================== Query Limits ====================

/// Default limit for due flashcard queries
pub const DEFAULT_DUE_LIMIT: usize = 50;

/// Hard cap on due flashcard queries
pub const MAX_DUE_LIMIT: usize = 500;
