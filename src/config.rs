use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

use crate::crypto::shamir::{DEFAULT_THRESHOLD, DEFAULT_TOTAL_SHARES, SharingParams};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub content_dir: String,
    pub database_url: String,
    pub total_shares: u8,
    pub threshold: u8,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Threshold key-escrow file vault on an append-only ledger")]
pub struct Args {
    /// Host to bind to (overrides VAULT_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides VAULT_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where encrypted content is stored (overrides VAULT_CONTENT_DIR)
    #[arg(long)]
    pub content_dir: Option<String>,

    /// Ledger database URL (overrides VAULT_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Shares issued per file key (overrides VAULT_SSS_TOTAL_SHARES)
    #[arg(long)]
    pub total_shares: Option<u8>,

    /// Shares needed to rebuild a file key (overrides VAULT_SSS_THRESHOLD)
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Largest accepted upload body (overrides VAULT_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

/// Read `name` from the environment, falling back to `default` when unset.
fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("VAULT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_or("VAULT_PORT", 3000u16)?;
        let env_content =
            env::var("VAULT_CONTENT_DIR").unwrap_or_else(|_| "./data/content".into());
        let env_db = env::var("VAULT_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/ledger/vault.db".into());
        let env_total = env_or("VAULT_SSS_TOTAL_SHARES", DEFAULT_TOTAL_SHARES)?;
        let env_threshold = env_or("VAULT_SSS_THRESHOLD", DEFAULT_THRESHOLD)?;
        let env_max_upload = env_or("VAULT_MAX_UPLOAD_BYTES", 64 * 1024 * 1024usize)?;

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            content_dir: args.content_dir.unwrap_or(env_content),
            database_url: args.database_url.unwrap_or(env_db),
            total_shares: args.total_shares.unwrap_or(env_total),
            threshold: args.threshold.unwrap_or(env_threshold),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn sharing(&self) -> Result<SharingParams> {
        SharingParams::new(self.total_shares, self.threshold).context("secret sharing parameters")
    }
}
