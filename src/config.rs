use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub blob_timeout_secs: u64,
    /// Cap on a fetched blob body; `None` follows the upload policy.
    pub blob_max_bytes: Option<u64>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "File sharing service with public links and download counters")]
pub struct Args {
    /// Host to bind to (overrides FILE_SHARE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_SHARE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides FILE_SHARE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Timeout for fetching blobs during downloads, in seconds
    /// (overrides FILE_SHARE_BLOB_TIMEOUT_SECS)
    #[arg(long)]
    pub blob_timeout_secs: Option<u64>,

    /// Largest blob body relayed on download, in bytes
    /// (overrides FILE_SHARE_BLOB_MAX_BYTES; defaults to the upload size limit)
    #[arg(long)]
    pub blob_max_bytes: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    /// Flags win over environment variables, which win over defaults.
    fn merge(args: Args) -> Result<Self> {
        let env_host = env::var("FILE_SHARE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_or("FILE_SHARE_PORT", 3000)?;
        let env_db = env::var("FILE_SHARE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/file_share.db".into());
        let env_timeout = env_or("FILE_SHARE_BLOB_TIMEOUT_SECS", 30)?;
        let env_max_bytes = env_opt("FILE_SHARE_BLOB_MAX_BYTES")?;

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            blob_timeout_secs: args.blob_timeout_secs.unwrap_or(env_timeout),
            blob_max_bytes: args.blob_max_bytes.or(env_max_bytes),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn blob_timeout(&self) -> Duration {
        Duration::from_secs(self.blob_timeout_secs)
    }
}

/// Read and parse `key`, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(env_opt(key)?.unwrap_or(default))
}

fn env_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}
