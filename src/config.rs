//! Remote backend configuration and per-call backend resolution.
//!
//! The hosted table is enabled by two settings: a base endpoint and an access
//! credential. When either is missing, every operation runs against the local
//! store. Settings are re-read on each resolution, so configuration changes
//! take effect on the next call without restarting.

use log::{debug, error};

use crate::remote::{RemoteClientBuilder, RemoteError, RemoteSource};

/// Environment variable naming the service base URL.
pub const URL_ENV: &str = "SUPABASE_URL";
/// Environment variable holding the access credential.
pub const KEY_ENV: &str = "SUPABASE_KEY";

/// Settings needed to reach the hosted notes table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base endpoint of the hosted service.
    pub url: String,
    /// Access credential.
    pub key: String,
}

impl RemoteConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Returns `None` when either variable is unset or blank.
    pub fn from_env() -> Option<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Some(Self {
            url: read(URL_ENV)?,
            key: read(KEY_ENV)?,
        })
    }

    /// Builds a client for this configuration.
    pub fn connect(&self) -> Result<Box<dyn RemoteSource>, RemoteError> {
        let client = RemoteClientBuilder::new()
            .base_url(&self.url)
            .api_key(&self.key)
            .build()?;
        Ok(Box::new(client))
    }
}

/// Loads a `.env` file from the working directory or its parents, if present.
///
/// Values already set in the environment win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => error!("failed to read .env file: {e}"),
    }
}

/// Decides, at the start of each operation, whether a remote source is usable.
pub trait RemoteProvider {
    /// Returns a remote source, or `None` to use the local store for this call.
    fn connect(&self) -> Option<Box<dyn RemoteSource>>;
}

/// Resolves the remote source from the `SUPABASE_URL` / `SUPABASE_KEY` environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvRemoteProvider;

impl RemoteProvider for EnvRemoteProvider {
    fn connect(&self) -> Option<Box<dyn RemoteSource>> {
        let Some(config) = RemoteConfig::from_env() else {
            debug!("{URL_ENV} or {KEY_ENV} not set; using local store");
            return None;
        };
        match config.connect() {
            Ok(remote) => Some(remote),
            Err(e) => {
                error!("failed to create remote client, using local store: {e}");
                None
            }
        }
    }
}

/// Never connects; all operations use the local store.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOnly;

impl RemoteProvider for LocalOnly {
    fn connect(&self) -> Option<Box<dyn RemoteSource>> {
        None
    }
}
