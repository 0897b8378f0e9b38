use std::{sync::OnceLock, time::Duration};

use crate::error::{Result, VectoError};

pub const DEFAULT_BASE_URL: &str = "https://api.vecto.ai";

static DEFAULT_CONFIG: OnceLock<Config> = OnceLock::new();

/// Which credential a request is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Data operations: ingest, lookup, analogy, entry deletion.
    User,
    /// Space lifecycle and account operations.
    Management,
}

/// Connection settings for the service.
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub user_token: Option<String>,
    pub management_token: Option<String>,
    /// Forwarded to the HTTP client as a per-request deadline.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_token: None,
            management_token: None,
            timeout: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("user_token", &self.user_token.as_ref().map(|_| "<redacted>"))
            .field(
                "management_token",
                &self.management_token.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_user_token(mut self, token: impl Into<String>) -> Self {
        self.user_token = Some(token.into());
        self
    }

    pub fn with_management_token(mut self, token: impl Into<String>) -> Self {
        self.management_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reads `VECTO_BASE_URL`, `VECTO_API_KEY`, `VECTO_MANAGEMENT_TOKEN` and
    /// `VECTO_TIMEOUT_SECS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("VECTO_BASE_URL") {
            config.base_url = url;
        }
        config.user_token = lookup("VECTO_API_KEY").filter(|t| !t.is_empty());
        config.management_token = lookup("VECTO_MANAGEMENT_TOKEN").filter(|t| !t.is_empty());
        if let Some(secs) = lookup("VECTO_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                VectoError::Config(format!("VECTO_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Picks the credential for `kind`. User operations fall back to the
    /// management token; management operations never use the user token.
    pub fn token(&self, kind: TokenKind) -> Result<&str> {
        let token = match kind {
            TokenKind::User => self.user_token.as_ref().or(self.management_token.as_ref()),
            TokenKind::Management => self.management_token.as_ref(),
        };
        token.map(String::as_str).ok_or_else(|| {
            VectoError::Config(match kind {
                TokenKind::User => "no user or management token configured".to_string(),
                TokenKind::Management => "no management token configured".to_string(),
            })
        })
    }
}

/// Installs the process-wide default used by [`crate::Vecto::from_default`].
///
/// Succeeds once per process; a second call hands the rejected config back.
/// Configure before issuing concurrent calls, or pass explicit configs instead.
pub fn set_default_config(config: Config) -> std::result::Result<(), Config> {
    DEFAULT_CONFIG.set(config)
}

pub fn default_config() -> Option<&'static Config> {
    DEFAULT_CONFIG.get()
}
