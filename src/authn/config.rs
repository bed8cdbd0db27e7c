use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::CommonConfig;

/// Authentication configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthnConfig {
    /// Whether requests without a principal are authenticated from the
    /// identity headers. Only enable this behind a proxy that strips these
    /// headers from client requests. When disabled, the gate only sees
    /// principals attached by an upstream middleware.
    /// Default: false
    #[serde(default = "AuthnConfig::default_enable")]
    pub enable: bool,

    /// Upper bound for one authentication attempt. A provider that does not
    /// answer in time is treated as a failed authentication.
    /// Default: 30
    #[serde(default = "AuthnConfig::default_timeout_secs")]
    pub timeout_secs: u64,

    /// Header carrying the principal name set by the trusted proxy.
    #[serde(default = "AuthnConfig::default_user_header")]
    pub user_header: String,

    /// Header carrying the comma-separated authorities of the principal.
    #[serde(default = "AuthnConfig::default_authorities_header")]
    pub authorities_header: String,
}

impl CommonConfig for AuthnConfig {
    fn default() -> Self {
        Self {
            enable: Self::default_enable(),
            timeout_secs: Self::default_timeout_secs(),
            user_header: Self::default_user_header(),
            authorities_header: Self::default_authorities_header(),
        }
    }

    fn complete(&mut self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }

        if !self.enable {
            return Ok(());
        }

        if self.user_header.is_empty() {
            bail!("user_header is required");
        }
        if self.authorities_header.is_empty() {
            bail!("authorities_header is required");
        }

        Ok(())
    }
}

impl AuthnConfig {
    fn default_enable() -> bool {
        false
    }

    fn default_timeout_secs() -> u64 {
        30
    }

    fn default_user_header() -> String {
        String::from("X-Forwarded-User")
    }

    fn default_authorities_header() -> String {
        String::from("X-Forwarded-Roles")
    }
}
