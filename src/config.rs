use std::path::Path;
use std::{fs, io};

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::authn::config::AuthnConfig;
use crate::authz::config::AuthzConfig;
use crate::logs::LogsConfig;

pub trait CommonConfig {
    fn default() -> Self;
    fn complete(&mut self) -> Result<()>;
}

/// Top-level configuration of a gate.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GateConfig {
    #[serde(default = "AuthnConfig::default")]
    pub authn: AuthnConfig,

    #[serde(default = "AuthzConfig::default")]
    pub authz: AuthzConfig,

    #[serde(default = "LogsConfig::default")]
    pub logs: LogsConfig,
}

impl CommonConfig for GateConfig {
    fn default() -> Self {
        Self {
            authn: AuthnConfig::default(),
            authz: AuthzConfig::default(),
            logs: LogsConfig::default(),
        }
    }

    fn complete(&mut self) -> Result<()> {
        self.authn.complete().context("authn")?;
        self.authz.complete().context("authz")?;
        self.logs.complete().context("logs")?;
        Ok(())
    }
}

/// Reads a TOML config file, falling back to defaults when it does not
/// exist, then validates it.
pub fn load_config<T>(path: &Path) -> Result<T>
where
    T: CommonConfig + DeserializeOwned,
{
    let mut cfg: T = match fs::read_to_string(path) {
        Ok(s) => toml::from_str(&s).context("parse config toml")?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("Config file {} not found, using defaults", path.display());
            T::default()
        }
        Err(err) => {
            return Err(err).context(format!("read config file: {}", path.display()));
        }
    };

    cfg.complete().context("validate config")?;
    Ok(cfg)
}

/// Parses and validates config from a TOML string.
pub fn parse_config<T>(s: &str) -> Result<T>
where
    T: CommonConfig + DeserializeOwned,
{
    let mut cfg: T = toml::from_str(s).context("parse config toml")?;
    cfg.complete().context("validate config")?;
    Ok(cfg)
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}
