use crate::constants::{DEFAULT_IO_MAX_SIZE, DEFAULT_TIMEOUT, KERBEROS_PORT};
use crate::error::KrbError;
use crate::transport::Transport;
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::error;

fn default_port() -> u16 {
    KERBEROS_PORT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_reply_size() -> usize {
    DEFAULT_IO_MAX_SIZE
}

/// How to reach the KDC for a salt probe.
///
/// ```toml
/// kdc = "dc1.example.com"
/// realm = "EXAMPLE.COM"
/// transport = "udp"
/// timeout_secs = 5
/// heuristic_fallback = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    pub kdc: Option<String>,
    pub realm: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub transport: Transport,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_reply_size")]
    pub max_reply_size: usize,
    /// Use the host salt convention when the KDC can't be reached.
    #[serde(default)]
    pub heuristic_fallback: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            kdc: None,
            realm: None,
            port: default_port(),
            transport: Transport::default(),
            timeout_secs: default_timeout_secs(),
            max_reply_size: default_max_reply_size(),
            heuristic_fallback: false,
        }
    }
}

impl ProbeConfig {
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<ProbeConfig, KrbError> {
        let mut contents = String::new();
        let mut f = fs::File::open(&path).map_err(|err| {
            error!(?err, path = %path.as_ref().display(), "unable to open config");
            KrbError::ConfigError
        })?;
        f.read_to_string(&mut contents).map_err(|err| {
            error!(?err, path = %path.as_ref().display(), "unable to read config");
            KrbError::ConfigError
        })?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<ProbeConfig, KrbError> {
        let config: ProbeConfig = toml::from_str(contents).map_err(|err| {
            error!(?err);
            KrbError::ConfigError
        })?;

        if config.max_reply_size == 0 {
            error!("max_reply_size must be greater than 0");
            return Err(KrbError::ConfigError);
        }

        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
