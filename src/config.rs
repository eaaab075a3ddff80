use failure::Fail;
use log::LevelFilter;
use serde::Deserialize;
use std::{collections::HashMap, fs, net::{Ipv4Addr, SocketAddr}, time::Duration};

pub fn load(path: &str) -> crate::Result<Config> {
    let data = fs::read(path).map_err(ReadConfigurationError)?;
    toml::from_slice(&data).map_err(|e| ConfigurationError(e).into())
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server: Server,
    pub database: Option<Database>,
    #[serde(default)]
    pub workflow: Workflow,
    #[serde(default)]
    pub logging: Logging,
    pub sentry: Option<Sentry>,
}

impl Config {
    /// Validate configuration correctness.
    pub fn validate(&self) -> Result<(), failure::Error> {
        self.workflow.validate()?;

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    /// Address on which to listen.
    #[serde(default = "default_address")]
    pub address: SocketAddr,
    /// Domain (host name) of this server.
    pub domain: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

/// Tuning of the transition engine and the expiry sweeper.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Workflow {
    /// How long, in milliseconds, a transition may wait for another
    /// transition on the same content item before giving up.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout: u64,
    /// Seconds between two runs of the expiry sweeper.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,
}

impl Workflow {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    fn validate(&self) -> Result<(), InvalidWorkflowConfig> {
        if self.lock_timeout == 0 {
            return Err(InvalidWorkflowConfig("lock-timeout"));
        }
        if self.sweep_interval == 0 {
            return Err(InvalidWorkflowConfig("sweep-interval"));
        }
        Ok(())
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Workflow {
            lock_timeout: default_lock_timeout(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Logging {
    /// Default logging level.
    #[serde(default = "default_level_filter")]
    pub level: LevelFilter,
    /// Actix-web logging level.
    pub network: Option<LevelFilter>,
    /// Custom filters.
    #[serde(default)]
    pub filters: HashMap<String, LevelFilter>,
}

/// Sentry.io configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Sentry {
    /// Client key.
    pub dsn: String,
}

#[derive(Debug, Fail)]
#[fail(display = "Cannot read configuration file")]
pub struct ReadConfigurationError(#[fail(cause)] std::io::Error);

#[derive(Debug, Fail)]
#[fail(display = "Invalid configuration: {}", _0)]
pub struct ConfigurationError(#[fail(cause)] toml::de::Error);

#[derive(Debug, Fail)]
#[fail(display = "Invalid configuration: workflow.{} must be greater than zero", _0)]
pub struct InvalidWorkflowConfig(&'static str);

/// Default address (127.0.0.1:80).
fn default_address() -> SocketAddr {
    (Ipv4Addr::LOCALHOST, 80).into()
}

fn default_lock_timeout() -> u64 {
    2000
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: default_level_filter(),
            network: None,
            filters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_defaults() {
        let config: Config = toml::from_str(r#"
            [server]
            domain = "pressroom.test"
        "#).unwrap();

        assert_eq!(config.workflow.lock_timeout(), Duration::from_secs(2));
        assert_eq!(config.workflow.sweep_interval(), Duration::from_secs(60));
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let config: Config = toml::from_str(r#"
            [server]
            domain = "pressroom.test"

            [workflow]
            sweep-interval = 0
        "#).unwrap();

        assert!(config.validate().is_err());
    }
}
