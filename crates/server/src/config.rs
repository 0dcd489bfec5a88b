use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Worker threads for the parallel comparison mode.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Path of the fixed reference image every upload is compared to.
    ///
    /// Injected configuration, loaded once at startup; the comparison
    /// engine itself never touches the filesystem.
    #[serde(default = "default_reference_image_path")]
    pub reference_image_path: PathBuf,

    /// Log level / env-filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            worker_count: default_worker_count(),
            reference_image_path: default_reference_image_path(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `fragsim.toml` file and
    /// `FRAGSIM_SERVER_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("fragsim").required(false))
            .add_source(config::Environment::with_prefix("FRAGSIM_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the worker pool would refuse at runtime.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_count == 0 {
            anyhow::bail!("worker_count must be at least 1");
        }
        Ok(())
    }

    /// Get the socket address to bind to.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr.parse()?)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_worker_count() -> usize {
    fragsim::DEFAULT_WORKER_COUNT
}

fn default_reference_image_path() -> PathBuf {
    PathBuf::from("reference.png")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.worker_count, 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let cfg = ServerConfig {
            worker_count: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn socket_addr_parses() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().expect("addr");
        assert_eq!(addr.port(), 8080);
    }
}
