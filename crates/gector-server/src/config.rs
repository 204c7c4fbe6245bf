//! Server configuration

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// GECToR params file, re-read on every request
    #[serde(default = "default_params_path")]
    pub params_path: PathBuf,

    /// Maximum accepted request body size
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(params_path) = &cli.params_path {
            config.params_path = PathBuf::from(params_path);
        }

        if let Some(host) = &cli.host {
            config.host = host.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        Ok(config)
    }

    /// `host:port` string suitable for parsing into a socket address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            params_path: default_params_path(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_params_path() -> PathBuf {
    PathBuf::from("resources/gector_params.json")
}

fn default_body_limit() -> usize {
    2 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_without_file() {
        let cli = Cli::parse_from(["gector-server", "--config", "/nonexistent/config.yaml"]);
        let config = ServerConfig::load(&cli.config, &cli).unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
    }

    #[test]
    fn test_file_then_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "host: 127.0.0.1\nport: 8000\nparams_path: /etc/gector/params.json\nbody_limit_bytes: 1024\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let cli = Cli::parse_from(["gector-server", "--config", path]);
        let config = ServerConfig::load(path, &cli).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(config.params_path, PathBuf::from("/etc/gector/params.json"));
        assert_eq!(config.body_limit_bytes, 1024);

        let cli = Cli::parse_from([
            "gector-server",
            "--config",
            path,
            "--params_path",
            "params.json",
            "--host",
            "localhost",
            "--port",
            "9090",
            "--debug",
        ]);
        let config = ServerConfig::load(path, &cli).unwrap();
        assert!(cli.debug);
        assert_eq!(config.bind_address(), "localhost:9090");
        assert_eq!(config.params_path, PathBuf::from("params.json"));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "port: [not a port]\n").unwrap();
        let path = path.to_str().unwrap();

        let cli = Cli::parse_from(["gector-server"]);
        assert!(ServerConfig::load(path, &cli).is_err());
    }
}
