//! Configuration manager for the users API.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");

const fn default_port() -> u16 {
    8080
}

const fn default_timeout() -> u64 {
    10
}

fn default_address() -> String {
    "0.0.0.0".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    #[serde(default)]
    pub name: String,
    /// Public URL the `Location` headers are built on.
    /// Empty means relative locations.
    #[serde(default)]
    pub url: String,
    /// Interface to listen on.
    #[serde(default = "default_address")]
    pub address: String,
    /// Port to listen on, `PORT` environment variable wins.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Expose Prometheus metrics on `/metrics`.
    #[serde(default)]
    pub metrics: bool,
    #[serde(default)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to PostgreSQL configuration.
    /// Users are kept in memory without it.
    #[serde(default, skip_serializing)]
    pub postgres: Option<Postgres>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: String::default(),
            url: String::default(),
            address: default_address(),
            port: default_port(),
            timeout: default_timeout(),
            metrics: false,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            postgres: None,
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        if url.is_empty() {
            return Ok(String::default());
        }

        let url_with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{url}")
        };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let mut config = match File::open(file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file) {
                Ok(config) => config,
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        // set app version.
        config.version = VERSION.to_owned();
        config.url = self.normalize_url(&config.url)?;
        config.port = port_override(std::env::var("PORT").ok().as_deref(), config.port);

        Ok(Arc::new(config))
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, path = %self.path.display(), "`config.yaml` file not usable, using defaults");
        Self::default()
    }
}

fn port_override(env: Option<&str>, port: u16) -> u16 {
    match env.map(str::parse::<u16>) {
        Some(Ok(port)) => port,
        Some(Err(err)) => {
            tracing::warn!(error = %err, "ignoring invalid `PORT` variable");
            port
        },
        None => port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Configuration = serde_yaml::from_str("name: users").unwrap();
        assert_eq!(config.name, "users");
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeout, 10);
        assert!(!config.metrics);
        assert!(config.postgres.is_none());

        let default = Configuration::default();
        assert_eq!(default.port, 8080);
        assert_eq!(default.timeout, 10);
    }

    #[test]
    fn test_postgres_section() {
        let config: Configuration = serde_yaml::from_str(
            "postgres:\n  address: localhost:5432\n  database: users\n  pool_size: 4\n",
        )
        .unwrap();
        let postgres = config.postgres.unwrap();
        assert_eq!(postgres.address, "localhost:5432");
        assert_eq!(postgres.database.as_deref(), Some("users"));
        assert_eq!(postgres.username, None);
        assert_eq!(postgres.pool_size, Some(4));
    }

    #[test]
    fn test_normalize_url() {
        let config = Configuration::default();
        assert_eq!(config.normalize_url("").unwrap(), "");
        assert_eq!(
            config.normalize_url("users.example.com").unwrap(),
            "https://users.example.com/"
        );
        assert_eq!(
            config.normalize_url("http://localhost:8080").unwrap(),
            "http://localhost:8080/"
        );
    }

    #[test]
    fn test_port_override() {
        assert_eq!(port_override(None, 8080), 8080);
        assert_eq!(port_override(Some("3000"), 8080), 3000);
        assert_eq!(port_override(Some("http"), 8080), 8080);
    }

    #[test]
    fn test_read_missing_file() {
        let config = Configuration::default()
            .path(PathBuf::from("does/not/exist.yaml"))
            .read()
            .unwrap();
        assert_eq!(config.timeout, 10);
        assert_eq!(config.version, VERSION);
    }
}
