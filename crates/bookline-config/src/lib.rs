//! Application configuration for the Bookline server.
//!
//! Configuration is layered: defaults, then an optional `bookline.toml`
//! file, then `BOOKLINE__`-prefixed environment variables (double
//! underscore as the section separator, e.g. `BOOKLINE__SERVER__PORT`).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.request_timeout_ms == 0 {
            return Err("server.request_timeout_ms must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.notify.max_attempts == 0 {
            return Err("notify.max_attempts must be > 0".into());
        }
        if self.notify.retry_base_delay_ms == 0 {
            return Err("notify.retry_base_delay_ms must be > 0".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.server.request_timeout_ms))
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.notify.retry_base_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u32,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout_ms() -> u32 {
    15_000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Settings for the event fan-out dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Delivery attempts per channel, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    200
}
impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("bookline.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., BOOKLINE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("BOOKLINE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.notify.max_attempts, 3);
    }

    #[test]
    fn test_addr_falls_back_to_unspecified_on_bad_host() {
        let mut config = AppConfig::default();
        config.server.host = "not-an-ip".into();
        assert_eq!(config.addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_retry_settings() {
        let mut config = AppConfig::default();
        config.notify.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.notify.retry_base_delay_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [notify]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.server.port, 9090);
        assert_eq!(parsed.server.host, "0.0.0.0");
        assert_eq!(parsed.notify.max_attempts, 5);
        assert_eq!(parsed.notify.retry_base_delay_ms, 200);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_loader_reads_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "[server]\nport = 3000\n[logging]\nlevel = \"debug\"").unwrap();

        let config = loader::load_config(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_loader_missing_file_uses_defaults() {
        let config = loader::load_config(Some("/nonexistent/bookline.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
