//! Configuration handling for the fuzz driver.
//!
//! This module reads the session and driver settings from a YAML file and
//! applies environment variable overrides on top.

use anyhow::{Context, Result};
use fuzz_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Fuzz driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzConfig {
    /// Transport settings for the session under test
    pub session: SessionConfig,
    /// Replay settings
    #[serde(default)]
    pub driver: DriverConfig,
}

/// Replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Payload file or directory
    pub input: Option<PathBuf>,
    /// Passes over the payload list
    pub rounds: u32,
    /// Pause between sends, humantime format (e.g. `250ms`)
    pub delay: Option<String>,
    /// Read one reply after every send
    pub expect_reply: bool,
    /// Stream override for every send
    pub stream_id: Option<u16>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            input: None,
            rounds: 1,
            delay: None,
            expect_reply: false,
            stream_id: None,
        }
    }
}

impl DriverConfig {
    /// Parsed inter-send delay
    pub fn delay(&self) -> Result<Duration> {
        match &self.delay {
            Some(text) => humantime::parse_duration(text)
                .with_context(|| format!("invalid driver delay '{}'", text)),
            None => Ok(Duration::ZERO),
        }
    }
}

impl FuzzConfig {
    /// Load configuration from file and environment variables
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let mut config: FuzzConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        info!("Loaded configuration from {:?}", path);

        config.apply_overrides(|key| std::env::var(key).ok());
        config.session.validate()?;
        config.driver.delay()?;

        info!(
            "Final fuzz configuration: target={}:{}, server={}, auto_reopen={}, timeout={:?}",
            config.session.target_host,
            config.session.target_port,
            config.session.server,
            config.session.auto_reopen,
            config.session.timeout
        );

        Ok(config)
    }

    /// Apply `FUZZ_*` overrides from the given lookup
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FUZZ_TARGET_HOST") {
            self.session.target_host = host;
            info!("Target host overridden by environment: {}", self.session.target_host);
        }

        if let Some(value) = lookup("FUZZ_TARGET_PORT") {
            match value.parse::<u16>() {
                Ok(port) => {
                    self.session.target_port = port;
                    info!("Target port overridden by environment: {}", port);
                }
                Err(e) => warn!("Ignoring FUZZ_TARGET_PORT '{}': {}", value, e),
            }
        }

        if let Some(value) = lookup("FUZZ_TIMEOUT") {
            match value.parse::<f64>().ok().and_then(|s| Duration::try_from_secs_f64(s).ok()) {
                Some(timeout) => {
                    self.session.timeout = timeout;
                    info!("Timeout overridden by environment: {:?}", timeout);
                }
                None => warn!("Ignoring FUZZ_TIMEOUT '{}': not a number of seconds", value),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_load_from_file() {
        let temp_file = write_config(
            r#"
session:
  target_host: 192.0.2.10
  target_port: 2905
  source_port: 2906
  timeout: 0.5
  auto_reopen: false
  streamid: 3
  ppid: 3

driver:
  input: ./corpus
  rounds: 10
  delay: 250ms
  expect_reply: true
"#,
        );

        let config = FuzzConfig::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config.session.target_host, "192.0.2.10");
        assert_eq!(config.session.target_port, 2905);
        assert_eq!(config.session.source_port, Some(2906));
        assert_eq!(config.session.timeout, Duration::from_millis(500));
        assert!(!config.session.auto_reopen);
        assert_eq!(config.session.stream_id, 3);
        assert_eq!(config.driver.input, Some(PathBuf::from("./corpus")));
        assert_eq!(config.driver.rounds, 10);
        assert_eq!(config.driver.delay().unwrap(), Duration::from_millis(250));
        assert!(config.driver.expect_reply);
        assert_eq!(config.driver.stream_id, None);
    }

    #[test]
    fn test_driver_section_optional() {
        let temp_file = write_config(
            r#"
session:
  target_host: "::1"
  target_port: 9
"#,
        );

        let config = FuzzConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.driver, DriverConfig::default());
        assert_eq!(config.driver.delay().unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FuzzConfig::load_from_file(dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_file = write_config(
            r#"
session:
  target_host: 192.0.2.10
  target_port: 9
  recv_buffer: 0
"#,
        );
        assert!(FuzzConfig::load_from_file(temp_file.path()).is_err());

        let temp_file = write_config(
            r#"
session:
  target_host: 192.0.2.10
  target_port: 9
driver:
  delay: soon
"#,
        );
        assert!(FuzzConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = FuzzConfig {
            session: SessionConfig::new("192.0.2.10", 9),
            driver: DriverConfig::default(),
        };
        let env: HashMap<&str, &str> = [
            ("FUZZ_TARGET_HOST", "2001:db8::5"),
            ("FUZZ_TARGET_PORT", "3868"),
            ("FUZZ_TIMEOUT", "2.5"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.session.target_host, "2001:db8::5");
        assert_eq!(config.session.target_port, 3868);
        assert_eq!(config.session.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_bad_environment_values_ignored() {
        let mut config = FuzzConfig {
            session: SessionConfig::new("192.0.2.10", 9),
            driver: DriverConfig::default(),
        };

        config.apply_overrides(|key| match key {
            "FUZZ_TARGET_PORT" => Some("70000".to_string()),
            "FUZZ_TIMEOUT" => Some("-1".to_string()),
            _ => None,
        });

        assert_eq!(config.session.target_port, 9);
        assert_eq!(config.session.timeout, fuzz_session::DEFAULT_TIMEOUT);
    }
}
