//! Layered configuration loading
//!
//! Configuration is assembled from, in increasing precedence:
//!
//! 1. the `Default` of the target type (fields marked `#[serde(default)]`)
//! 2. an optional TOML file
//! 3. environment variables `<PREFIX>_<KEY>`, with `__` separating nested keys
//!
//! ```text
//! SOFTPHONE_USER_AGENT=Desk/2.0
//! SOFTPHONE_NAT__UDP_KEEPALIVE_SECS=15
//! ```

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::de::DeserializeOwned;

use crate::errors::context::ErrorExt;
use crate::errors::types::{Error, Result};

/// Load a configuration value from an optional TOML file plus environment overrides
pub fn load_config<T: DeserializeOwned>(path: Option<&Path>, env_prefix: &str) -> Result<T> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(Error::Config(format!("config file not found: {}", path.display()))
                .with_context("config", "load"));
        }
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder
        .build()
        .map_err(|e| Error::from(e).with_context("config", "build"))?;

    settings
        .try_deserialize::<T>()
        .map_err(|e| Error::from(e).with_context("config", "deserialize"))
}

/// Parse a configuration value from TOML text, without environment overrides
pub fn from_toml_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;
    use std::path::PathBuf;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        user_agent: String,
        max_calls: u32,
        nat: Nested,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct Nested {
        keepalive: u32,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                user_agent: "Softphone/1.0".to_string(),
                max_calls: 4,
                nat: Nested::default(),
            }
        }
    }

    impl Default for Nested {
        fn default() -> Self {
            Self { keepalive: 25 }
        }
    }

    fn scratch_file(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_from_toml_str_applies_defaults() {
        let sample: Sample = from_toml_str("max_calls = 2").unwrap();
        assert_eq!(sample.max_calls, 2);
        assert_eq!(sample.user_agent, "Softphone/1.0");
        assert_eq!(sample.nat.keepalive, 25);
    }

    #[test]
    fn test_from_toml_str_rejects_garbage() {
        let result: Result<Sample> = from_toml_str("max_calls = [");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_load_file_then_env() {
        let path = scratch_file("infra-load", "user_agent = \"Desk/2.0\"\n[nat]\nkeepalive = 30\n");
        std::env::set_var("INFRATEST_MAX_CALLS", "8");

        let sample: Sample = load_config(Some(&path), "INFRATEST").unwrap();

        std::env::remove_var("INFRATEST_MAX_CALLS");
        let _ = std::fs::remove_file(&path);

        assert_eq!(sample.user_agent, "Desk/2.0");
        assert_eq!(sample.nat.keepalive, 30);
        assert_eq!(sample.max_calls, 8);
    }

    #[test]
    #[serial]
    fn test_missing_file_is_config_error() {
        let missing = std::env::temp_dir().join("definitely-not-here-softphone.toml");
        let result: Result<Sample> = load_config(Some(&missing), "INFRATEST");
        assert!(matches!(result, Err(Error::Config(ref m)) if m.contains("not found")));
    }
}
