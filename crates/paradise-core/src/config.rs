//! Configuration loading for Paradise services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (PARADISE__ prefix, `__` separator)
//! 2. Config file (paradise.toml by default)
//! 3. Defaults

use serde::de::DeserializeOwned;

use crate::error::{ParadiseError, Result};

/// Environment variable prefix shared by all services.
pub const ENV_PREFIX: &str = "PARADISE";

/// Default config file prefix (resolves `paradise.toml`, `paradise.yaml`, ...).
pub const DEFAULT_FILE_PREFIX: &str = "paradise";

/// Build the layered configuration source for a file prefix.
pub fn layered(file_prefix: &str) -> Result<config::Config> {
    config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ParadiseError::Config(e.to_string()))
}

/// Load one `[section]` of the layered configuration.
///
/// A missing section falls back to `T::default()`; a present but malformed
/// section is an error.
pub fn load_section<T>(file_prefix: &str, section: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let cfg = layered(file_prefix)?;
    match cfg.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => Ok(T::default()),
        Err(e) => Err(ParadiseError::Config(format!("[{section}]: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        bind: String,
    }

    #[test]
    fn missing_section_uses_default() {
        let sample: Sample = load_section("does-not-exist-paradise", "nothing_here").unwrap();
        assert_eq!(sample, Sample::default());
    }
}
