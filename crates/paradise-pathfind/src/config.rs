//! Configuration for the paradise-pathfind service.

use serde::Deserialize;

/// HTTP listener settings, from the `[serve]` section or
/// `PARADISE__SERVE__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8081".to_string()
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind() {
        assert_eq!(ServeConfig::default().bind, "0.0.0.0:8081");
    }
}
