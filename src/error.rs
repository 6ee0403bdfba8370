use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while loading the tokenizer grammar.
///
/// Any of these degrades the session to no-op mode for document features;
/// none of them terminates the server.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("failed to read grammar file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse grammar {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("grammar {0} defines no keywords or types")]
    Empty(String),
}

/// Failures while fetching or merging the client's workspace configuration.
///
/// The session never distinguishes these from "not yet loaded": the
/// configuration-loaded latch simply stays closed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("workspace/configuration request failed: {0}")]
    Fetch(String),

    #[error("workspace/configuration request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid value for configuration key '{key}': {source}")]
    Invalid {
        /// Dotted path, e.g. `compiler.reportWarnings`
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let error = ConfigError::Fetch("connection closed".into());
        assert_eq!(
            error.to_string(),
            "workspace/configuration request failed: connection closed"
        );
    }

    #[test]
    fn test_invalid_key_display() {
        let source = serde_json::from_str::<bool>("\"yes\"").unwrap_err();
        let error = ConfigError::Invalid {
            key: "compiler.enabled".into(),
            source,
        };
        assert!(
            error
                .to_string()
                .starts_with("invalid value for configuration key 'compiler.enabled'")
        );
    }

    #[test]
    fn test_read_error_mentions_path() {
        let error = GrammarError::Read {
            path: PathBuf::from("/tmp/missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(error.to_string().contains("/tmp/missing.toml"));
    }
}
