//! Error types shared by lightwatch crates.

use thiserror::Error;

/// Result type alias for resource-control client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by a resource-control client.
///
/// `Clone + PartialEq` so monitor results carrying a cause compare
/// structurally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("service error ({code}): {message}")]
    Service { code: String, message: String },

    #[error("malformed response: {message}")]
    Malformed { message: String },
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Parse the stderr of a failed `aws` invocation.
    ///
    /// The CLI reports service failures as
    /// `An error occurred (Code) when calling the Op operation: message`.
    /// Anything else (credential lookup, network) becomes `Transport`.
    pub fn from_cli_stderr(stderr: &str) -> Self {
        let text = stderr.trim();

        if let Some((_, rest)) = text.split_once("An error occurred (")
            && let Some((code, tail)) = rest.split_once(')')
        {
            let message = tail
                .split_once(": ")
                .and_then(|(_, m)| m.lines().next())
                .unwrap_or_default()
                .trim();
            return Self::service(code, message);
        }

        if text.is_empty() {
            Self::transport("aws cli exited with an error and no output")
        } else {
            Self::transport(text)
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },
}
