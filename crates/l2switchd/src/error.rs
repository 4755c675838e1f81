//! Error types for l2switchd

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use l2switch_types::ParseError;

/// Frame decoding errors.
///
/// These never leave the receive loop: a frame that fails to decode is
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Buffer is shorter than the header or payload being decoded.
    #[error("frame truncated: need {needed} bytes, got {actual}")]
    Truncated {
        /// Minimum length required.
        needed: usize,
        /// Length of the buffer.
        actual: usize,
    },
}

/// Per-switch configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The file has no priority line.
    #[error("configuration is empty, expected a bridge priority on line 1")]
    MissingPriority,

    /// The first line is not an unsigned integer.
    #[error("invalid bridge priority on line 1: {0}")]
    InvalidPriority(#[source] ParseError),

    /// A port line does not have the `<name> <vlan|T>` shape.
    #[error("malformed line {line}: '{content}'")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// The VLAN column is neither a valid VLAN id nor `T`.
    #[error("line {line}: {source}")]
    InvalidAssignment {
        /// 1-based line number.
        line: usize,
        /// Why the token was rejected.
        #[source]
        source: ParseError,
    },

    /// The same port name appears twice.
    #[error("line {line}: port '{port}' is configured more than once")]
    DuplicatePort {
        /// 1-based line number of the second occurrence.
        line: usize,
        /// The port name.
        port: String,
    },

    /// A configured port does not exist on the link layer.
    #[error("unknown port '{0}' in configuration")]
    UnknownPort(String),

    /// A link-layer port has no VLAN assignment.
    #[error("port '{0}' has no VLAN assignment")]
    MissingPort(String),
}

/// Errors surfaced by the switch runtime.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Link layer setup or receive failure
    #[error("link error on {port}: {source}")]
    Link {
        /// Port name, or `*` when not tied to a single port.
        port: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Every port of the link layer has been closed.
    #[error("link layer closed")]
    LinkClosed,

    /// Invalid command line argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SwitchError {
    /// Creates a link error for the named port.
    pub fn link(port: impl Into<String>, source: io::Error) -> Self {
        Self::Link {
            port: port.into(),
            source,
        }
    }
}

/// Result type for l2switchd operations
pub type Result<T> = std::result::Result<T, SwitchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_display() {
        let err = FrameError::Truncated {
            needed: 14,
            actual: 3,
        };
        assert_eq!(err.to_string(), "frame truncated: need 14 bytes, got 3");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MalformedLine {
            line: 3,
            content: "r-0".to_string(),
        };
        assert_eq!(err.to_string(), "malformed line 3: 'r-0'");
        assert_eq!(
            ConfigError::UnknownPort("rr-9-9".to_string()).to_string(),
            "unknown port 'rr-9-9' in configuration"
        );
    }

    #[test]
    fn test_switch_error_wraps_config() {
        let err: SwitchError = ConfigError::MissingPriority.into();
        assert!(err.to_string().starts_with("configuration error:"));
    }
}
