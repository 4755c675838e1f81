//! Per-switch configuration file.
//!
//! ```text
//! 14            <- bridge priority
//! r-0 1         <- access port in VLAN 1
//! rr-0-1 T      <- trunk port
//! ```
//!
//! The file is read once at startup. Any malformed content is fatal; the
//! switch never starts with a partial or defaulted configuration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use l2switch_types::{BridgeId, PortAssignment};

use crate::error::ConfigError;

/// Default directory searched for `switch<ID>.cfg` files.
pub const DEFAULT_CONFIG_DIR: &str = "./configs";

/// VLAN assignment of one named port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    pub name: String,
    pub assignment: PortAssignment,
}

/// Parsed per-switch configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchConfig {
    /// Bridge priority; doubles as the bridge id.
    pub priority: BridgeId,
    /// Port assignments in file order.
    pub ports: Vec<PortConfig>,
}

impl SwitchConfig {
    /// Location of the configuration file for `switch_id` inside `dir`.
    pub fn path_for(dir: impl AsRef<Path>, switch_id: u32) -> PathBuf {
        dir.as_ref().join(format!("switch{}.cfg", switch_id))
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: SwitchConfig = text.parse()?;
        info!(
            path = %path.display(),
            priority = %config.priority,
            ports = config.ports.len(),
            "Loaded switch configuration"
        );
        Ok(config)
    }

    /// Returns the assignment configured for `name`.
    pub fn assignment(&self, name: &str) -> Option<PortAssignment> {
        self.ports
            .iter()
            .find(|port| port.name == name)
            .map(|port| port.assignment)
    }
}

impl FromStr for SwitchConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut lines = text.lines().enumerate();

        let (_, first) = lines.next().ok_or(ConfigError::MissingPriority)?;
        let priority = first
            .trim()
            .parse::<BridgeId>()
            .map_err(ConfigError::InvalidPriority)?;

        let mut seen = HashSet::new();
        let mut ports = Vec::new();
        for (idx, raw) in lines {
            let line = idx + 1;
            let content = raw.trim();
            if content.is_empty() {
                continue;
            }

            let mut fields = content.split_whitespace();
            let (name, token) = match (fields.next(), fields.next(), fields.next()) {
                (Some(name), Some(token), None) => (name, token),
                _ => {
                    return Err(ConfigError::MalformedLine {
                        line,
                        content: content.to_string(),
                    })
                }
            };

            let assignment = token
                .parse::<PortAssignment>()
                .map_err(|source| ConfigError::InvalidAssignment { line, source })?;

            if !seen.insert(name) {
                return Err(ConfigError::DuplicatePort {
                    line,
                    port: name.to_string(),
                });
            }

            debug!(port = name, %assignment, "Parsed port assignment");
            ports.push(PortConfig {
                name: name.to_string(),
                assignment,
            });
        }

        Ok(SwitchConfig { priority, ports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l2switch_types::VlanId;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "14\nr-0 1\nr-1 2\nrr-0-1 T\nrr-0-2 T\n";

    #[test]
    fn test_parse_sample() {
        let config: SwitchConfig = SAMPLE.parse().unwrap();
        assert_eq!(config.priority, BridgeId::new(14));
        assert_eq!(config.ports.len(), 4);
        assert_eq!(
            config.assignment("r-1"),
            Some(PortAssignment::Access(VlanId::new(2).unwrap()))
        );
        assert_eq!(config.assignment("rr-0-2"), Some(PortAssignment::Trunk));
        assert_eq!(config.assignment("missing"), None);
    }

    #[test]
    fn test_trailing_blank_lines_and_whitespace() {
        let config: SwitchConfig = "  7 \n e0   10 \n\n t0 T\n\n".parse().unwrap();
        assert_eq!(config.priority, BridgeId::new(7));
        assert_eq!(config.ports.len(), 2);
        assert_eq!(config.ports[1].name, "t0");
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(
            "".parse::<SwitchConfig>(),
            Err(ConfigError::MissingPriority)
        ));
    }

    #[test]
    fn test_bad_priority() {
        assert!(matches!(
            "high\ne0 1\n".parse::<SwitchConfig>(),
            Err(ConfigError::InvalidPriority(_))
        ));
        assert!(matches!(
            "-4\n".parse::<SwitchConfig>(),
            Err(ConfigError::InvalidPriority(_))
        ));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        match "1\ne0 1\ne1\n".parse::<SwitchConfig>() {
            Err(ConfigError::MalformedLine { line, content }) => {
                assert_eq!(line, 3);
                assert_eq!(content, "e1");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            "1\ne0 1 extra\n".parse::<SwitchConfig>(),
            Err(ConfigError::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_assignment() {
        assert!(matches!(
            "1\ne0 trunk\n".parse::<SwitchConfig>(),
            Err(ConfigError::InvalidAssignment { line: 2, .. })
        ));
        assert!(matches!(
            "1\ne0 5000\n".parse::<SwitchConfig>(),
            Err(ConfigError::InvalidAssignment { line: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_port() {
        assert!(matches!(
            "1\ne0 1\ne0 T\n".parse::<SwitchConfig>(),
            Err(ConfigError::DuplicatePort { line: 3, .. })
        ));
    }

    #[test]
    fn test_path_for() {
        assert_eq!(
            SwitchConfig::path_for("/etc/l2switch", 2),
            PathBuf::from("/etc/l2switch/switch2.cfg")
        );
    }
}
