use ps2kbc_platform::Tick;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Legacy PC data port.
pub const DEFAULT_DATA_PORT: u16 = 0x60;
/// Legacy PC status/command port.
pub const DEFAULT_COMMAND_PORT: u16 = 0x64;
/// 100ns per port access.
pub const DEFAULT_LATENCY: Tick = 100_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("data port and command port must differ (both are {port:#x})")]
    PortConflict { port: u16 },

    #[error("invalid i8042 config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Construction parameters for an [`crate::I8042Controller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct I8042Config {
    pub data_port: u16,
    pub command_port: u16,
    /// Cost returned by every port access.
    pub latency: Tick,
}

impl Default for I8042Config {
    fn default() -> Self {
        Self {
            data_port: DEFAULT_DATA_PORT,
            command_port: DEFAULT_COMMAND_PORT,
            latency: DEFAULT_LATENCY,
        }
    }
}

impl I8042Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_port == self.command_port {
            return Err(ConfigError::PortConflict {
                port: self.data_port,
            });
        }
        Ok(())
    }

    /// Parses a JSON object; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
