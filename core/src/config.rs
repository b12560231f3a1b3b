//! Engine configuration
//!
//! Per-kind timeouts, the post-completion grace delay and the identifier
//! mismatch policy. Values are plain milliseconds so the struct maps directly
//! onto a JSON config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::gatt::OperationKind;

/// Default GATT operation timeout in milliseconds
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 22_000;

/// Default grace delay after a successful acquire
pub const DEFAULT_GRACE_DELAY_MS: u64 = 1;

/// Grace delays at or above this are rejected by [`EngineConfig::validate`]
pub const MAX_GRACE_DELAY_MS: u64 = 1_000;

/// What a completion callback does when its identifier differs from the
/// operation's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Release the waiter anyway with whatever payload arrived.
    #[default]
    Tolerate,
    /// Drop the callback; the waiter keeps waiting.
    Strict,
}

impl std::fmt::Display for MismatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tolerate => write!(f, "tolerate"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for MismatchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tolerate" => Ok(Self::Tolerate),
            "strict" => Ok(Self::Strict),
            other => Err(ConfigError::InvalidValue {
                key: "mismatch_policy".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Execution engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Characteristic read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Characteristic write timeout (milliseconds)
    pub write_timeout_ms: u64,

    /// Descriptor write timeout (milliseconds)
    pub descriptor_write_timeout_ms: u64,

    /// Sleep after a successful acquire (milliseconds, 0 disables)
    pub grace_delay_ms: u64,

    /// Handling of callbacks carrying a different identifier
    pub mismatch_policy: MismatchPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            descriptor_write_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            grace_delay_ms: DEFAULT_GRACE_DELAY_MS,
            mismatch_policy: MismatchPolicy::Tolerate,
        }
    }
}

impl EngineConfig {
    /// Timeout applied to operations of `kind` that carry no override
    pub fn timeout_for(&self, kind: OperationKind) -> Duration {
        let ms = match kind {
            OperationKind::Read => self.read_timeout_ms,
            OperationKind::Write => self.write_timeout_ms,
            OperationKind::DescriptorWrite => self.descriptor_write_timeout_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }

    /// Check ranges before the config is used or persisted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("read_timeout_ms", self.read_timeout_ms),
            ("write_timeout_ms", self.write_timeout_ms),
            ("descriptor_write_timeout_ms", self.descriptor_write_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }
        if self.grace_delay_ms >= MAX_GRACE_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "grace_delay_ms must be below {}",
                MAX_GRACE_DELAY_MS
            )));
        }
        Ok(())
    }

    /// Set a config value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "read_timeout_ms" => self.read_timeout_ms = value.parse().map_err(|_| invalid())?,
            "write_timeout_ms" => self.write_timeout_ms = value.parse().map_err(|_| invalid())?,
            "descriptor_write_timeout_ms" => {
                self.descriptor_write_timeout_ms = value.parse().map_err(|_| invalid())?
            }
            "grace_delay_ms" => self.grace_delay_ms = value.parse().map_err(|_| invalid())?,
            "mismatch_policy" => self.mismatch_policy = value.parse()?,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Get a config value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "read_timeout_ms" => Some(self.read_timeout_ms.to_string()),
            "write_timeout_ms" => Some(self.write_timeout_ms.to_string()),
            "descriptor_write_timeout_ms" => Some(self.descriptor_write_timeout_ms.to_string()),
            "grace_delay_ms" => Some(self.grace_delay_ms.to_string()),
            "mismatch_policy" => Some(self.mismatch_policy.to_string()),
            _ => None,
        }
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        [
            "read_timeout_ms",
            "write_timeout_ms",
            "descriptor_write_timeout_ms",
            "grace_delay_ms",
            "mismatch_policy",
        ]
        .iter()
        .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
        .collect()
    }
}
