// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Contract configuration.
//!
//! Loaded from TOML, then optionally overridden from the environment:
//!
//! ```toml
//! [disputes]
//! transitions = "forward_only"
//!
//! [clock]
//! mode = "manual"
//! start = "2025-01-01T00:00:00Z"
//! step_ms = 1000
//! ```

use crate::clock::{Clock, ManualClock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding [`DisputeConfig::transitions`].
pub const ENV_DISPUTE_TRANSITIONS: &str = "WAREHOUSE_DISPUTE_TRANSITIONS";
/// Environment variable overriding [`ClockConfig::mode`].
pub const ENV_CLOCK_MODE: &str = "WAREHOUSE_CLOCK_MODE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContractConfig {
    pub disputes: DisputeConfig,
    pub clock: ClockConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisputeConfig {
    pub transitions: TransitionPolicy,
}

/// How strictly dispute status updates are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may follow any status.
    #[default]
    Permissive,
    /// Only `open -> investigating -> resolved -> closed`, one step at a time.
    ForwardOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    #[default]
    System,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    pub mode: ClockMode,
    /// First reading of a manual clock.
    pub start: DateTime<Utc>,
    /// Milliseconds a manual clock advances per reading.
    pub step_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mode: ClockMode::System,
            // 2025-01-01T00:00:00Z
            start: DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default(),
            step_ms: 1000,
        }
    }
}

impl ClockConfig {
    /// Per-reading step of a manual clock.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidValue`] - `step_ms` is not a representable
    ///   duration, or stepping once from `start` leaves the calendar range.
    pub fn step(&self) -> Result<Duration, ConfigError> {
        i64::try_from(self.step_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .filter(|step| self.start.checked_add_signed(*step).is_some())
            .ok_or_else(|| ConfigError::InvalidValue {
                name: "clock.step_ms".to_owned(),
                value: self.step_ms.to_string(),
            })
    }

    /// Builds the configured clock.
    ///
    /// An unvalidated oversized step yields a manual clock that saturates at
    /// the largest representable instant.
    pub fn build(&self) -> Box<dyn Clock> {
        match self.mode {
            ClockMode::System => Box::new(SystemClock),
            ClockMode::Manual => {
                let step = self.step().unwrap_or(Duration::MAX);
                Box::new(ManualClock::new(self.start, step))
            }
        }
    }
}

impl ContractConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock.step().map(|_| ())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Default configuration with process environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DISPUTE_TRANSITIONS) {
            self.disputes.transitions = parse_variant(ENV_DISPUTE_TRANSITIONS, &value)?;
        }
        if let Some(value) = lookup(ENV_CLOCK_MODE) {
            self.clock.mode = parse_variant(ENV_CLOCK_MODE, &value)?;
        }
        Ok(self)
    }
}

fn parse_variant<T: serde::de::DeserializeOwned>(name: &str, value: &str) -> Result<T, ConfigError> {
    let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized)).map_err(|_| {
        ConfigError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        }
    })
}
