// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The "contracts disabled" switch.
//!
//! Checking is configured once per process, before the first contract is
//! attached. A disabled configuration turns every attachment into a no-op
//! that hands back its input unchanged, so disabled contracts cost nothing at
//! call time: there is no per-call flag to test.
//!
//! ```text
//!   COVENANT_CONTRACTS ──▶ Config::from_env ─┐
//!   JSON document      ──▶ Config::from_json ┼─▶ config::init ──▶ Contracts::global
//!   (nothing)          ──▶ Config::default ──┘       (once)
//! ```

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::AttachmentError;
use crate::function::{Attach, Function};
use crate::invariant::{Invariant, TypeDef};

/// Environment variable read when no configuration was installed.
pub const ENV_VAR: &str = "COVENANT_CONTRACTS";

/// Boundary configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attach and check contracts. Enabled unless turned off.
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Read [`ENV_VAR`]: `on`, `off`, `1`, `0`, `true` or `false`.
    /// Unset means the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(ENV_VAR) {
            Ok(value) => Self::parse_switch(&value),
            Err(_) => Ok(Self::default()),
        }
    }

    fn parse_switch(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "on" | "1" | "true" => Ok(Self { enabled: true }),
            "off" | "0" | "false" => Ok(Self::disabled()),
            _ => Err(ConfigError::InvalidEnv {
                value: value.to_string(),
            }),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("COVENANT_CONTRACTS must be one of on, off, 1, 0, true, false (got {value:?})")]
    InvalidEnv { value: String },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The process-wide configuration was already installed or read.
    #[error("contract configuration is already installed")]
    AlreadyInstalled,
}

static GLOBAL: OnceLock<Config> = OnceLock::new();

/// Install the process-wide configuration.
///
/// Must run before the first attachment: the first attachment reads the
/// environment and fixes the configuration for the rest of the process.
pub fn init(config: Config) -> Result<(), ConfigError> {
    GLOBAL
        .set(config)
        .map_err(|_| ConfigError::AlreadyInstalled)?;
    info!(enabled = config.enabled, "contract configuration installed");
    Ok(())
}

/// The process-wide configuration, read from the environment on first use
/// if none was installed.
pub fn current() -> Config {
    *GLOBAL.get_or_init(|| {
        let config = Config::from_env().unwrap_or_else(|error| {
            warn!(%error, "ignoring contract configuration from the environment");
            Config::default()
        });
        debug!(enabled = config.enabled, "contract configuration read from environment");
        config
    })
}

/// Explicit handle on a configuration; every attachment goes through one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contracts {
    config: Config,
}

impl Contracts {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Handle on the process-wide configuration.
    pub fn global() -> Self {
        Self::new(current())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Attach `attachment` to `function`, or return `function` untouched.
    pub fn apply<A: Attach>(
        &self,
        function: Function,
        attachment: A,
    ) -> Result<Function, AttachmentError> {
        if !self.config.enabled {
            return Ok(function);
        }
        attachment.attach_to(function)
    }

    /// Derive a checked type, or return `def` untouched.
    pub fn derive<T>(
        &self,
        def: TypeDef<T>,
        invariant: Invariant<T>,
    ) -> Result<TypeDef<T>, AttachmentError>
    where
        T: Default + Send + 'static,
    {
        if !self.config.enabled {
            return Ok(def);
        }
        invariant.apply(def)
    }
}

impl Default for Contracts {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
