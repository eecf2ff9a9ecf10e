// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap-Phase Configuration
//!
//! The small slice of configuration the bootstrap layer needs before the
//! domain-aware `PipelineConfig` (in `fire_pipeline::infrastructure::config`)
//! can even be loaded: where the optional config file lives, how verbose to
//! be, and the shutdown grace period. Everything else is the application
//! layer's concern.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::ValidatedCli;

/// Bootstrap-phase settings derived from CLI flags, before the stage-specific
/// `PipelineConfig` is loaded.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Optional path to a config file overriding environment variables.
    pub config_path: Option<PathBuf>,
    /// Verbose logging requested on the command line.
    pub verbose: bool,
    /// How long to wait for in-flight work to drain after a shutdown signal.
    pub shutdown_grace_period: Duration,
}

impl BootstrapConfig {
    pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 10;

    pub fn from_validated_cli(cli: &ValidatedCli) -> Self {
        Self {
            config_path: cli.config.clone(),
            verbose: cli.verbose,
            shutdown_grace_period: Duration::from_secs(Self::DEFAULT_GRACE_PERIOD_SECS),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            verbose: false,
            shutdown_grace_period: Duration::from_secs(Self::DEFAULT_GRACE_PERIOD_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grace_period() {
        let config = BootstrapConfig::default();
        assert_eq!(config.shutdown_grace_period, Duration::from_secs(10));
        assert!(!config.verbose);
    }
}
