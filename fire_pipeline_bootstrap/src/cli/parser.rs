// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface shared by the three stage binaries (`fire-source`,
//! `fire-validator`, `fire-serving`). Each binary knows which stage it is;
//! the CLI only exposes the handful of knobs an operator needs at startup.
//! Security validation happens in [`super::validator`] after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shared CLI structure for a stage worker binary
#[derive(Parser, Debug, Clone)]
#[command(name = "fire-pipeline")]
#[command(about = concat!("Fire incident streaming pipeline v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging, overriding RUST_LOG
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a config file layered under environment variables
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Depth of the bounded channel carrying bus delivery acknowledgements
    /// back to the watermark-advancing task
    #[arg(long, default_value = "1024")]
    pub channel_depth: usize,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the stage's main poll/process/flush loop
    Run {
        /// Ignore any saved cursor and reprocess from the beginning
        #[arg(long)]
        restart: bool,

        /// Override the input topic/stream name for this run
        #[arg(long)]
        topic_override: Option<String>,

        /// Override the consumer group id for this run
        #[arg(long)]
        group_id_override: Option<String>,
    },
    /// Load and validate configuration, then exit without connecting to the bus or KV store
    CheckConfig,
}

/// Parse CLI arguments with clap (handles `--help`/`--version` and exits on usage errors)
pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_restart_flag() {
        let cli = Cli::parse_from(["fire-source", "run", "--restart"]);
        match cli.command {
            Commands::Run { restart, .. } => assert!(restart),
            Commands::CheckConfig => panic!("expected Run"),
        }
    }

    #[test]
    fn defaults_channel_depth() {
        let cli = Cli::parse_from(["fire-source", "run"]);
        assert_eq!(cli.channel_depth, 1024);
    }

    #[test]
    fn parses_check_config_subcommand() {
        let cli = Cli::parse_from(["fire-validator", "check-config"]);
        assert!(matches!(cli.command, Commands::CheckConfig));
    }
}
