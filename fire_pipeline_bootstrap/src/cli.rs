// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse_cli()             │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate_cli()       │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration
///
/// Holds all CLI arguments after security validation: paths canonicalized,
/// strings checked for shell-injection patterns, numbers range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub channel_depth: usize,
}

/// Validated command variants
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run {
        restart: bool,
        topic_override: Option<String>,
        group_id_override: Option<String>,
    },
    CheckConfig,
}

/// Parse and validate CLI arguments in one step.
///
/// # Errors
///
/// Returns `ParseError` if any argument fails security or range validation.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

/// Apply security validation to parsed CLI arguments.
fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        Some(SecureArgParser::validate_path(&path.to_string_lossy())?)
    } else {
        None
    };

    SecureArgParser::validate_number("channel-depth", cli.channel_depth, 1, 1_000_000)?;

    let command = match cli.command {
        Commands::Run {
            restart,
            topic_override,
            group_id_override,
        } => {
            if let Some(ref topic) = topic_override {
                SecureArgParser::validate_argument(topic)?;
            }
            if let Some(ref group_id) = group_id_override {
                SecureArgParser::validate_argument(group_id)?;
            }
            ValidatedCommand::Run {
                restart,
                topic_override,
                group_id_override,
            }
        }
        Commands::CheckConfig => ValidatedCommand::CheckConfig,
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
        channel_depth: cli.channel_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn validates_run_command_without_overrides() {
        let cli = Cli::parse_from(["fire-source", "run"]);
        let validated = validate_cli(cli).unwrap();
        assert_eq!(validated.channel_depth, 1024);
        assert!(matches!(validated.command, ValidatedCommand::Run { restart: false, .. }));
    }

    #[test]
    fn rejects_dangerous_topic_override() {
        let cli = Cli::parse_from(["fire-source", "run", "--topic-override", "topic;rm -rf /"]);
        assert!(validate_cli(cli).is_err());
    }
}
