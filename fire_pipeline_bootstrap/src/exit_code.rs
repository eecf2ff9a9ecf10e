// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Mapping
//!
//! Maps application-level results to Unix `sysexits.h`-style exit codes, so
//! the three stage binaries (`fire-source`, `fire-validator`, `fire-serving`)
//! return a consistent, scriptable status to supervisors (systemd, k8s).

use std::fmt;

/// Standard Unix exit codes (loosely following `sysexits.h`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Successful termination
    Ok = 0,
    /// Catch-all for unspecified errors
    GeneralError = 1,
    /// Command line usage error
    Usage = 64,
    /// Input data was incorrect in some way
    DataError = 65,
    /// Configuration error (missing/invalid env vars, bad config file)
    Config = 78,
    /// An input/output error occurred
    IoError = 74,
    /// A required external service (bus or KV store) was unreachable
    Unavailable = 69,
    /// Process was terminated by a signal after exceeding the shutdown grace period
    ShutdownTimeout = 124,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitCode::Ok => "ok",
            ExitCode::GeneralError => "general error",
            ExitCode::Usage => "usage error",
            ExitCode::DataError => "data error",
            ExitCode::Config => "configuration error",
            ExitCode::IoError => "I/O error",
            ExitCode::Unavailable => "service unavailable",
            ExitCode::ShutdownTimeout => "shutdown timed out",
        };
        write!(f, "{} ({})", label, self.code())
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

/// Map a `PipelineError`-shaped message to an exit code.
///
/// Takes a lightweight string classification rather than depending on
/// `fire_pipeline_domain` directly, so the bootstrap crate stays beneath the
/// domain crate in the dependency graph.
pub fn map_error_to_exit_code(error: &(dyn std::error::Error + 'static)) -> ExitCode {
    let message = error.to_string().to_lowercase();
    if message.contains("config") {
        ExitCode::Config
    } else if message.contains("bus") || message.contains("kafka") || message.contains("redis") || message.contains("kv") {
        ExitCode::Unavailable
    } else if message.contains("io") || message.contains("csv") || message.contains("file") {
        ExitCode::IoError
    } else if message.contains("parse") || message.contains("decode") {
        ExitCode::DataError
    } else {
        ExitCode::GeneralError
    }
}

/// Convert a top-level application result into a process exit code.
pub fn result_to_exit_code<E: std::error::Error + 'static>(result: Result<(), E>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Ok.into(),
        Err(e) => {
            tracing::error!(error = %e, "process exiting with error");
            map_error_to_exit_code(&e).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("config: missing KAFKA_BOOTSTRAP_SERVERS")]
    struct FakeConfigError;

    #[derive(Debug, Error)]
    #[error("bus: connection refused")]
    struct FakeBusError;

    #[test]
    fn test_config_error_maps_to_config_exit_code() {
        assert_eq!(map_error_to_exit_code(&FakeConfigError), ExitCode::Config);
    }

    #[test]
    fn test_bus_error_maps_to_unavailable() {
        assert_eq!(map_error_to_exit_code(&FakeBusError), ExitCode::Unavailable);
    }

    #[test]
    fn test_ok_result_maps_to_zero() {
        let result: Result<(), FakeConfigError> = Ok(());
        let code: std::process::ExitCode = result_to_exit_code(result);
        assert_eq!(format!("{:?}", code), format!("{:?}", std::process::ExitCode::SUCCESS));
    }
}
