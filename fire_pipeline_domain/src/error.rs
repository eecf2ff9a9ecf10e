// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Taxonomy
//!
//! A single [`PipelineError`] enum spans all three stages. Each variant maps
//! to one of the categories a stage's batch loop must distinguish between:
//! record-level failures that are skipped/routed per policy, and
//! infrastructure failures that abort the current batch.

use thiserror::Error;

/// Errors produced anywhere in the fire incident pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A raw bus/CSV payload could not be decoded into structured data.
    #[error("decode error: {0}")]
    Decode(String),

    /// A decoded row could not be parsed into a `FireEvent` (bad date, missing column).
    #[error("parse error: {0}")]
    Parse(String),

    /// A parsed `FireEvent` failed one or more data-quality rules.
    #[error("rule violation: {0}")]
    Rule(String),

    /// The bus adapter could not publish a record.
    #[error("publish error: {0}")]
    Publish(String),

    /// The KV adapter could not persist a record or cursor.
    #[error("persist error: {0}")]
    Persist(String),

    /// The serving stage's duplicate policy rejected a write (`ON_DUPLICATE=fail`).
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// Configuration was missing, malformed, or named an unknown enum value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Infrastructure passthrough: filesystem/CSV I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Infrastructure passthrough: message bus connectivity or protocol errors.
    #[error("bus error: {0}")]
    Bus(String),

    /// Infrastructure passthrough: KV store / search index connectivity errors.
    #[error("kv store error: {0}")]
    Kv(String),

    /// Infrastructure passthrough: JSON (de)serialization.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Infrastructure-level errors abort the current batch; record-level
    /// errors are handled per the stage's `ON_FAILURE` policy and the batch
    /// continues.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            PipelineError::Io(_) | PipelineError::Bus(_) | PipelineError::Kv(_) | PipelineError::Config(_)
        )
    }

    /// Category label used as a `tracing` field on record-level failure logs.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Decode(_) => "decode",
            PipelineError::Parse(_) => "parse",
            PipelineError::Rule(_) => "rule",
            PipelineError::Publish(_) => "publish",
            PipelineError::Persist(_) => "persist",
            PipelineError::Duplicate(_) => "duplicate",
            PipelineError::Config(_) => "config",
            PipelineError::Io(_) => "io",
            PipelineError::Bus(_) => "bus",
            PipelineError::Kv(_) => "kv",
            PipelineError::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_is_infrastructure() {
        let err = PipelineError::Config("missing KAFKA_BOOTSTRAP_SERVERS".to_string());
        assert!(err.is_infrastructure());
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_rule_violation_is_not_infrastructure() {
        let err = PipelineError::Rule("Incident_Date missing".to_string());
        assert!(!err.is_infrastructure());
        assert_eq!(err.category(), "rule");
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: PipelineError = io_err.into();
        assert!(err.is_infrastructure());
    }
}
