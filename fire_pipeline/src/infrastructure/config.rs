// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Configuration
//!
//! [`PipelineConfig`] is the single source of truth every stage binary loads
//! at startup. It is built with the `config` crate layered over process
//! environment variables, matching the env-var names the original service
//! read directly so operators migrating existing env files keep them working.
//!
//! Values are validated eagerly in [`PipelineConfig::load`]: an unknown
//! `ON_FAILURE`/`ON_DUPLICATE` value or an unparsable `START_DATE` is a
//! [`PipelineError::Config`], which is fatal at startup per the error
//! taxonomy's Config category.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use config::{Config, Environment};
use serde::Deserialize;

use fire_pipeline_domain::error::PipelineError;

/// Per-record failure policy: `continue` counts and proceeds, `raise` aborts
/// the batch after flushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFailure {
    Continue,
    Raise,
}

/// Serving-stage duplicate policy for an incident number that already has a
/// revision `0` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDuplicate {
    Continue,
    Fail,
    Replace,
    Version,
}

#[derive(Debug, Deserialize)]
struct RawPipelineConfig {
    batch_size: usize,
    main_loop: bool,
    main_loop_interval: u64,
    main_loop_timeout: u64,
    on_failure: String,
    restart: bool,
    date_format: String,
    datetime_format: String,
    start_date: String,
    csv_folder_path: String,
    fire_event_source_topic: String,
    validated_events_topic: String,
    unvalidated_events_topic: String,
    on_duplicate: String,
    aditional_allowed_empty_fields: String,
    kafka_bootstrap_servers: String,
    redis_url: String,
    service_name: String,
    metrics_port: u16,
}

/// Fully validated, typed configuration shared by all three stage binaries.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub main_loop: bool,
    pub main_loop_interval: Duration,
    pub main_loop_timeout: Duration,
    pub on_failure: OnFailure,
    pub restart: bool,
    /// Tried in order; `datetime_format` entries (`|`-separated) precede
    /// `date_format`, matching the validator's documented fallback chain.
    pub date_formats: Vec<String>,
    /// `start_date` is parsed with `date_format` alone — spec's documented
    /// ambiguity resolution (see DESIGN.md).
    pub start_date_format: String,
    pub start_date: String,
    pub csv_folder_path: String,
    pub fire_event_source_topic: String,
    pub validated_events_topic: String,
    pub unvalidated_events_topic: String,
    pub on_duplicate: OnDuplicate,
    pub additional_allowed_empty_fields: std::collections::HashSet<String>,
    pub kafka_bootstrap_servers: String,
    pub redis_url: String,
    pub service_name: String,
    pub metrics_port: u16,
}

impl PipelineConfig {
    /// Load configuration from the process environment, falling back to the
    /// same defaults the original service used.
    pub fn load() -> Result<Self, PipelineError> {
        let source = Config::builder()
            .set_default("batch_size", 100)?
            .set_default("main_loop", true)?
            .set_default("main_loop_interval", 30)?
            .set_default("main_loop_timeout", 60)?
            .set_default("on_failure", "continue")?
            .set_default("restart", false)?
            .set_default("date_format", "%Y/%m/%d")?
            .set_default("datetime_format", "%Y/%m/%d %H:%M:%S")?
            .set_default("start_date", "2021/01/01")?
            .set_default("csv_folder_path", "/data/fire_events")?
            .set_default("fire_event_source_topic", "fire_event_source")?
            .set_default("validated_events_topic", "validated-fire-events")?
            .set_default("unvalidated_events_topic", "validation-failed-fire-events")?
            .set_default("on_duplicate", "continue")?
            .set_default("aditional_allowed_empty_fields", "")?
            .set_default("kafka_bootstrap_servers", "localhost:9092")?
            .set_default("redis_url", "redis://127.0.0.1:6379")?
            .set_default("service_name", "fire_pipeline")?
            .set_default("metrics_port", 9090)?
            .add_source(Environment::default().try_parsing(true))
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let raw: RawPipelineConfig = source
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawPipelineConfig) -> Result<Self, PipelineError> {
        let on_failure = match raw.on_failure.to_lowercase().as_str() {
            "continue" => OnFailure::Continue,
            "raise" => OnFailure::Raise,
            other => return Err(PipelineError::Config(format!("unknown ON_FAILURE option: {other}"))),
        };

        let on_duplicate = match raw.on_duplicate.to_lowercase().as_str() {
            "continue" => OnDuplicate::Continue,
            "fail" => OnDuplicate::Fail,
            "replace" => OnDuplicate::Replace,
            "version" => OnDuplicate::Version,
            other => return Err(PipelineError::Config(format!("unknown ON_DUPLICATE option: {other}"))),
        };

        let mut date_formats: Vec<String> =
            raw.datetime_format.split('|').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
        date_formats.push(raw.date_format.clone());

        validate_start_date(&raw.start_date, &raw.date_format)?;

        let additional_allowed_empty_fields = raw
            .aditional_allowed_empty_fields
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(PipelineConfig {
            batch_size: raw.batch_size,
            main_loop: raw.main_loop,
            main_loop_interval: Duration::from_secs(raw.main_loop_interval),
            main_loop_timeout: Duration::from_secs(raw.main_loop_timeout),
            on_failure,
            restart: raw.restart,
            date_formats,
            start_date_format: raw.date_format,
            start_date: raw.start_date,
            csv_folder_path: raw.csv_folder_path,
            fire_event_source_topic: raw.fire_event_source_topic,
            validated_events_topic: raw.validated_events_topic,
            unvalidated_events_topic: raw.unvalidated_events_topic,
            on_duplicate,
            additional_allowed_empty_fields,
            kafka_bootstrap_servers: raw.kafka_bootstrap_servers,
            redis_url: raw.redis_url,
            service_name: raw.service_name,
            metrics_port: raw.metrics_port,
        })
    }
}

/// `START_DATE` is parsed with `DATE_FORMAT` only, never the datetime
/// fallback chain (spec §9 Ambiguities, resolved in DESIGN.md).
fn validate_start_date(value: &str, date_format: &str) -> Result<(), PipelineError> {
    if NaiveDate::parse_from_str(value, date_format).is_ok()
        || NaiveDateTime::parse_from_str(value, date_format).is_ok()
    {
        Ok(())
    } else {
        Err(PipelineError::Config(format!("START_DATE {value:?} does not match DATE_FORMAT {date_format:?}")))
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(e: config::ConfigError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_raw() -> RawPipelineConfig {
        RawPipelineConfig {
            batch_size: 100,
            main_loop: true,
            main_loop_interval: 30,
            main_loop_timeout: 60,
            on_failure: "continue".to_string(),
            restart: false,
            date_format: "%Y/%m/%d".to_string(),
            datetime_format: "%Y/%m/%d %H:%M:%S".to_string(),
            start_date: "2021/01/01".to_string(),
            csv_folder_path: "/data/fire_events".to_string(),
            fire_event_source_topic: "fire_event_source".to_string(),
            validated_events_topic: "validated-fire-events".to_string(),
            unvalidated_events_topic: "validation-failed-fire-events".to_string(),
            on_duplicate: "version".to_string(),
            aditional_allowed_empty_fields: "box_number, point".to_string(),
            kafka_bootstrap_servers: "localhost:9092".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            service_name: "fire_pipeline".to_string(),
            metrics_port: 9090,
        }
    }

    #[test]
    fn test_valid_config_parses() {
        let config = PipelineConfig::from_raw(base_raw()).unwrap();
        assert_eq!(config.on_duplicate, OnDuplicate::Version);
        assert_eq!(config.date_formats, vec!["%Y/%m/%d %H:%M:%S".to_string(), "%Y/%m/%d".to_string()]);
        assert!(config.additional_allowed_empty_fields.contains("box_number"));
        assert!(config.additional_allowed_empty_fields.contains("point"));
    }

    #[test]
    fn test_unknown_on_duplicate_is_config_error() {
        let mut raw = base_raw();
        raw.on_duplicate = "bogus".to_string();
        let err = PipelineConfig::from_raw(raw).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_unknown_on_failure_is_config_error() {
        let mut raw = base_raw();
        raw.on_failure = "bogus".to_string();
        let err = PipelineConfig::from_raw(raw).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_start_date_must_match_date_format_only() {
        let mut raw = base_raw();
        raw.start_date = "2021-01-01T00:00:00".to_string();
        let err = PipelineConfig::from_raw(raw).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
