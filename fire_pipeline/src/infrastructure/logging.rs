// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Logging
//!
//! Structured logging setup shared by every stage binary. An `EnvFilter`
//! reads `RUST_LOG` (default `info`); output is human-readable by default,
//! or JSON when `LOG_FORMAT=json` — matching the original service's
//! two log shapes without carrying a bespoke observability stack.
//!
//! Record-level failures are logged at `warn` with the record's business
//! key and stage name as `tracing` fields rather than interpolated into the
//! message, so they stay queryable; batch reports log at `info` as one
//! structured event per batch (spec §4.1 Observability).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global `tracing` subscriber for a stage process.
///
/// Safe to call once per binary at the top of `main`. `LOG_FORMAT=json`
/// switches to JSON-formatted output for log aggregation; anything else (or
/// unset) uses the human-readable format.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);

    if use_json {
        tracing_subscriber::registry().with(env_filter).with(fmt::layer().json()).init();
    } else {
        tracing_subscriber::registry().with(env_filter).with(fmt::layer()).init();
    }
}
