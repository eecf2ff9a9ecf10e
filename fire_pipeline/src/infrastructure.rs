// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Concrete implementations of the domain crate's port traits, plus the
//! ambient concerns (configuration, logging, metrics) every stage binary
//! wires up at startup before touching the bus or KV store.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod metrics;

pub use adapters::{CsvFileSource, RdKafkaBus, RedisKvStore};
pub use config::PipelineConfig;
pub use logging::init_logging;
pub use metrics::{MetricsEndpoint, StageMetrics};
