// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Fire Pipeline
//!
//! A three-stage streaming pipeline that turns a folder of fire-incident CSV
//! exports into an idempotent, queryable store: a source stage tails CSV
//! files onto a raw events topic, a validator stage forks each record onto
//! validated or rejected topics, and a serving stage materialises validated
//! records into an indexed KV store under a configurable duplicate policy.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (SourceStage, ValidatorStage, ServingStage, stage_runtime)  │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                fire-pipeline-domain                         │
//! │  (FireEvent, RawRow, cursors, quality rules, port traits)    │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (Kafka bus, Redis KV + search index, CSV reader, config,    │
//! │   logging, metrics)                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each of the three stage binaries (`fire-source`, `fire-validator`,
//! `fire-serving`) bootstraps its CLI and config through
//! `fire-pipeline-bootstrap`, wires the relevant adapters, and drives its
//! stage through [`application::run`].
//!
//! [`analytics`] holds external collaborators — a star-schema decomposition
//! and read-only aggregate queries — that sit outside the stage runtime
//! entirely and are never called from [`application`].

pub mod analytics;
pub mod application;
pub mod infrastructure;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory

pub use fire_pipeline_domain::error::PipelineError;
pub use infrastructure::config::PipelineConfig;
