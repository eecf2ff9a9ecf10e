// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fire Pipeline Domain
//!
//! Core business logic for the three-stage fire-incident streaming pipeline:
//! source, validator, and serving. This crate knows nothing about Kafka,
//! Redis, or the filesystem — those live behind the traits in [`ports`] and
//! are implemented in the `fire-pipeline` crate.
//!
//! ## Module Structure
//!
//! - [`error`] — the [`error::PipelineError`] taxonomy shared by every stage.
//! - [`value_objects`] — newtypes for the identifiers stages route and
//!   index by ([`value_objects::IncidentNumber`], [`value_objects::RowId`],
//!   [`value_objects::Revision`]).
//! - [`model`] — [`model::RawRow`] (what the source stage reads) and
//!   [`model::FireEvent`] (what the validator stage produces).
//! - [`cursors`] — idempotency bookkeeping: [`cursors::RowCursor`],
//!   [`cursors::FileCursor`], and the monotonic [`cursors::Watermark`].
//! - [`quality`] — the data-quality rule engine that forks validated and
//!   rejected events.
//! - [`ports`] — trait contracts for the message bus, KV store, search
//!   index, and CSV source adapters.

pub mod cursors;
pub mod error;
pub mod model;
pub mod ports;
pub mod quality;
pub mod value_objects;

pub use cursors::{FileCursor, RowCursor, Watermark};
pub use error::PipelineError;
pub use model::{FireEvent, RawRow};
pub use quality::{analyze, QualityReport};
pub use value_objects::{IncidentNumber, Revision, RowId};
