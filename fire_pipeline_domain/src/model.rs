// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Core Data Model
//!
//! `RawRow` is what the source stage publishes; `FireEvent` is what the
//! validator stage produces once a raw row has been parsed into typed
//! fields. Neither type knows about Kafka, Redis, or CSV file handles — see
//! `crate::ports` for the trait boundary to those adapters.

pub mod fire_event;
pub mod raw_row;

pub use fire_event::FireEvent;
pub use raw_row::RawRow;
