// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Adapter Trait Contracts
//!
//! The boundary between the domain/application layers and infrastructure.
//! `fire_pipeline_domain` depends on nothing beyond `async-trait` to define
//! these; concrete implementations (`rdkafka`, `redis`, `csv`) live in the
//! `fire-pipeline` crate.

pub mod csv_source;
pub mod kv_store;
pub mod message_bus;
pub mod search_index;

pub use csv_source::CsvSource;
pub use kv_store::KvStore;
pub use message_bus::{DeliveryAck, MessageBus};
pub use search_index::{IndexField, SearchIndex};
