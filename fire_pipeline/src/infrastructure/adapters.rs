// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Adapters
//!
//! Concrete implementations of the domain crate's port traits
//! (`MessageBus`, `KvStore`, `SearchIndex`, `CsvSource`).

pub mod csv_reader;
pub mod kafka_bus;
pub mod redis_kv;

pub use csv_reader::CsvFileSource;
pub use kafka_bus::RdKafkaBus;
pub use redis_kv::RedisKvStore;
