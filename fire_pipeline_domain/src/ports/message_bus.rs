// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Message bus trait contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PipelineError;

/// Acknowledgement handed back once a published record has been durably
/// accepted by the bus, carrying enough to advance a watermark: the
/// business key it was published under and the event time it represents.
#[derive(Debug, Clone)]
pub struct DeliveryAck {
    pub key: String,
    pub event_time: DateTime<Utc>,
}

/// A topic/stream the pipeline publishes to and consumes from.
///
/// Implementations own connection lifecycle, partitioning, and consumer
/// group bookkeeping; the stage runtime only sees `publish`/`poll`/`commit`.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Ensure a topic exists with the given partition/replication settings.
    /// A no-op if it already exists.
    async fn ensure_topic(&self, topic: &str, partitions: i32, replication_factor: i32) -> Result<(), PipelineError>;

    /// Delete a topic. Used by the `RESTART` path to wipe downstream state.
    async fn delete_topic(&self, topic: &str) -> Result<(), PipelineError>;

    /// Reset a consumer group's offsets on `topic` to the earliest available.
    async fn reset_to_earliest(&self, topic: &str, group_id: &str) -> Result<(), PipelineError>;

    /// Current consumer-group lag on `topic`, for observability.
    async fn consumer_lag(&self, topic: &str, group_id: &str) -> Result<i64, PipelineError>;

    /// Publish one record keyed by `key`, returning once the bus has
    /// acknowledged it (at-least-once: a crash before this returns may
    /// result in a redelivery on retry, never a silent drop).
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<DeliveryAck, PipelineError>;

    /// Flush any buffered outbound records, blocking until they're acknowledged
    /// or the internal timeout elapses.
    async fn flush(&self) -> Result<(), PipelineError>;

    /// Poll for the next available record, or `None` if nothing arrived
    /// before the adapter's internal poll timeout.
    async fn poll(&self, topic: &str, group_id: &str) -> Result<Option<(String, Vec<u8>)>, PipelineError>;
}
