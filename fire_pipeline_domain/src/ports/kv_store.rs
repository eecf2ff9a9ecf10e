// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! KV store trait contract.

use async_trait::async_trait;

use crate::error::PipelineError;

/// Key/value store used for idempotency cursors, the watermark, and served
/// event hashes. Implementations may back this with Redis or an in-memory
/// fake for tests.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PipelineError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), PipelineError>;

    /// `true` if `key` is present, without fetching its value.
    async fn exists(&self, key: &str) -> Result<bool, PipelineError>;

    /// Delete every key matching `pattern` (a `*`-glob, as Redis `SCAN` uses).
    async fn delete_matching(&self, pattern: &str) -> Result<u64, PipelineError>;

    /// All keys matching `pattern`, for revision scans (`get_latest_revision`).
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, PipelineError>;

    /// Store `fields` as a hash at `key`, overwriting any existing hash.
    async fn set_hash(&self, key: &str, fields: &[(String, String)]) -> Result<(), PipelineError>;
}
