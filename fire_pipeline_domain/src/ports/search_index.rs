// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Secondary search index trait contract (RediSearch `FT.*` family).

use async_trait::async_trait;

use crate::error::PipelineError;

/// One field in a search index schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexField {
    /// Exact-match, low-cardinality field (e.g. battalion, district).
    Tag { name: String },
    /// Range-queryable, sortable numeric field (e.g. row id, alarm time).
    NumericSortable { name: String },
    /// Full-text searchable field (e.g. address).
    Text { name: String },
}

/// Lifecycle for a served-event secondary index: created once at startup,
/// dropped and recreated on a `RESTART` run.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create `index_id` over documents at `key_prefix` with `schema`, unless
    /// it already exists.
    async fn create_index(&self, index_id: &str, schema: &[IndexField], key_prefix: &str) -> Result<(), PipelineError>;

    /// Drop `index_id` if present, leaving the underlying documents intact.
    async fn drop_index(&self, index_id: &str) -> Result<(), PipelineError>;

    async fn index_exists(&self, index_id: &str) -> Result<bool, PipelineError>;
}
