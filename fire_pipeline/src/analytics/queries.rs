// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Analytical Read-Only Queries
//!
//! Thin convenience helpers over the serving store's KV/search adapter for
//! ad hoc district/battalion aggregate counts. Out of the pipeline's write
//! path; not part of the core stage runtime.

use std::sync::Arc;

use fire_pipeline_domain::error::PipelineError;
use fire_pipeline_domain::ports::KvStore;

/// Count served revision-`0` records for `incident_number` under `prefix`,
/// i.e. whether the incident has ever been served at all.
pub async fn incident_is_served(kv: &Arc<dyn KvStore>, prefix: &str, incident_number: &str) -> Result<bool, PipelineError> {
    kv.exists(&format!("{prefix}:{incident_number}:0")).await
}

/// Count every revision key present for `incident_number` under `prefix`,
/// regardless of duplicate policy (useful for auditing `version`-policy
/// incidents with more than one write).
pub async fn revision_count(kv: &Arc<dyn KvStore>, prefix: &str, incident_number: &str) -> Result<usize, PipelineError> {
    let keys = kv.keys_matching(&format!("{prefix}:{incident_number}:*")).await?;
    Ok(keys.len())
}
