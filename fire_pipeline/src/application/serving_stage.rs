// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Serving Stage — validated → indexed KV
//!
//! Consumes the validated topic and materialises each record as a hash in
//! the KV store under `{prefix}:{incident_number}[:{revision}]`, governed
//! by the configured duplicate policy, with a RediSearch-style secondary
//! index kept in sync across restarts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fire_pipeline_domain::error::PipelineError;
use fire_pipeline_domain::model::FireEvent;
use fire_pipeline_domain::ports::{IndexField, KvStore, MessageBus, SearchIndex};

use crate::application::stage_runtime::{Stage, StepOutcome};
use crate::infrastructure::config::OnDuplicate;

const INDEX_FIELDS: &[(&str, fn(String) -> IndexField)] = &[
    ("Incident_Number", |name| IndexField::Tag { name }),
    ("neighborhood_district", |name| IndexField::Tag { name }),
    ("Battalion", |name| IndexField::Tag { name }),
    ("ID", |name| IndexField::NumericSortable { name }),
    ("Alarm_DtTm", |name| IndexField::NumericSortable { name }),
    ("Incident_Date", |name| IndexField::NumericSortable { name }),
];

fn schema() -> Vec<IndexField> {
    INDEX_FIELDS.iter().map(|(name, ctor)| ctor(name.to_string())).collect()
}

/// Epoch seconds for serialization; `None` serialises to `""`, matching
/// spec §4.4's hash-serialisation rule.
fn ts_field(value: Option<DateTime<Utc>>) -> String {
    value.map(|dt| dt.timestamp().to_string()).unwrap_or_default()
}

fn opt_field(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Flatten a `FireEvent` into the hash fields the index schema and the
/// round-trip law (spec §8) depend on, plus the remaining attributes.
fn to_hash_fields(event: &FireEvent) -> Vec<(String, String)> {
    vec![
        ("Incident_Number".to_string(), event.incident_number.clone()),
        ("exposure_number".to_string(), event.exposure_number.to_string()),
        ("ID".to_string(), event.id.clone()),
        ("Call_Number".to_string(), event.call_number.clone()),
        ("Incident_Date".to_string(), ts_field(event.incident_date)),
        ("Alarm_DtTm".to_string(), ts_field(event.alarm_dt)),
        ("Arrival_DtTm".to_string(), ts_field(event.arrival_dt)),
        ("Close_DtTm".to_string(), ts_field(event.close_dt)),
        ("Address".to_string(), event.address.clone()),
        ("City".to_string(), event.city.clone()),
        ("zipcode".to_string(), event.zipcode.clone()),
        ("Battalion".to_string(), event.battalion.clone()),
        ("Station_Area".to_string(), event.station_area.clone()),
        ("Box".to_string(), opt_field(&event.box_number)),
        ("neighborhood_district".to_string(), opt_field(&event.neighborhood_district)),
        ("Supervisor_District".to_string(), opt_field(&event.supervisor_district)),
        ("point".to_string(), opt_field(&event.point)),
        ("Suppression_Units".to_string(), event.suppression_units.to_string()),
        ("Suppression_Personnel".to_string(), event.suppression_personnel.to_string()),
        ("EMS_Units".to_string(), event.ems_units.to_string()),
        ("EMS_Personnel".to_string(), event.ems_personnel.to_string()),
        ("Other_Units".to_string(), event.other_units.to_string()),
        ("Other_Personnel".to_string(), event.other_personnel.to_string()),
        ("First_Unit_On_Scene".to_string(), opt_field(&event.first_unit_on_scene)),
        ("Fire_Fatalities".to_string(), event.fire_fatalities.to_string()),
        ("Fire_Injuries".to_string(), event.fire_injuries.to_string()),
        ("Civilian_Fatalities".to_string(), event.civilian_fatalities.to_string()),
        ("Civilian_Injuries".to_string(), event.civilian_injuries.to_string()),
        ("Number_of_Alarms".to_string(), event.number_of_alarms.to_string()),
        ("data_as_of".to_string(), opt_field(&event.data_as_of)),
        ("data_loaded_at".to_string(), opt_field(&event.data_loaded_at)),
    ]
}

pub struct ServingStage {
    bus: Arc<dyn MessageBus>,
    kv: Arc<dyn KvStore>,
    index: Arc<dyn SearchIndex>,
    validated_topic: String,
    group_id: String,
    key_prefix: String,
    index_id: String,
    on_duplicate: OnDuplicate,
}

impl ServingStage {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        kv: Arc<dyn KvStore>,
        index: Arc<dyn SearchIndex>,
        validated_topic: String,
        key_prefix: String,
        on_duplicate: OnDuplicate,
    ) -> Self {
        let index_id = format!("{key_prefix}_idx");
        Self { bus, kv, index, validated_topic, group_id: "fire-serving".to_string(), key_prefix, index_id, on_duplicate }
    }

    /// Override the validated-topic consumer group id, e.g. from a CLI flag.
    pub fn with_group_id(mut self, group_id: String) -> Self {
        self.group_id = group_id;
        self
    }

    /// Create the secondary index if it doesn't already exist. Call once
    /// at startup before entering the stage runtime loop.
    pub async fn ensure_index(&self) -> Result<(), PipelineError> {
        self.index.create_index(&self.index_id, &schema(), &self.key_prefix).await
    }

    fn base_key(&self, incident_number: &str) -> String {
        format!("{}:{}", self.key_prefix, incident_number)
    }

    fn revision_key(&self, incident_number: &str, revision: i64) -> String {
        format!("{}:{}:{}", self.key_prefix, incident_number, revision)
    }

    /// Scan `{prefix}:{incident_number}:*`, returning the highest revision
    /// found or `-1` if none exist. Entries whose trailing segment isn't an
    /// integer are ignored.
    async fn latest_revision(&self, incident_number: &str) -> Result<i64, PipelineError> {
        let pattern = format!("{}:{}:*", self.key_prefix, incident_number);
        let keys = self.kv.keys_matching(&pattern).await?;
        Ok(keys
            .iter()
            .filter_map(|key| key.rsplit(':').next())
            .filter_map(|suffix| suffix.parse::<i64>().ok())
            .max()
            .unwrap_or(-1))
    }
}

#[async_trait]
impl Stage for ServingStage {
    fn name(&self) -> &str {
        "fire-serving"
    }

    async fn step(&self) -> Result<StepOutcome, PipelineError> {
        let Some((key, payload)) = self.bus.poll(&self.validated_topic, &self.group_id).await? else {
            return Ok(StepOutcome::NoMessage);
        };

        let event: FireEvent = match serde_json::from_slice(&payload) {
            Ok(event) => event,
            Err(e) => return Ok(StepOutcome::RecordFailure(PipelineError::Decode(e.to_string()))),
        };

        let exists = self.kv.exists(&self.revision_key(&event.incident_number, 0)).await?;

        let target_revision = if exists {
            match self.on_duplicate {
                OnDuplicate::Continue => return Ok(StepOutcome::Skipped),
                OnDuplicate::Fail => {
                    return Ok(StepOutcome::RecordFailure(PipelineError::Duplicate(format!(
                        "incident {} already served",
                        event.incident_number
                    ))))
                }
                OnDuplicate::Replace => 0,
                OnDuplicate::Version => self.latest_revision(&event.incident_number).await? + 1,
            }
        } else {
            0
        };

        let revision_key = self.revision_key(&event.incident_number, target_revision);
        let fields = to_hash_fields(&event);
        self.kv.set_hash(&revision_key, &fields).await?;

        Ok(StepOutcome::Processed { key, timestamp: event.incident_date })
    }

    async fn flush(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn restart(&self) -> Result<(), PipelineError> {
        self.index.drop_index(&self.index_id).await?;
        self.kv.delete_matching(&format!("{}:*", self.key_prefix)).await?;
        self.index.create_index(&self.index_id, &schema(), &self.key_prefix).await?;
        self.bus.reset_to_earliest(&self.validated_topic, &self.group_id).await?;
        Ok(())
    }

    async fn consumer_lag(&self) -> Result<Option<i64>, PipelineError> {
        self.bus.consumer_lag(&self.validated_topic, &self.group_id).await.map(Some)
    }
}
