// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Validator Stage — raw → validated | rejected
//!
//! Consumes the raw topic, projects each message into a [`FireEvent`], runs
//! the data-quality rules, and forks the stream onto the validated or
//! rejected topic. Partition-key routing (`incident_number`) is inherited
//! from the bus, so arrival order within one incident is preserved on both
//! output topics.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use fire_pipeline_domain::error::PipelineError;
use fire_pipeline_domain::model::{FireEvent, RawRow};
use fire_pipeline_domain::ports::MessageBus;
use fire_pipeline_domain::quality::analyze;

use crate::application::stage_runtime::{Stage, StepOutcome};

pub struct ValidatorStage {
    bus: Arc<dyn MessageBus>,
    raw_topic: String,
    validated_topic: String,
    rejected_topic: String,
    group_id: String,
    date_formats: Vec<String>,
    additional_allowed_empty_fields: HashSet<String>,
}

impl ValidatorStage {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        raw_topic: String,
        validated_topic: String,
        rejected_topic: String,
        date_formats: Vec<String>,
        additional_allowed_empty_fields: HashSet<String>,
    ) -> Self {
        Self {
            bus,
            raw_topic,
            validated_topic,
            rejected_topic,
            group_id: "fire-validator".to_string(),
            date_formats,
            additional_allowed_empty_fields,
        }
    }

    /// Override the raw-topic consumer group id, e.g. from a CLI flag.
    pub fn with_group_id(mut self, group_id: String) -> Self {
        self.group_id = group_id;
        self
    }

    async fn publish_rejected(&self, key: &str, event: &FireEvent, issues: &serde_json::Map<String, Value>) -> Result<(), PipelineError> {
        let mut body = serde_json::to_value(event)?;
        if let Value::Object(ref mut map) = body {
            map.insert("data_quality_issues".to_string(), Value::Object(issues.clone()));
        }
        let payload = serde_json::to_vec(&body)?;
        self.bus.publish(&self.rejected_topic, key, &payload).await?;
        Ok(())
    }
}

#[async_trait]
impl Stage for ValidatorStage {
    fn name(&self) -> &str {
        "fire-validator"
    }

    async fn step(&self) -> Result<StepOutcome, PipelineError> {
        let Some((key, payload)) = self.bus.poll(&self.raw_topic, &self.group_id).await? else {
            return Ok(StepOutcome::NoMessage);
        };

        let row: RawRow = match serde_json::from_slice(&payload) {
            Ok(row) => row,
            Err(e) => return Ok(StepOutcome::RecordFailure(PipelineError::Decode(e.to_string()))),
        };

        if row.is_end_of_file() {
            return Ok(StepOutcome::Skipped);
        }

        let event = match FireEvent::from_raw_row(&row, &self.date_formats) {
            Ok(event) => event,
            Err(e) => return Ok(StepOutcome::RecordFailure(e)),
        };

        let report = analyze(&event, &self.additional_allowed_empty_fields);

        if report.is_valid() {
            let payload = serde_json::to_vec(&event)?;
            self.bus.publish(&self.validated_topic, &key, &payload).await?;
        } else {
            let issues: serde_json::Map<String, Value> =
                report.issues.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();

            // Rule-computation failure path: publish best-effort before
            // returning control to the runtime's failure policy.
            if let Err(e) = self.publish_rejected(&key, &event, &issues).await {
                warn!(error = %e, key = %key, "failed to publish rejected record");
                return Ok(StepOutcome::RecordFailure(PipelineError::Rule(format!(
                    "failed to publish rejected record for {key}: {e}"
                ))));
            }
        }

        Ok(StepOutcome::Processed { key, timestamp: event.incident_date })
    }

    async fn flush(&self) -> Result<(), PipelineError> {
        self.bus.flush().await
    }

    async fn restart(&self) -> Result<(), PipelineError> {
        self.bus.delete_topic(&self.validated_topic).await?;
        self.bus.delete_topic(&self.rejected_topic).await?;
        self.bus.ensure_topic(&self.validated_topic, 1, 1).await?;
        self.bus.ensure_topic(&self.rejected_topic, 1, 1).await?;
        self.bus.reset_to_earliest(&self.raw_topic, &self.group_id).await?;
        Ok(())
    }

    async fn consumer_lag(&self) -> Result<Option<i64>, PipelineError> {
        self.bus.consumer_lag(&self.raw_topic, &self.group_id).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fire_pipeline_domain::ports::DeliveryAck;
    use indexmap::IndexMap;
    use std::sync::Mutex;
    use tokio::sync::Mutex as AsyncMutex;

    struct FakeBus {
        inbound: AsyncMutex<Vec<(String, Vec<u8>)>>,
        published: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessageBus for FakeBus {
        async fn ensure_topic(&self, _: &str, _: i32, _: i32) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn delete_topic(&self, _: &str) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn reset_to_earliest(&self, _: &str, _: &str) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn consumer_lag(&self, _: &str, _: &str) -> Result<i64, PipelineError> {
            Ok(0)
        }
        async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<DeliveryAck, PipelineError> {
            self.published.lock().unwrap().push((topic.to_string(), String::from_utf8_lossy(payload).into_owned()));
            Ok(DeliveryAck { key: key.to_string(), event_time: chrono::Utc::now() })
        }
        async fn flush(&self) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn poll(&self, _: &str, _: &str) -> Result<Option<(String, Vec<u8>)>, PipelineError> {
            Ok(self.inbound.lock().await.pop())
        }
    }

    fn row_with(battalion: &str) -> RawRow {
        let mut fields = IndexMap::new();
        for (k, v) in [
            ("Incident Number", "19123456"),
            ("Exposure Number", "0"),
            ("ID", "1"),
            ("Call Number", "192221234"),
            ("Address", "100 Market St"),
            ("Incident Date", "2022/01/01"),
            ("City", "San Francisco"),
            ("zipcode", "94105"),
            ("Battalion", battalion),
            ("Station Area", "01"),
            ("Supervisor District", "6"),
        ] {
            fields.insert(k.to_string(), v.to_string());
        }
        RawRow::new(fields)
    }

    #[tokio::test]
    async fn valid_record_routes_to_validated_topic() {
        let bus = Arc::new(FakeBus {
            inbound: AsyncMutex::new(vec![("19123456".to_string(), serde_json::to_vec(&row_with("B01")).unwrap())]),
            published: Mutex::new(Vec::new()),
        });
        let stage = ValidatorStage::new(
            bus.clone(),
            "raw".to_string(),
            "validated".to_string(),
            "rejected".to_string(),
            vec!["%Y/%m/%d".to_string()],
            HashSet::new(),
        );

        let outcome = stage.step().await.unwrap();
        assert!(matches!(outcome, StepOutcome::Processed { .. }));
        let published = bus.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "validated");
    }

    #[tokio::test]
    async fn missing_battalion_routes_to_rejected_topic() {
        let bus = Arc::new(FakeBus {
            inbound: AsyncMutex::new(vec![("19123456".to_string(), serde_json::to_vec(&row_with("")).unwrap())]),
            published: Mutex::new(Vec::new()),
        });
        let stage = ValidatorStage::new(
            bus.clone(),
            "raw".to_string(),
            "validated".to_string(),
            "rejected".to_string(),
            vec!["%Y/%m/%d".to_string()],
            HashSet::new(),
        );

        stage.step().await.unwrap();
        let published = bus.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "rejected");
        assert!(published[0].1.contains("data_quality_issues"));
        assert!(published[0].1.contains("Missing Battalion"));
    }
}
