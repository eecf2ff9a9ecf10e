// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Stage — CSV → raw topic
//!
//! Walks a configured directory of CSV files, publishing each row whose
//! `incident_date` is at or after the effective start date to the raw
//! topic, skipping rows the KV store confirms were already delivered by a
//! prior run. The row-processing order follows spec §4.2 exactly; the
//! watermark and row-cursor writes are funneled through a single owning
//! task fed by a bounded channel (§5's "producer callback as concurrent
//! writer" design note), so no two writers race on the watermark key.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, warn};

use fire_pipeline_domain::cursors::{FileCursor, RowCursor, Watermark};
use fire_pipeline_domain::error::PipelineError;
use fire_pipeline_domain::model::{fire_event::parse_any_datetime, RawRow};
use fire_pipeline_domain::ports::csv_source::{CsvFile, CsvSource};
use fire_pipeline_domain::ports::{KvStore, MessageBus};
use fire_pipeline_domain::value_objects::{IncidentNumber, RowId};

use crate::application::stage_runtime::{Stage, StepOutcome};

/// KV namespace this stage owns; all of its cursor/watermark keys are
/// prefixed with this, matching spec §3's `{source}` placeholder.
const NAMESPACE: &str = "source";

fn row_cursor_key(row_id: &RowId) -> String {
    format!("{NAMESPACE}:message:{row_id}")
}

fn file_cursor_key(path: &str) -> String {
    format!("{NAMESPACE}:file:{path}")
}

fn watermark_key() -> String {
    format!("{NAMESPACE}:latest_event_timestamp")
}

/// Sent from `SourceStage::step` to the watermark-writer task once a
/// publish has been durably acknowledged by the bus.
struct AckMessage {
    row_id: RowId,
    event_time: DateTime<Utc>,
}

async fn run_ack_writer(kv: Arc<dyn KvStore>, mut rx: mpsc::Receiver<AckMessage>) {
    while let Some(ack) = rx.recv().await {
        let cursor_key = row_cursor_key(&ack.row_id);
        if let Ok(payload) = serde_json::to_string(&RowCursor::processed()) {
            if let Err(e) = kv.set(&cursor_key, &payload).await {
                error!(error = %e, key = %cursor_key, "failed to persist row cursor");
            }
        }

        let wm_key = watermark_key();
        let current = match kv.get(&wm_key).await {
            Ok(value) => value.as_deref().and_then(Watermark::parse),
            Err(e) => {
                error!(error = %e, "failed to read watermark before advancing");
                None
            }
        };
        let mut watermark = current.unwrap_or(Watermark(ack.event_time));
        watermark.advance(ack.event_time);
        if let Err(e) = kv.set(&wm_key, &watermark.to_rfc3339()).await {
            error!(error = %e, "failed to persist watermark");
        }
    }
}

struct ReadState {
    files: Vec<CsvFile>,
    file_idx: usize,
    /// File cursor for `files[file_idx]`, loaded from KV on first touch.
    cursor: Option<FileCursor>,
}

pub struct SourceStage {
    csv_source: Arc<dyn CsvSource>,
    bus: Arc<dyn MessageBus>,
    kv: Arc<dyn KvStore>,
    raw_topic: String,
    date_formats: Vec<String>,
    effective_start_date: DateTime<Utc>,
    ack_tx: mpsc::Sender<AckMessage>,
    state: Mutex<ReadState>,
}

impl SourceStage {
    pub async fn new(
        csv_source: Arc<dyn CsvSource>,
        bus: Arc<dyn MessageBus>,
        kv: Arc<dyn KvStore>,
        raw_topic: String,
        date_formats: Vec<String>,
        start_date: &str,
        start_date_format: &str,
        channel_depth: usize,
    ) -> Result<Self, PipelineError> {
        let configured_start = chrono::NaiveDate::parse_from_str(start_date, start_date_format)
            .map(|d| DateTime::<Utc>::from_naive_utc_and_offset(d.and_hms_opt(0, 0, 0).unwrap(), Utc))
            .or_else(|_| {
                chrono::NaiveDateTime::parse_from_str(start_date, start_date_format)
                    .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
            })
            .map_err(|e| PipelineError::Config(format!("invalid START_DATE at runtime: {e}")))?;

        let watermark = kv.get(&watermark_key()).await?.as_deref().and_then(Watermark::parse);
        let effective_start_date = match watermark {
            Some(wm) if wm.0 > configured_start => wm.0,
            _ => configured_start,
        };

        let files = csv_source.list_files().await?;
        let (ack_tx, ack_rx) = mpsc::channel(channel_depth);
        tokio::spawn(run_ack_writer(kv.clone(), ack_rx));

        Ok(Self {
            csv_source,
            bus,
            kv,
            raw_topic,
            date_formats,
            effective_start_date,
            ack_tx,
            state: Mutex::new(ReadState { files, file_idx: 0, cursor: None }),
        })
    }

    async fn load_cursor(&self, path: &str) -> Result<FileCursor, PipelineError> {
        match self.kv.get(&file_cursor_key(path)).await? {
            Some(value) => serde_json::from_str(&value).map_err(PipelineError::Serialization),
            None => Ok(FileCursor::start()),
        }
    }

    async fn save_cursor(&self, path: &str, cursor: FileCursor) -> Result<(), PipelineError> {
        let payload = serde_json::to_string(&cursor)?;
        self.kv.set(&file_cursor_key(path), &payload).await
    }

    fn row_id_of(row: &RawRow) -> RowId {
        RowId::new(row.get("ID").unwrap_or_default())
    }
}

#[async_trait]
impl Stage for SourceStage {
    fn name(&self) -> &str {
        "fire-source"
    }

    async fn step(&self) -> Result<StepOutcome, PipelineError> {
        let mut state = self.state.lock().await;

        if state.file_idx >= state.files.len() {
            return Ok(StepOutcome::NoMessage);
        }

        let path = state.files[state.file_idx].path.clone();
        if state.cursor.is_none() {
            state.cursor = Some(self.load_cursor(&path).await?);
        }

        let file = state.files[state.file_idx].clone();
        let row = self.csv_source.next_row(&file).await?;

        let Some(row) = row else {
            // Already exhausted; move on to the next file.
            state.file_idx += 1;
            state.cursor = None;
            return Ok(StepOutcome::Skipped);
        };

        if row.is_end_of_file() {
            let mut cursor = state.cursor.take().unwrap_or_else(FileCursor::start);
            cursor.completed = true;
            self.save_cursor(&path, cursor).await?;
            state.file_idx += 1;
            state.cursor = None;
            return Ok(StepOutcome::Skipped);
        }

        let row_id = Self::row_id_of(&row);
        let cursor = state.cursor.expect("loaded above");

        if cursor.already_published(row_id.as_ordinal()) {
            return Ok(StepOutcome::Skipped);
        }

        let incident_date_raw = row.get("Incident Date").unwrap_or_default();
        if incident_date_raw.is_empty() {
            return Ok(StepOutcome::Skipped);
        }

        let Some(incident_date) = parse_any_datetime(incident_date_raw, &self.date_formats) else {
            return Ok(StepOutcome::RecordFailure(PipelineError::Parse(format!(
                "unparseable Incident Date {incident_date_raw:?} for row {row_id}"
            ))));
        };

        if incident_date < self.effective_start_date {
            return Ok(StepOutcome::Skipped);
        }

        let row_cursor_existing = self.kv.get(&row_cursor_key(&row_id)).await?;
        if let Some(value) = row_cursor_existing {
            if serde_json::from_str::<RowCursor>(&value).map(|c| c.processed).unwrap_or(false) {
                return Ok(StepOutcome::Skipped);
            }
        }

        let incident_number =
            IncidentNumber::new(row.get("Incident Number").unwrap_or_default().to_string());
        let payload = serde_json::to_vec(&row)?;

        self.bus.publish(&self.raw_topic, incident_number.as_str(), &payload).await?;

        let new_cursor = FileCursor::new(row_id.as_ordinal().max(cursor.latest_row), cursor.completed);
        state.cursor = Some(new_cursor);
        self.save_cursor(&path, new_cursor).await?;

        if self.ack_tx.send(AckMessage { row_id, event_time: incident_date }).await.is_err() {
            warn!("ack channel closed; watermark writer task has exited");
        }

        Ok(StepOutcome::Processed { key: incident_number.into_inner(), timestamp: Some(incident_date) })
    }

    async fn flush(&self) -> Result<(), PipelineError> {
        self.bus.flush().await
    }

    async fn restart(&self) -> Result<(), PipelineError> {
        self.bus.delete_topic(&self.raw_topic).await?;
        self.bus.ensure_topic(&self.raw_topic, 1, 1).await?;
        self.bus.reset_to_earliest(&self.raw_topic, self.name()).await?;
        self.kv.delete_matching(&format!("{NAMESPACE}:*")).await?;
        self.kv.set(&format!("{NAMESPACE}:restart_marker"), &Utc::now().to_rfc3339()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_pipeline_domain::ports::DeliveryAck;
    use indexmap::IndexMap;
    use std::collections::HashMap;
    use std::sync::Mutex as SyncMutex;

    struct FakeCsvSource {
        files: Vec<CsvFile>,
        rows: SyncMutex<HashMap<String, Vec<RawRow>>>,
    }

    #[async_trait]
    impl CsvSource for FakeCsvSource {
        async fn list_files(&self) -> Result<Vec<CsvFile>, PipelineError> {
            Ok(self.files.clone())
        }

        async fn next_row(&self, file: &CsvFile) -> Result<Option<RawRow>, PipelineError> {
            let mut rows = self.rows.lock().unwrap();
            Ok(rows.get_mut(&file.path).and_then(|queue| if queue.is_empty() { None } else { Some(queue.remove(0)) }))
        }
    }

    struct FakeBus {
        published: SyncMutex<Vec<(String, String, Vec<u8>)>>,
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
            self.published.lock().unwrap().push((topic.to_string(), key.to_string(), payload.to_vec()));
            Ok(DeliveryAck { key: key.to_string(), event_time: Utc::now() })
        }
        async fn flush(&self) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn poll(&self, _: &str, _: &str) -> Result<Option<(String, Vec<u8>)>, PipelineError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct FakeKv {
        values: SyncMutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KvStore for FakeKv {
        async fn get(&self, key: &str) -> Result<Option<String>, PipelineError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: &str) -> Result<(), PipelineError> {
            self.values.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }
        async fn exists(&self, key: &str) -> Result<bool, PipelineError> {
            Ok(self.values.lock().unwrap().contains_key(key))
        }
        async fn delete_matching(&self, _: &str) -> Result<u64, PipelineError> {
            Ok(0)
        }
        async fn keys_matching(&self, _: &str) -> Result<Vec<String>, PipelineError> {
            Ok(Vec::new())
        }
        async fn set_hash(&self, _: &str, _: &[(String, String)]) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn row(id: &str, incident_date: &str, battalion: &str) -> RawRow {
        let mut fields = IndexMap::new();
        for (k, v) in [
            ("ID", id),
            ("Incident Number", "19123456"),
            ("Incident Date", incident_date),
            ("Battalion", battalion),
        ] {
            fields.insert(k.to_string(), v.to_string());
        }
        RawRow::new(fields)
    }

    async fn build_stage(rows: Vec<RawRow>) -> (SourceStage, Arc<FakeBus>, Arc<FakeKv>) {
        let path = "a.csv".to_string();
        let mut queue = rows;
        queue.push(RawRow::end_of_file());
        let csv_source = Arc::new(FakeCsvSource {
            files: vec![CsvFile { path: path.clone() }],
            rows: SyncMutex::new(HashMap::from([(path, queue)])),
        });
        let bus = Arc::new(FakeBus { published: SyncMutex::new(Vec::new()) });
        let kv = Arc::new(FakeKv::default());

        let stage = SourceStage::new(
            csv_source,
            bus.clone(),
            kv.clone(),
            "raw".to_string(),
            vec!["%Y/%m/%d".to_string()],
            "2021/01/01",
            "%Y/%m/%d",
            16,
        )
        .await
        .unwrap();

        (stage, bus, kv)
    }

    #[tokio::test]
    async fn publishes_row_at_or_after_start_date_and_acks_watermark() {
        let (stage, bus, kv) = build_stage(vec![row("1", "2022/06/01", "B01")]).await;

        let outcome = stage.step().await.unwrap();
        assert!(matches!(outcome, StepOutcome::Processed { .. }));
        assert_eq!(bus.published.lock().unwrap().len(), 1);

        // Let the ack-writer task observe the channel send.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(kv.get(&watermark_key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn skips_row_before_effective_start_date() {
        let (stage, bus, _kv) = build_stage(vec![row("1", "2020/01/01", "B01")]).await;

        let outcome = stage.step().await.unwrap();
        assert!(matches!(outcome, StepOutcome::Skipped));
        assert!(bus.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unparseable_incident_date_is_a_record_failure() {
        let (stage, _bus, _kv) = build_stage(vec![row("1", "not-a-date", "B01")]).await;

        let outcome = stage.step().await.unwrap();
        assert!(matches!(outcome, StepOutcome::RecordFailure(PipelineError::Parse(_))));
    }

    #[tokio::test]
    async fn end_of_file_marks_file_cursor_completed_and_advances() {
        let (stage, _bus, kv) = build_stage(vec![]).await;

        let outcome = stage.step().await.unwrap();
        assert!(matches!(outcome, StepOutcome::Skipped));

        let cursor: FileCursor = serde_json::from_str(&kv.get(&file_cursor_key("a.csv")).await.unwrap().unwrap()).unwrap();
        assert!(cursor.completed);
    }

    #[tokio::test]
    async fn already_published_row_is_skipped() {
        let (stage, bus, _kv) = build_stage(vec![row("1", "2022/06/01", "B01"), row("1", "2022/06/02", "B01")]).await;

        // First call publishes row id 1 and advances the file cursor's latest_row to 1.
        stage.step().await.unwrap();
        // Second row has the same id (1), so `already_published` should skip it.
        let outcome = stage.step().await.unwrap();
        assert!(matches!(outcome, StepOutcome::Skipped));
        assert_eq!(bus.published.lock().unwrap().len(), 1);
    }
}
