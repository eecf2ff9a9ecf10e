// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shared Stage Runtime
//!
//! The batch/flush/watermark/restart orchestration skeleton every stage
//! binary drives through [`run`]. A stage supplies a [`Stage`] implementation
//! (one poll-and-process step, a flush, and a restart routine); the runtime
//! owns the stop predicate, the failure policy, and the per-batch report.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use fire_pipeline_domain::error::PipelineError;

use crate::infrastructure::config::OnFailure;
use crate::infrastructure::StageMetrics;

/// Outcome of one poll-and-process step.
pub enum StepOutcome {
    /// A record was processed and published/persisted successfully.
    Processed { key: String, timestamp: Option<DateTime<Utc>> },
    /// A record was read but intentionally not published (e.g. already
    /// seen, before the effective start date, a duplicate under
    /// `on_duplicate=continue`).
    Skipped,
    /// Nothing was available before the adapter's internal poll timeout.
    /// Does not count toward the batch cap.
    NoMessage,
    /// A record-level failure, subject to `on_failure` policy.
    RecordFailure(PipelineError),
}

/// One iteration's worth of stage-specific behavior.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Human-readable name used in restart-marker and report logging.
    fn name(&self) -> &str;

    /// Poll for and process the next available unit of work.
    async fn step(&self) -> Result<StepOutcome, PipelineError>;

    /// Flush any buffered outbound writes, blocking until acknowledged or
    /// the adapter's internal timeout elapses.
    async fn flush(&self) -> Result<(), PipelineError>;

    /// Tear down this stage's owned topics/KV namespaces, reset its
    /// consumer group to earliest, and emit a restart marker. Idempotent:
    /// a second call when resources are already absent is a no-op.
    async fn restart(&self) -> Result<(), PipelineError>;

    /// Current bus consumer-group lag for this stage's input topic, if it
    /// consumes one. `None` for stages with no consumer group (the source
    /// stage is a pure producer).
    async fn consumer_lag(&self) -> Result<Option<i64>, PipelineError> {
        Ok(None)
    }
}

/// Per-batch counters and the most recently successful record's business
/// key and timestamp, logged as a single structured event per batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub latest_successful_key: Option<String>,
    pub latest_successful_timestamp: Option<DateTime<Utc>>,
}

/// Knobs the runtime needs from [`crate::infrastructure::config::PipelineConfig`],
/// kept stage-agnostic so `Stage` implementations don't have to carry the
/// whole config struct just to satisfy this loop.
pub struct RuntimeConfig {
    pub batch_size: usize,
    pub main_loop: bool,
    pub main_loop_interval: Duration,
    pub main_loop_timeout: Duration,
    pub on_failure: OnFailure,
    pub restart: bool,
}

/// Drive `stage` through the shared batch loop until it signals completion.
///
/// If `config.restart` is set, runs the restart routine and returns without
/// processing any records, matching the restart-mode contract.
pub async fn run(stage: &dyn Stage, config: &RuntimeConfig, metrics: &StageMetrics) -> Result<(), PipelineError> {
    if config.restart {
        info!(stage = stage.name(), "running restart routine");
        stage.restart().await?;
        info!(stage = stage.name(), "restart complete, exiting without processing");
        return Ok(());
    }

    loop {
        let report = run_one_batch(stage, config, metrics).await?;
        info!(
            stage = stage.name(),
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            latest_successful_key = report.latest_successful_key.as_deref().unwrap_or(""),
            "batch complete"
        );

        if let Some(lag) = stage.consumer_lag().await? {
            metrics.set_consumer_lag(lag);
        }

        if !config.main_loop {
            return Ok(());
        }

        tokio::time::sleep(config.main_loop_interval).await;
    }
}

async fn run_one_batch(stage: &dyn Stage, config: &RuntimeConfig, metrics: &StageMetrics) -> Result<BatchReport, PipelineError> {
    let mut report = BatchReport::default();
    let batch_start = Instant::now();

    loop {
        if report.processed >= config.batch_size as u64 {
            break;
        }
        if batch_start.elapsed() > config.main_loop_timeout {
            break;
        }

        match stage.step().await {
            Ok(StepOutcome::Processed { key, timestamp }) => {
                report.processed += 1;
                report.succeeded += 1;
                report.latest_successful_key = Some(key);
                report.latest_successful_timestamp = timestamp;
                metrics.inc_processed(1);
            }
            Ok(StepOutcome::Skipped) => {
                report.processed += 1;
            }
            Ok(StepOutcome::NoMessage) => {
                // Not counted toward the batch cap; re-check the wall-clock
                // cap on the next iteration rather than spinning forever.
                if batch_start.elapsed() > config.main_loop_timeout {
                    break;
                }
            }
            Ok(StepOutcome::RecordFailure(err)) => {
                report.processed += 1;
                report.failed += 1;
                metrics.inc_failed(1);
                warn!(stage = stage.name(), category = err.category(), error = %err, "record-level failure");
                if matches!(config.on_failure, OnFailure::Raise) {
                    stage.flush().await?;
                    return Ok(report);
                }
            }
            Err(err) => {
                // Infrastructure errors always abort the batch.
                warn!(stage = stage.name(), error = %err, "infrastructure error, aborting batch");
                let _ = stage.flush().await;
                return Err(err);
            }
        }
    }

    stage.flush().await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingStage {
        steps: Mutex<Vec<StepOutcome>>,
        flushed: AtomicUsize,
    }

    #[async_trait]
    impl Stage for CountingStage {
        fn name(&self) -> &str {
            "test-stage"
        }

        async fn step(&self) -> Result<StepOutcome, PipelineError> {
            let mut steps = self.steps.lock().unwrap();
            if steps.is_empty() {
                return Ok(StepOutcome::NoMessage);
            }
            Ok(steps.remove(0))
        }

        async fn flush(&self) -> Result<(), PipelineError> {
            self.flushed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn restart(&self) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn base_config() -> RuntimeConfig {
        RuntimeConfig {
            batch_size: 2,
            main_loop: false,
            main_loop_interval: Duration::from_secs(0),
            main_loop_timeout: Duration::from_secs(60),
            on_failure: OnFailure::Continue,
            restart: false,
        }
    }

    #[tokio::test]
    async fn batch_cap_stops_processing_and_flushes() {
        let stage = CountingStage {
            steps: Mutex::new(vec![
                StepOutcome::Processed { key: "A".to_string(), timestamp: None },
                StepOutcome::Processed { key: "B".to_string(), timestamp: None },
                StepOutcome::Processed { key: "C".to_string(), timestamp: None },
            ]),
            flushed: AtomicUsize::new(0),
        };
        let metrics = StageMetrics::new("test-stage").unwrap();
        let report = run_one_batch(&stage, &base_config(), &metrics).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.latest_successful_key.as_deref(), Some("B"));
        assert_eq!(stage.flushed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn continue_policy_keeps_processing_after_failure() {
        let stage = CountingStage {
            steps: Mutex::new(vec![
                StepOutcome::RecordFailure(PipelineError::Parse("bad row".to_string())),
                StepOutcome::Processed { key: "A".to_string(), timestamp: None },
            ]),
            flushed: AtomicUsize::new(0),
        };
        let metrics = StageMetrics::new("test-stage").unwrap();
        let report = run_one_batch(&stage, &base_config(), &metrics).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
    }

    #[tokio::test]
    async fn raise_policy_stops_batch_after_flush() {
        let mut config = base_config();
        config.on_failure = OnFailure::Raise;
        config.batch_size = 10;
        let stage = CountingStage {
            steps: Mutex::new(vec![
                StepOutcome::RecordFailure(PipelineError::Parse("bad row".to_string())),
                StepOutcome::Processed { key: "A".to_string(), timestamp: None },
            ]),
            flushed: AtomicUsize::new(0),
        };
        let metrics = StageMetrics::new("test-stage").unwrap();
        let report = run_one_batch(&stage, &config, &metrics).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(stage.flushed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn infrastructure_error_aborts_batch() {
        struct FailingStage;
        #[async_trait]
        impl Stage for FailingStage {
            fn name(&self) -> &str {
                "failing-stage"
            }
            async fn step(&self) -> Result<StepOutcome, PipelineError> {
                Err(PipelineError::Kv("connection refused".to_string()))
            }
            async fn flush(&self) -> Result<(), PipelineError> {
                Ok(())
            }
            async fn restart(&self) -> Result<(), PipelineError> {
                Ok(())
            }
        }

        let metrics = StageMetrics::new("failing-stage").unwrap();
        let result = run_one_batch(&FailingStage, &base_config(), &metrics).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn restart_mode_exits_without_processing() {
        struct RestartTrackingStage {
            restarted: AtomicUsize,
        }
        #[async_trait]
        impl Stage for RestartTrackingStage {
            fn name(&self) -> &str {
                "restart-stage"
            }
            async fn step(&self) -> Result<StepOutcome, PipelineError> {
                panic!("step should never be called in restart mode");
            }
            async fn flush(&self) -> Result<(), PipelineError> {
                Ok(())
            }
            async fn restart(&self) -> Result<(), PipelineError> {
                self.restarted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let stage = RestartTrackingStage { restarted: AtomicUsize::new(0) };
        let mut config = base_config();
        config.restart = true;
        let metrics = StageMetrics::new("restart-stage").unwrap();
        run(&stage, &config, &metrics).await.unwrap();
        assert_eq!(stage.restarted.load(Ordering::SeqCst), 1);
    }
}
