// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage Metrics
//!
//! Prometheus counters/gauges for one stage process: records processed and
//! failed, and the bus consumer-group lag. Deliberately thin — spec §4.9
//! names this as ambient, non-core observability, not a per-record metrics
//! surface.

use std::sync::Arc;

use prometheus::{IntCounter, IntGauge, Opts, Registry};

use fire_pipeline_domain::error::PipelineError;

#[derive(Clone)]
pub struct StageMetrics {
    registry: Arc<Registry>,
    records_processed_total: IntCounter,
    records_failed_total: IntCounter,
    consumer_lag: IntGauge,
}

impl StageMetrics {
    pub fn new(stage_name: &str) -> Result<Self, PipelineError> {
        let registry = Registry::new();

        let records_processed_total = IntCounter::with_opts(
            Opts::new("records_processed_total", "Total records processed by this stage")
                .const_label("stage", stage_name),
        )
        .map_err(|e| PipelineError::Config(e.to_string()))?;

        let records_failed_total = IntCounter::with_opts(
            Opts::new("records_failed_total", "Total records that failed processing in this stage")
                .const_label("stage", stage_name),
        )
        .map_err(|e| PipelineError::Config(e.to_string()))?;

        let consumer_lag = IntGauge::with_opts(
            Opts::new("consumer_lag", "Current bus consumer-group lag").const_label("stage", stage_name),
        )
        .map_err(|e| PipelineError::Config(e.to_string()))?;

        registry.register(Box::new(records_processed_total.clone())).map_err(|e| PipelineError::Config(e.to_string()))?;
        registry.register(Box::new(records_failed_total.clone())).map_err(|e| PipelineError::Config(e.to_string()))?;
        registry.register(Box::new(consumer_lag.clone())).map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(Self { registry: Arc::new(registry), records_processed_total, records_failed_total, consumer_lag })
    }

    pub fn inc_processed(&self, n: u64) {
        self.records_processed_total.inc_by(n);
    }

    pub fn inc_failed(&self, n: u64) {
        self.records_failed_total.inc_by(n);
    }

    pub fn set_consumer_lag(&self, lag: i64) {
        self.consumer_lag.set(lag);
    }

    pub fn render(&self) -> Result<String, PipelineError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).map_err(|e| PipelineError::Config(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_render_into_prometheus_text() {
        let metrics = StageMetrics::new("source").unwrap();
        metrics.inc_processed(3);
        metrics.inc_failed(1);
        metrics.set_consumer_lag(42);

        let text = metrics.render().unwrap();
        assert!(text.contains("records_processed_total"));
        assert!(text.contains("consumer_lag"));
    }
}
