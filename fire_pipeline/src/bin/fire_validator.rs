// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `fire-validator`: consumes the raw events topic, applies the
//! data-quality rules, and forks each record onto the validated or rejected
//! topic.

use std::process::ExitCode;
use std::sync::Arc;

use fire_pipeline::application::{self, RuntimeConfig, Stage, ValidatorStage};
use fire_pipeline::infrastructure::{init_logging, MetricsEndpoint, PipelineConfig, RdKafkaBus, StageMetrics};
use fire_pipeline_bootstrap::cli::ValidatedCommand;
use fire_pipeline_bootstrap::config::BootstrapConfig;
use fire_pipeline_bootstrap::shutdown::ShutdownCoordinator;
use fire_pipeline_bootstrap::{bootstrap_cli, result_to_exit_code, signals};
use fire_pipeline_domain::ports::MessageBus;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            tracing::error!(error = %e, "failed to parse CLI arguments");
            return ExitCode::from(64);
        }
    };

    let config = match PipelineConfig::load() {
        Ok(config) => config,
        Err(e) => return result_to_exit_code::<fire_pipeline_domain::error::PipelineError>(Err(e)),
    };

    if matches!(cli.command, ValidatedCommand::CheckConfig) {
        tracing::info!(?config, "configuration is valid");
        return ExitCode::SUCCESS;
    }

    let bootstrap_config = BootstrapConfig::from_validated_cli(&cli);

    let (restart, topic_override, group_id_override) = match cli.command {
        ValidatedCommand::Run { restart, topic_override, group_id_override } => (restart, topic_override, group_id_override),
        ValidatedCommand::CheckConfig => unreachable!("handled above"),
    };

    let raw_topic = topic_override.unwrap_or_else(|| config.fire_event_source_topic.clone());

    result_to_exit_code(run(config, raw_topic, group_id_override, restart, bootstrap_config).await)
}

async fn run(
    config: PipelineConfig,
    raw_topic: String,
    group_id_override: Option<String>,
    restart: bool,
    bootstrap_config: BootstrapConfig,
) -> Result<(), fire_pipeline_domain::error::PipelineError> {
    let bus = Arc::new(RdKafkaBus::new(&config.kafka_bootstrap_servers)?);

    bus.ensure_topic(&raw_topic, 1, 1).await?;
    bus.ensure_topic(&config.validated_events_topic, 1, 1).await?;
    bus.ensure_topic(&config.unvalidated_events_topic, 1, 1).await?;

    let mut stage = ValidatorStage::new(
        bus.clone(),
        raw_topic,
        config.validated_events_topic.clone(),
        config.unvalidated_events_topic.clone(),
        config.date_formats.clone(),
        config.additional_allowed_empty_fields.clone(),
    );
    if let Some(group_id) = group_id_override {
        stage = stage.with_group_id(group_id);
    }

    let metrics = Arc::new(StageMetrics::new(stage.name())?);
    tokio::spawn({
        let metrics = metrics.clone();
        let port = config.metrics_port;
        async move { MetricsEndpoint::new(metrics).serve(port).await }
    });

    let coordinator = ShutdownCoordinator::new(bootstrap_config.shutdown_grace_period);
    signals::install(coordinator.clone());

    let runtime_config = RuntimeConfig {
        batch_size: config.batch_size,
        main_loop: config.main_loop,
        main_loop_interval: config.main_loop_interval,
        main_loop_timeout: config.main_loop_timeout,
        on_failure: config.on_failure,
        restart,
    };

    tokio::select! {
        result = application::run(&stage, &runtime_config, &metrics) => result,
        _ = coordinator.token().cancelled() => {
            tracing::info!("shutdown signal received, exiting after current batch flush");
            Ok(())
        }
    }
}
