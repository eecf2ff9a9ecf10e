// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Layer
//!
//! The shared stage runtime and the three stage implementations it drives.
//! Each stage is a thin [`stage_runtime::Stage`] implementation wiring one
//! [`fire_pipeline_domain`] port combination (CSV+bus, bus-only, bus+KV)
//! into the batch/flush/watermark/restart loop.

pub mod serving_stage;
pub mod source_stage;
pub mod stage_runtime;
pub mod validator_stage;

pub use serving_stage::ServingStage;
pub use source_stage::SourceStage;
pub use stage_runtime::{run, RuntimeConfig, Stage, StepOutcome};
pub use validator_stage::ValidatorStage;
