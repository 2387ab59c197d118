//! autopatch-rollout: from probed hosts to outcome records.
//!
//! # Architecture
//!
//! ```text
//! run_pipeline
//!   ├── Topology::classify          standalone / clusters
//!   ├── ProbePool::probe_all        one phase per group, join barrier
//!   └── PatchController (blocking)
//!         ├── standalone: gate per host → single-host batch
//!         └── cluster:    ClusterGate → plan_batches → sequential batches
//! ```
//!
//! Clusters are all-or-nothing: one eligible member failing its probe
//! skips the whole cluster. Standalone hosts are gated one by one.

pub mod controller;
pub mod gate;
pub mod pipeline;
pub mod planner;

pub use controller::PatchController;
pub use gate::{ClusterGate, GateViolation};
pub use pipeline::{PipelineOptions, RunReport, run_pipeline};
pub use planner::plan_batches;
