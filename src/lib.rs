// THEORY:
// This file is the main entry point for the `scene_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API exposed to external consumers (UI shells, renderers, batch
// runners).
//
// The primary goal is to export the pipeline entry points and their data
// structures as the clean, high-level interface for the engine. The
// internal modules (`core_modules`) stay reachable for consumers that want
// to drive individual stages, but the expected surface is `pipeline` for
// direct calls and `worker` for serialized background processing.

pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod worker;

pub use error::{EngineError, Result};
pub use pipeline::{
    ClassificationReport, PathResult, PipelineConfig, classify_scene, find_optimal_path,
};
