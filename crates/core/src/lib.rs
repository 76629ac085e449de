//! Face tracking and per-identity demographic aggregation for videos.
//!
//! Layers follow a ports-and-adapters split: `domain` modules hold the
//! traits and pure logic, `infrastructure` modules bind them to ffmpeg,
//! ONNX Runtime and the filesystem, and `pipeline` wires a run together.

pub mod aggregation;
pub mod analysis;
pub mod annotation;
pub mod export;
pub mod identity;
pub mod pipeline;
pub mod shared;
pub mod video;
