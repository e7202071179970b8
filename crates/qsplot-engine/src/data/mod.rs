// src/data/mod.rs
//! Data handling modules for the point cloud engine.
//!
//! This module provides functionality for:
//! - Mirroring uploaded point data on the render thread and aligning morph targets.
//! - Aligning labelled frames on their tickers before they are staged.
//! - Defining the data structures for GPU buffers.

pub mod frame;
pub mod point_cloud;
pub mod types;

// Re-export commonly used types for convenience.
pub use self::frame::{align_by_ticker, LabeledFrame};
pub use self::point_cloud::PointCloud;
pub use self::types::{GizmoVertex, SceneUniform};
