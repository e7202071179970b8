//! Threaded point cloud renderer.
//!
//! Draws large sets of billboarded points with a scalar value each, morphs
//! between two states, and lets the user orbit, zoom and pick points with the
//! mouse. Data is pushed from any thread through [`Engine`]; a dedicated
//! render thread owns the window and the GPU.

pub mod app;
pub mod camera;
pub mod color;
pub mod config;
pub mod data;
pub mod engine;
pub mod interaction;
pub mod renderer;
pub mod screenshot;
pub mod staging;
pub mod ui;

pub use config::{ColorFilter, ColorMode, RendererConfig};
pub use data::{align_by_ticker, LabeledFrame};
pub use engine::Engine;
pub use staging::{DimensionLabels, PointSet, StagingError};
