//! Producer-side staging area for point data.
//!
//! Producer threads replace whole arrays under one mutex and raise a dirty
//! flag; the render thread takes the arrays once per frame and uploads them
//! outside the lock. Two independent slots exist: the current state and the
//! morph target.

use parking_lot::Mutex;
use std::mem;
use std::path::PathBuf;
use thiserror::Error;

/// One state of the point cloud: positions and their scalar values,
/// index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    pub positions: Vec<[f32; 3]>,
    pub values: Vec<f32>,
}

impl PointSet {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks that every value has a position.
    pub fn validate(&self) -> Result<(), StagingError> {
        if self.positions.len() != self.values.len() {
            return Err(StagingError::LengthMismatch {
                positions: self.positions.len(),
                values: self.values.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StagingError {
    #[error("positions describe {positions} points but {values} values were given")]
    LengthMismatch { positions: usize, values: usize },
    #[error("flattened positions length {0} is not a multiple of 3")]
    NotTriples(usize),
}

/// Labels shown in the overlay next to the color legend and axes.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionLabels {
    pub color: String,
    pub x: String,
    pub y: String,
    pub z: String,
}

impl Default for DimensionLabels {
    fn default() -> Self {
        Self {
            color: "Feature 0".to_string(),
            x: "PCA 1".to_string(),
            y: "PCA 2".to_string(),
            z: "PCA 3".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    staged: PointSet,
    dirty: bool,
}

impl Slot {
    fn replace(&mut self, set: PointSet) {
        self.staged = set;
        self.dirty = true;
    }

    fn take(&mut self) -> Option<PointSet> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(mem::take(&mut self.staged))
    }
}

#[derive(Debug, Default)]
struct StagingState {
    current: Slot,
    next: Slot,
    tickers: Vec<String>,
    labels: DimensionLabels,
    screenshot: Option<PathBuf>,
}

/// Data taken by the render thread for one frame. `None` means the slot was
/// not touched since the last take.
#[derive(Debug, Default)]
pub struct PendingUploads {
    pub current: Option<PointSet>,
    pub next: Option<PointSet>,
}

#[derive(Debug, Default)]
pub struct Staging {
    state: Mutex<StagingState>,
}

/// Validates and copies structured input. Empty input is "no data".
pub fn point_set(positions: &[[f32; 3]], values: &[f32]) -> Result<PointSet, StagingError> {
    if positions.len() != values.len() {
        return Err(StagingError::LengthMismatch {
            positions: positions.len(),
            values: values.len(),
        });
    }
    Ok(PointSet {
        positions: positions.to_vec(),
        values: values.to_vec(),
    })
}

/// Validates and copies an N×3 flattened position array.
pub fn point_set_flat(positions: &[f32], values: &[f32]) -> Result<PointSet, StagingError> {
    if positions.len() % 3 != 0 {
        return Err(StagingError::NotTriples(positions.len()));
    }
    if positions.len() / 3 != values.len() {
        return Err(StagingError::LengthMismatch {
            positions: positions.len() / 3,
            values: values.len(),
        });
    }
    Ok(PointSet {
        positions: positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect(),
        values: values.to_vec(),
    })
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the staged current state. A set with mismatched lengths is
    /// rejected and the slot keeps its previous contents.
    pub fn stage_current(&self, set: PointSet) -> Result<(), StagingError> {
        set.validate()?;
        self.state.lock().current.replace(set);
        Ok(())
    }

    /// Replaces the staged morph target.
    pub fn stage_next(&self, set: PointSet) -> Result<(), StagingError> {
        set.validate()?;
        self.state.lock().next.replace(set);
        Ok(())
    }

    /// Takes whatever was staged since the last call and clears the dirty
    /// flags. The arrays are moved out, so the lock is held for O(1).
    pub fn take_uploads(&self) -> PendingUploads {
        let mut state = self.state.lock();
        PendingUploads {
            current: state.current.take(),
            next: state.next.take(),
        }
    }

    pub fn set_tickers(&self, tickers: Vec<String>) {
        self.state.lock().tickers = tickers;
    }

    /// Ticker for a point index; `None` for negative or out-of-range indices.
    pub fn ticker(&self, index: i32) -> Option<String> {
        let index = usize::try_from(index).ok()?;
        self.state.lock().tickers.get(index).cloned()
    }

    pub fn set_labels(&self, labels: DimensionLabels) {
        self.state.lock().labels = labels;
    }

    pub fn labels(&self) -> DimensionLabels {
        self.state.lock().labels.clone()
    }

    /// Records a screenshot request, replacing any request not yet serviced.
    pub fn request_screenshot(&self, path: PathBuf) {
        self.state.lock().screenshot = Some(path);
    }

    pub fn take_screenshot(&self) -> Option<PathBuf> {
        self.state.lock().screenshot.take()
    }
}
