//! Render-thread mirror of the uploaded point data.
//!
//! The GPU instance buffers are always written from this mirror, which keeps
//! the morph-target arrays exactly `render_count` long so the instanced draw
//! never reads past a buffer.

use crate::color::morph;
use crate::staging::{PendingUploads, PointSet};

/// Which GPU streams must be rewritten after applying staged data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dirty {
    pub current: bool,
    pub next: bool,
}

impl Dirty {
    pub fn any(self) -> bool {
        self.current || self.next
    }
}

#[derive(Debug, Default)]
pub struct PointCloud {
    current: PointSet,
    /// The most recently staged morph target, as given.
    target: PointSet,
    /// `target` truncated or padded with `current` to `current.len()`.
    next: PointSet,
}

/// Fits a morph target to `current`: entries past the target's end hold the
/// current state, entries past `current`'s end are dropped.
pub fn align_target(current: &PointSet, target: &PointSet) -> PointSet {
    let n = current.len();
    let shared = target.len().min(n);
    let mut next = PointSet {
        positions: Vec::with_capacity(n),
        values: Vec::with_capacity(n),
    };
    next.positions.extend_from_slice(&target.positions[..shared]);
    next.values.extend_from_slice(&target.values[..shared]);
    next.positions.extend_from_slice(&current.positions[shared..]);
    next.values.extend_from_slice(&current.values[shared..]);
    next
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies staged data. `render_count` only follows the current state;
    /// a target upload never resizes the draw.
    pub fn apply(&mut self, pending: PendingUploads) -> Dirty {
        let mut dirty = Dirty::default();
        if let Some(current) = pending.current {
            let resized = current.len() != self.current.len();
            self.current = current;
            dirty.current = true;
            // A resize or a fresh current state both invalidate the padding.
            dirty.next = resized || self.target.len() < self.current.len();
        }
        if let Some(target) = pending.next {
            self.target = target;
            dirty.next = true;
        }
        if dirty.next {
            self.next = align_target(&self.current, &self.target);
        }
        dirty
    }

    /// Number of instances drawn.
    pub fn render_count(&self) -> usize {
        self.current.len()
    }

    pub fn current(&self) -> &PointSet {
        &self.current
    }

    pub fn next(&self) -> &PointSet {
        &self.next
    }

    /// Position and value of one instance at morph `time`, as the shader
    /// computes them.
    pub fn interpolated(&self, index: usize, time: f32) -> Option<([f32; 3], f32)> {
        let p0 = self.current.positions.get(index)?;
        let v0 = *self.current.values.get(index)?;
        let p1 = self.next.positions.get(index)?;
        let v1 = *self.next.values.get(index)?;
        Some((
            [
                morph(p0[0], p1[0], time),
                morph(p0[1], p1[1], time),
                morph(p0[2], p1[2], time),
            ],
            morph(v0, v1, time),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, offset: f32) -> PointSet {
        PointSet {
            positions: (0..n).map(|i| [i as f32 + offset, 0.0, -(i as f32)]).collect(),
            values: (0..n).map(|i| i as f32 / 10.0 + offset).collect(),
        }
    }

    fn current(set: PointSet) -> PendingUploads {
        PendingUploads { current: Some(set), next: None }
    }

    fn target(set: PointSet) -> PendingUploads {
        PendingUploads { current: None, next: Some(set) }
    }

    #[test]
    fn render_count_follows_current_only() {
        let mut cloud = PointCloud::new();
        cloud.apply(current(ramp(5, 0.0)));
        assert_eq!(cloud.render_count(), 5);
        cloud.apply(target(ramp(9, 1.0)));
        assert_eq!(cloud.render_count(), 5);
        assert_eq!(cloud.next().len(), 5);
        cloud.apply(current(PointSet::default()));
        assert_eq!(cloud.render_count(), 0);
        assert!(cloud.next().is_empty());
    }

    #[test]
    fn without_target_next_equals_current() {
        let mut cloud = PointCloud::new();
        cloud.apply(current(ramp(3, 0.0)));
        assert_eq!(cloud.next(), cloud.current());
    }

    #[test]
    fn short_target_is_padded_with_current() {
        let cur = ramp(4, 0.0);
        let tgt = ramp(2, 5.0);
        let next = align_target(&cur, &tgt);
        assert_eq!(next.len(), 4);
        assert_eq!(&next.values[..2], &tgt.values[..]);
        assert_eq!(&next.values[2..], &cur.values[2..]);
        assert_eq!(next.positions[3], cur.positions[3]);
    }

    #[test]
    fn morph_endpoints_match_buffers_exactly() {
        let mut cloud = PointCloud::new();
        let cur = ramp(6, 0.0);
        let tgt = ramp(6, 2.5);
        cloud.apply(current(cur.clone()));
        cloud.apply(target(tgt.clone()));
        for i in 0..6 {
            assert_eq!(cloud.interpolated(i, 0.0), Some((cur.positions[i], cur.values[i])));
            assert_eq!(cloud.interpolated(i, 1.0), Some((tgt.positions[i], tgt.values[i])));
        }
        assert_eq!(cloud.interpolated(6, 0.5), None);
    }

    #[test]
    fn new_current_keeps_a_longer_target() {
        let mut cloud = PointCloud::new();
        cloud.apply(target(ramp(8, 3.0)));
        let dirty = cloud.apply(current(ramp(4, 0.0)));
        assert!(dirty.current && dirty.next);
        assert_eq!(cloud.next().values, ramp(8, 3.0).values[..4].to_vec());
    }

    #[test]
    fn interpolation_without_target_is_constant() {
        let mut cloud = PointCloud::new();
        cloud.apply(current(ramp(2, 0.0)));
        assert_eq!(cloud.interpolated(1, 0.7).map(|(_, v)| v), Some(0.1));
        assert_eq!(cloud.interpolated(2, 0.0), None);
    }
}
