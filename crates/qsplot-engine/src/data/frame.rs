//! Labelled frames and their alignment for morphing.
//!
//! Morph targets are index-aligned with the current state. When two time
//! steps come from a source keyed by ticker, only tickers present in both can
//! morph, and both frames must list them in the same order.

use crate::staging::PointSet;
use std::collections::HashMap;

/// One time step: a point per ticker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledFrame {
    pub tickers: Vec<String>,
    pub points: PointSet,
}

impl LabeledFrame {
    pub fn len(&self) -> usize {
        self.tickers.len().min(self.points.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn index_of(frame: &LabeledFrame) -> HashMap<&str, usize> {
    let mut map = HashMap::with_capacity(frame.len());
    for (i, t) in frame.tickers.iter().take(frame.len()).enumerate() {
        map.entry(t.as_str()).or_insert(i);
    }
    map
}

/// Restricts both frames to their common tickers, sorted by ticker.
/// Returns `None` when they share no ticker. Duplicate tickers keep their
/// first occurrence.
pub fn align_by_ticker(
    current: &LabeledFrame,
    next: &LabeledFrame,
) -> Option<(LabeledFrame, LabeledFrame)> {
    let cur_idx = index_of(current);
    let next_idx = index_of(next);

    let mut common: Vec<&str> = cur_idx
        .keys()
        .filter(|t| next_idx.contains_key(*t))
        .copied()
        .collect();
    if common.is_empty() {
        return None;
    }
    common.sort_unstable();

    let pick = |frame: &LabeledFrame, idx: &HashMap<&str, usize>| {
        let mut out = LabeledFrame {
            tickers: Vec::with_capacity(common.len()),
            points: PointSet {
                positions: Vec::with_capacity(common.len()),
                values: Vec::with_capacity(common.len()),
            },
        };
        for t in &common {
            let i = idx[t];
            out.tickers.push((*t).to_string());
            out.points.positions.push(frame.points.positions[i]);
            out.points.values.push(frame.points.values[i]);
        }
        out
    };

    Some((pick(current, &cur_idx), pick(next, &next_idx)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tickers: &[&str], base: f32) -> LabeledFrame {
        LabeledFrame {
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            points: PointSet {
                positions: (0..tickers.len()).map(|i| [base + i as f32, 0.0, 0.0]).collect(),
                values: (0..tickers.len()).map(|i| base + i as f32).collect(),
            },
        }
    }

    #[test]
    fn keeps_common_tickers_sorted() {
        let a = frame(&["MSFT", "AAPL", "TSLA"], 0.0);
        let b = frame(&["GOOG", "AAPL", "MSFT"], 10.0);
        let (ca, cb) = align_by_ticker(&a, &b).expect("overlap");
        assert_eq!(ca.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(cb.tickers, ca.tickers);
        // AAPL is index 1 in `a` and index 1 in `b`.
        assert_eq!(ca.points.values, vec![1.0, 0.0]);
        assert_eq!(cb.points.values, vec![11.0, 12.0]);
    }

    #[test]
    fn disjoint_frames_do_not_align() {
        let a = frame(&["A"], 0.0);
        let b = frame(&["B"], 0.0);
        assert!(align_by_ticker(&a, &b).is_none());
    }

    #[test]
    fn duplicate_tickers_use_first_occurrence() {
        let a = frame(&["X", "X"], 0.0);
        let b = frame(&["X"], 5.0);
        let (ca, cb) = align_by_ticker(&a, &b).expect("overlap");
        assert_eq!(ca.points.values, vec![0.0]);
        assert_eq!(cb.points.values, vec![5.0]);
    }
}
