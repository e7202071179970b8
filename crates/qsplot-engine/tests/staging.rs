use qsplot_engine::data::PointCloud;
use qsplot_engine::staging::{point_set, Staging};
use qsplot_engine::{Engine, PointSet, RendererConfig, StagingError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// A set whose every entry encodes its length, so a mix of two writes is
/// detectable.
fn self_describing(n: usize) -> PointSet {
    PointSet {
        positions: vec![[n as f32; 3]; n],
        values: vec![n as f32; n],
    }
}

fn assert_whole(set: &PointSet) {
    let n = set.len();
    assert_eq!(set.positions.len(), n);
    assert!(set.values.iter().all(|&v| v == n as f32), "torn values for n={n}");
    assert!(set.positions.iter().all(|p| *p == [n as f32; 3]), "torn positions for n={n}");
}

#[test]
fn concurrent_writers_never_produce_torn_arrays() {
    let staging = Arc::new(Staging::new());
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let staging = staging.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let n = 1 + (w * 97 + i * 13) % 300;
                    if i % 2 == 0 {
                        staging.stage_current(self_describing(n)).expect("valid");
                    } else {
                        staging.stage_next(self_describing(n)).expect("valid");
                    }
                }
            })
        })
        .collect();

    let reader = {
        let staging = staging.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut cloud = PointCloud::new();
            let mut seen = 0usize;
            loop {
                let finished = done.load(Ordering::Acquire);
                let pending = staging.take_uploads();
                if let Some(current) = &pending.current {
                    assert_whole(current);
                    seen += 1;
                }
                if let Some(next) = &pending.next {
                    assert_whole(next);
                }
                cloud.apply(pending);
                assert_eq!(cloud.next().len(), cloud.render_count());
                if finished {
                    break;
                }
            }
            seen
        })
    };

    for w in writers {
        w.join().expect("writer");
    }
    done.store(true, Ordering::Release);
    reader.join().expect("reader");
}

#[test]
fn staging_replaces_and_uploads_once() {
    let staging = Staging::new();
    staging.stage_current(self_describing(10)).expect("valid");
    staging.stage_current(self_describing(3)).expect("valid");

    let mut cloud = PointCloud::new();
    let dirty = cloud.apply(staging.take_uploads());
    assert!(dirty.current);
    assert_eq!(cloud.render_count(), 3);

    // Nothing new staged: no second upload.
    let dirty = cloud.apply(staging.take_uploads());
    assert!(!dirty.any());
    assert_eq!(cloud.render_count(), 3);
}

#[test]
fn empty_set_points_clears_the_cloud() {
    let staging = Staging::new();
    let mut cloud = PointCloud::new();
    staging.stage_current(self_describing(5)).expect("valid");
    cloud.apply(staging.take_uploads());

    staging
        .stage_current(point_set(&[], &[]).expect("empty is valid"))
        .expect("valid");
    cloud.apply(staging.take_uploads());
    assert_eq!(cloud.render_count(), 0);
}

#[test]
fn engine_rejects_mismatched_input_without_a_window() {
    let engine = Engine::new(RendererConfig::default());
    assert!(!engine.is_running());

    let err = engine
        .set_points(&[[0.0; 3], [1.0; 3]], &[0.5])
        .expect_err("length mismatch");
    assert_eq!(err, StagingError::LengthMismatch { positions: 2, values: 1 });

    let err = engine
        .set_target_points_flat(&[0.0; 7], &[0.0, 0.0])
        .expect_err("not triples");
    assert_eq!(err, StagingError::NotTriples(7));

    assert!(engine.set_points_flat(&[0.0; 6], &[0.1, 0.9]).is_ok());
    assert!(engine.set_points_raw(&[[1.0, 2.0, 3.0]], &[0.3]).is_ok());
}

#[test]
fn selection_queries_default_to_nothing() {
    let engine = Engine::new(RendererConfig::default());
    engine.set_tickers(vec!["AAPL".into(), "MSFT".into()]);
    assert_eq!(engine.selected_id(), -1);
    assert_eq!(engine.selected_ticker(), "");
}

#[test]
fn stop_without_start_is_harmless() {
    let engine = Engine::new(RendererConfig::default());
    engine.stop();
    engine.stop();
    assert!(!engine.is_running());
}
