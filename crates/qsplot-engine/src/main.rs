//! Demo host: feeds synthetic clustered time series into the engine and
//! morphs between consecutive time steps.

use anyhow::Result;
use clap::Parser;
use qsplot_engine::{align_by_ticker, Engine, LabeledFrame, PointSet, RendererConfig};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

/// `qsplot` - renders a synthetic point cloud time series.
///
/// Tickers are grouped into clusters that drift between time steps. Each
/// step is shown as a morph from one time step to the next; use the
/// "Time Morph" slider in the overlay to scrub between them.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Config {
    /// Number of tickers in the universe.
    #[arg(long, env = "QSPLOT_POINTS", default_value_t = 2000)]
    points: usize,

    /// Number of clusters the tickers are spread over.
    #[arg(long, env = "QSPLOT_CLUSTERS", default_value_t = 5)]
    clusters: usize,

    /// Number of time steps to generate.
    #[arg(long, env = "QSPLOT_STEPS", default_value_t = 6)]
    steps: usize,

    /// Seconds each step stays on screen.
    #[arg(long, env = "QSPLOT_STEP_SECS", default_value_t = 4.0)]
    step_secs: f64,

    /// Probability that a ticker is listed in a given time step.
    #[arg(long, default_value_t = 0.95)]
    coverage: f64,

    /// Seed for the synthetic data.
    #[arg(long, env = "QSPLOT_SEED", default_value_t = 7)]
    seed: u64,

    /// Writes a PPM screenshot after the last step.
    #[arg(long, env = "QSPLOT_SCREENSHOT")]
    screenshot: Option<PathBuf>,

    /// Keeps the window open after the sequence ends until it is closed.
    #[arg(long)]
    hold: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value_t = 0.05)]
    point_scale: f32,

    #[arg(long, default_value_t = 25.0)]
    camera_distance: f32,

    /// Presents without waiting for vertical sync.
    #[arg(long)]
    no_vsync: bool,
}

impl Config {
    fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            window_width: self.width,
            window_height: self.height,
            vsync: !self.no_vsync,
            point_scale: self.point_scale,
            camera_distance: self.camera_distance,
            ..RendererConfig::default()
        }
    }
}

struct Cluster {
    center: [f32; 3],
    drift: [f32; 3],
    value: f32,
}

/// Generates one labelled frame per time step. Tickers keep their cluster
/// across steps; some are missing from some steps.
fn synthetic_frames(cfg: &Config) -> Vec<LabeledFrame> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let clusters = cfg.clusters.max(1);

    let mut groups: Vec<Cluster> = (0..clusters)
        .map(|_| Cluster {
            center: [
                rng.gen_range(-8.0..8.0),
                rng.gen_range(-8.0..8.0),
                rng.gen_range(-8.0..8.0),
            ],
            drift: [
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ],
            value: rng.gen_range(0.0..1.0),
        })
        .collect();

    let tickers: Vec<String> = (0..cfg.points).map(|i| format!("TK{i:05}")).collect();
    let mut frames = Vec::with_capacity(cfg.steps);

    for _ in 0..cfg.steps {
        let mut frame = LabeledFrame {
            tickers: Vec::with_capacity(cfg.points),
            points: PointSet::default(),
        };
        for (i, ticker) in tickers.iter().enumerate() {
            if !rng.gen_bool(cfg.coverage.clamp(0.0, 1.0)) {
                continue;
            }
            let group = &groups[i % clusters];
            let jitter = 1.5;
            frame.tickers.push(ticker.clone());
            frame.points.positions.push([
                group.center[0] + rng.gen_range(-jitter..jitter),
                group.center[1] + rng.gen_range(-jitter..jitter),
                group.center[2] + rng.gen_range(-jitter..jitter),
            ]);
            frame
                .points
                .values
                .push((group.value + rng.gen_range(-0.15..0.15)).clamp(0.0, 1.0));
        }
        frames.push(frame);

        for group in &mut groups {
            for axis in 0..3 {
                group.center[axis] += group.drift[axis];
            }
            group.value = (group.value + rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
        }
    }

    frames
}

/// Sleeps for `secs`, returning early (false) once the window was closed.
fn wait_while_running(engine: &Engine, secs: f64) -> bool {
    let deadline = Instant::now() + Duration::from_secs_f64(secs.max(0.0));
    while Instant::now() < deadline {
        if !engine.is_running() {
            return false;
        }
        thread::sleep(Duration::from_millis(50));
    }
    engine.is_running()
}

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Config::parse();
    log::info!("Starting with {:?}", cfg);

    let frames = synthetic_frames(&cfg);
    let engine = Engine::new(cfg.renderer_config());
    engine.start()?;
    engine.set_dimension_labels("Cluster score", "PCA 1", "PCA 2", "PCA 3");

    for (step, pair) in frames.windows(2).enumerate() {
        let Some((current, next)) = align_by_ticker(&pair[0], &pair[1]) else {
            log::warn!("Step {} shares no tickers with the next one; skipped", step);
            continue;
        };
        log::info!("Step {}: {} aligned tickers", step, current.len());

        engine.set_points_raw(&current.points.positions, &current.points.values)?;
        engine.set_target_points(&next.points.positions, &next.points.values)?;
        engine.set_tickers(current.tickers);

        if !wait_while_running(&engine, cfg.step_secs) {
            break;
        }
        let ticker = engine.selected_ticker();
        if !ticker.is_empty() {
            log::info!("Selected: #{} {}", engine.selected_id(), ticker);
        }
    }

    if let Some(path) = &cfg.screenshot {
        engine.save_screenshot(path.clone());
        wait_while_running(&engine, 0.5);
    }

    if cfg.hold {
        log::info!("Sequence finished; close the window to exit");
        while engine.is_running() {
            thread::sleep(Duration::from_millis(100));
        }
    }

    engine.stop();
    Ok(())
}
