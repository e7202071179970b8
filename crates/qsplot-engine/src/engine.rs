//! The host-facing engine handle.
//!
//! Producers on any thread stage data through `Engine`; a single render
//! thread owns the window and every GPU object and picks staged data up at
//! the start of each frame.

use crate::{
    app::Viewer,
    config::RendererConfig,
    staging::{point_set, point_set_flat, DimensionLabels, Staging, StagingError},
};
use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicI32, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use winit::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::{EventLoop, EventLoopBuilder},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::WindowBuilder,
};

/// State shared between the host handle and the render thread.
#[derive(Debug)]
pub struct Shared {
    pub(crate) staging: Staging,
    pub(crate) running: AtomicBool,
    pub(crate) selected: AtomicI32,
}

impl Shared {
    fn new() -> Self {
        Self {
            staging: Staging::new(),
            running: AtomicBool::new(false),
            selected: AtomicI32::new(-1),
        }
    }
}

pub struct Engine {
    config: RendererConfig,
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::new()),
            thread: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Spawns the render thread. Does nothing while it is already running.
    pub fn start(&self) -> Result<()> {
        let mut slot = self.thread.lock();
        if self.shared.running.swap(true, Ordering::AcqRel) {
            log::warn!("Engine already running; start ignored");
            return Ok(());
        }
        // A thread that exited on its own (window closed) is reaped here.
        if let Some(old) = slot.take() {
            join(old);
        }

        let config = self.config.clone();
        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name("qsplot-render".into())
            .spawn(move || render_thread(config, shared));

        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                log::info!("Render thread started");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }

    /// Signals the render thread to exit and waits for its teardown.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            join(handle);
        }
    }

    /// False before `start`, after `stop`, and once the window was closed or
    /// the render thread failed.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Replaces the current point state. Empty input clears it.
    pub fn set_points(&self, positions: &[[f32; 3]], values: &[f32]) -> Result<(), StagingError> {
        let set = point_set(positions, values)?;
        log::trace!("Staged {} points", set.len());
        self.shared.staging.stage_current(set)
    }

    /// `set_points` with positions flattened as `[x0, y0, z0, x1, ...]`.
    pub fn set_points_flat(&self, positions: &[f32], values: &[f32]) -> Result<(), StagingError> {
        let set = point_set_flat(positions, values)?;
        log::trace!("Staged {} points", set.len());
        self.shared.staging.stage_current(set)
    }

    /// Stages values exactly as given, with no normalization on the way in.
    /// Ingestion never normalizes, so this is `set_points` under the name
    /// hosts with preprocessing pipelines expect.
    pub fn set_points_raw(&self, positions: &[[f32; 3]], values: &[f32]) -> Result<(), StagingError> {
        self.set_points(positions, values)
    }

    /// Replaces the morph target. Index `i` of the target morphs point `i`
    /// of the current state.
    pub fn set_target_points(&self, positions: &[[f32; 3]], values: &[f32]) -> Result<(), StagingError> {
        let set = point_set(positions, values)?;
        log::trace!("Staged {} target points", set.len());
        self.shared.staging.stage_next(set)
    }

    pub fn set_target_points_flat(&self, positions: &[f32], values: &[f32]) -> Result<(), StagingError> {
        let set = point_set_flat(positions, values)?;
        log::trace!("Staged {} target points", set.len());
        self.shared.staging.stage_next(set)
    }

    pub fn set_tickers(&self, tickers: Vec<String>) {
        self.shared.staging.set_tickers(tickers);
    }

    /// Ticker of the selected point, or an empty string when nothing is
    /// selected or the selection has no ticker.
    pub fn selected_ticker(&self) -> String {
        self.shared
            .staging
            .ticker(self.selected_id())
            .unwrap_or_default()
    }

    /// Index of the selected point, -1 when none.
    pub fn selected_id(&self) -> i32 {
        self.shared.selected.load(Ordering::Acquire)
    }

    pub fn set_dimension_labels(
        &self,
        color: impl Into<String>,
        x: impl Into<String>,
        y: impl Into<String>,
        z: impl Into<String>,
    ) {
        self.shared.staging.set_labels(DimensionLabels {
            color: color.into(),
            x: x.into(),
            y: y.into(),
            z: z.into(),
        });
    }

    /// Requests a PPM screenshot of the next rendered frame. Returns
    /// immediately; failures are logged by the render thread.
    pub fn save_screenshot(&self, path: impl Into<PathBuf>) {
        self.shared.staging.request_screenshot(path.into());
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::error!("Render thread panicked");
    }
}

fn render_thread(config: RendererConfig, shared: Arc<Shared>) {
    if let Err(e) = run_event_loop(&config, &shared) {
        log::error!("Render thread failed: {:#}", e);
    }
    shared.running.store(false, Ordering::Release);
    log::info!("Render thread stopped");
}

#[cfg(target_os = "macos")]
fn build_event_loop() -> Result<EventLoop<()>> {
    bail!("macOS only allows windows on the main thread; the render thread cannot open one")
}

#[cfg(not(target_os = "macos"))]
fn build_event_loop() -> Result<EventLoop<()>> {
    #[allow(unused_mut)]
    let mut builder = EventLoopBuilder::new();

    #[cfg(any(
        target_os = "linux",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    winit::platform::x11::EventLoopBuilderExtX11::with_any_thread(&mut builder, true);

    #[cfg(target_os = "windows")]
    winit::platform::windows::EventLoopBuilderExtWindows::with_any_thread(&mut builder, true);

    Ok(builder.build()?)
}

fn run_event_loop(config: &RendererConfig, shared: &Arc<Shared>) -> Result<()> {
    let mut event_loop = build_event_loop()?;

    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.as_str())
            .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
            .build(&event_loop)?,
    );

    let mut viewer = pollster::block_on(Viewer::new(window.clone(), config, shared.clone()))?;
    let mut fatal: Option<wgpu::SurfaceError> = None;

    while shared.running.load(Ordering::Acquire) {
        let status = event_loop.pump_events(Some(Duration::ZERO), |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == viewer.window().id() => {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::RedrawRequested => match viewer.render() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            viewer.recover_surface();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            log::debug!("Surface timeout; frame skipped");
                        }
                        Err(e) => {
                            fatal = Some(e);
                            elwt.exit();
                        }
                    },
                    other => viewer.handle_event(&other),
                }
            }
            Event::AboutToWait => viewer.window().request_redraw(),
            _ => {}
        });

        if let PumpStatus::Exit(code) = status {
            log::info!("Window closed (exit code {})", code);
            break;
        }
    }

    if let Some(e) = fatal {
        bail!("unrecoverable surface error: {:?}", e);
    }
    Ok(())
}
