//! Live input: evdev device -> slot tracker -> gesture engine.

use anyhow::{Result, anyhow};
use evdev::{AbsoluteAxisCode, EventType, SynchronizationCode};
use log::{error, info, warn};
use notify::{RecursiveMode, Watcher};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    io,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::{Duration, Instant},
};

use crate::config::{ConfigState, InputConfig};
use crate::engine::{EngineConfig, GestureEngine};
use crate::gestures::{EngineWarning, GestureEvent, GestureSink, GestureState};
use crate::input::{self, AxisRanges};
use crate::tracker::Tracker;

/// Tracker and engine for one device, fed raw evdev codes.
pub struct Pipeline<S: GestureSink> {
    tracker: Tracker,
    engine: GestureEngine<S>,
    pending: Option<EngineConfig>,
}

impl<S: GestureSink> Pipeline<S> {
    pub fn new(engine: EngineConfig, input: &InputConfig, ranges: AxisRanges, sink: S) -> Self {
        let mut tracker = Tracker::new();
        tracker.set_norm_ranges(ranges.x_min, ranges.x_max, ranges.y_min, ranges.y_max);
        tracker.set_surface(input.surface_width, input.surface_height);
        Self {
            tracker,
            engine: GestureEngine::new(engine, sink),
            pending: None,
        }
    }

    pub fn engine(&self) -> &GestureEngine<S> {
        &self.engine
    }

    pub fn on_abs(&mut self, code: u16, value: i32) {
        match code {
            c if c == AbsoluteAxisCode::ABS_MT_SLOT.0 => self.tracker.on_slot(value),
            c if c == AbsoluteAxisCode::ABS_MT_TRACKING_ID.0 => self.tracker.on_tracking_id(value),
            c if c == AbsoluteAxisCode::ABS_MT_POSITION_X.0 => self.tracker.on_pos_x(value),
            c if c == AbsoluteAxisCode::ABS_MT_POSITION_Y.0 => self.tracker.on_pos_y(value),
            _ => {}
        }
    }

    pub fn on_syn(&mut self, code: u16, now_ms: u64) {
        if code == SynchronizationCode::SYN_REPORT.0 {
            for ev in self.tracker.on_syn_report(now_ms) {
                if let Err(e) = self.engine.handle(ev) {
                    warn!("{e}");
                }
            }
            self.apply_pending();
        } else if code == SynchronizationCode::SYN_DROPPED.0 {
            warn!("input events dropped by the kernel; resetting contacts");
            self.tracker.reset();
            self.engine.reset();
            self.apply_pending();
        }
    }

    /// Swaps the engine config in as soon as no contact is down.
    pub fn queue_config(&mut self, config: EngineConfig) {
        self.pending = Some(config);
        self.apply_pending();
    }

    fn apply_pending(&mut self) {
        if self.engine.state() != GestureState::Idle {
            return;
        }
        if let Some(next) = self.pending.take() {
            self.engine.set_config(next);
            info!("applied reloaded engine config");
        }
    }
}

/// Prints gestures as log lines or JSON lines on stdout.
pub struct PrintSink {
    pub json: bool,
}

impl GestureSink for PrintSink {
    fn on_gesture(&mut self, event: GestureEvent) {
        if self.json {
            match serde_json::to_string(&event) {
                Ok(s) => println!("{s}"),
                Err(e) => error!("failed to encode gesture: {e}"),
            }
        } else if let Some(dir) = event.swipe_direction() {
            info!("gesture: {event} ({dir:?})");
        } else {
            info!("gesture: {event}");
        }
    }

    fn on_warning(&mut self, warning: EngineWarning) {
        if self.json {
            println!("{}", serde_json::json!({ "warning": warning }));
        }
    }
}

pub struct ListenOptions {
    pub device: Option<PathBuf>,
    pub json: bool,
}

fn pick_device(opts: &ListenOptions, input: &InputConfig) -> Result<PathBuf> {
    if let Some(p) = &opts.device {
        return Ok(p.clone());
    }
    if let Some(p) = &input.device {
        return Ok(PathBuf::from(p));
    }
    input::discover_multitouch()
        .into_iter()
        .next()
        .map(|d| PathBuf::from(d.path))
        .ok_or_else(|| anyhow!("no multitouch devices detected"))
}

pub fn run_listen(mut cfg: ConfigState, opts: ListenOptions) -> Result<()> {
    let path = pick_device(&opts, &cfg.config.input)?;
    let (mut dev, ranges) = input::open_multitouch(&path)?;
    dev.set_nonblocking(true)?;
    info!(
        "listening on {} ({}), x {}..{}, y {}..{}",
        path.display(),
        dev.name().unwrap_or("unknown"),
        ranges.x_min,
        ranges.x_max,
        ranges.y_min,
        ranges.y_max
    );

    let mut pipeline = Pipeline::new(
        cfg.config.engine.clone(),
        &cfg.config.input,
        ranges,
        PrintSink { json: opts.json },
    );

    // shutdown on SIGINT/SIGTERM
    let stop = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    {
        let stop = stop.clone();
        thread::spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("received signal {sig}; stopping");
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    // config reloads; watch the directory so editor rename-saves are seen
    let (tx_reload, rx_reload) = mpsc::channel::<()>();
    let watched = cfg.path.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(ev) = res {
            if (ev.kind.is_modify() || ev.kind.is_create()) && ev.paths.iter().any(|p| *p == watched)
            {
                let _ = tx_reload.send(());
            }
        }
    })?;
    if let Some(dir) = cfg.path.parent() {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }

    let started = Instant::now();
    while !stop.load(Ordering::Relaxed) {
        let mut reload = false;
        while rx_reload.try_recv().is_ok() {
            reload = true;
        }
        if reload {
            match cfg.reload() {
                Ok(()) => pipeline.queue_config(cfg.config.engine.clone()),
                Err(e) => error!("reload failed, keeping previous config: {e}"),
            }
        }

        let mut any_event = false;
        match dev.fetch_events() {
            Ok(events) => {
                for ev in events {
                    any_event = true;
                    let now = started.elapsed().as_millis() as u64;
                    if ev.event_type() == EventType::ABSOLUTE {
                        pipeline.on_abs(ev.code(), ev.value());
                    } else if ev.event_type() == EventType::SYNCHRONIZATION {
                        pipeline.on_syn(ev.code(), now);
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(anyhow!("reading {} failed: {e}", path.display())),
        }

        if !any_event {
            thread::sleep(Duration::from_millis(4));
        }
    }

    info!("listener stopped");
    Ok(())
}
