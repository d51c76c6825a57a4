//! focusd - attention tracker daemon
//!
//! This daemon:
//! 1. Opens the configured frame source (synthetic `stub://` by default)
//! 2. Runs each captured frame through the focus pipeline
//! 3. Prints one JSON metrics line per frame for downstream consumers
//! 4. Stops cleanly on Ctrl-C, releasing the source and worker thread

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use focus_kernel::{frame::open_source, FocusTracker, TrackerConfig};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "focusd", about = "Webcam attention tracker daemon")]
struct Args {
    /// Path to a JSON config file (same as FOCUS_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many frames; 0 runs until interrupted.
    #[arg(long, default_value_t = 0)]
    max_frames: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Some(path) = &args.config {
        std::env::set_var("FOCUS_CONFIG", path);
    }
    let config = TrackerConfig::load()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })?;
    }

    // Camera-open failure is fatal at startup, not recoverable mid-session.
    let mut source = open_source(&config.source)?;
    source.connect()?;

    let mut tracker = FocusTracker::new(config.clone())?;
    tracker.start()?;

    log::info!(
        "focusd running: source={}, {}x{} @ {} fps target",
        config.source.uri,
        config.source.width,
        config.source.height,
        config.source.target_fps
    );

    let frame_interval = if config.source.target_fps > 0 {
        Duration::from_secs_f64(1.0 / config.source.target_fps as f64)
    } else {
        Duration::ZERO
    };
    let mut last_health_log = Instant::now();

    while running.load(Ordering::SeqCst) {
        let iteration_start = Instant::now();

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("frame capture failed: {}", e);
                continue;
            }
        };

        // A failed frame is skipped; the loop proceeds to the next capture.
        let metrics = match tracker.process_frame(&frame) {
            Ok(metrics) => metrics,
            Err(e) => {
                log::warn!("frame skipped: {}", e);
                continue;
            }
        };

        println!("{}", serde_json::to_string(&metrics)?);

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            log::info!(
                "{} frames processed, fps {:.1}, focused={}",
                source.frames_captured(),
                metrics.fps,
                metrics.focused
            );
            last_health_log = Instant::now();
        }

        if args.max_frames > 0 && source.frames_captured() >= args.max_frames {
            break;
        }

        let elapsed = iteration_start.elapsed();
        if elapsed < frame_interval {
            std::thread::sleep(frame_interval - elapsed);
        }
    }

    tracker.stop();
    log::info!("focusd stopped");
    Ok(())
}
