//! Swirl Field CLI - Render frames headlessly from JSON options.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use swirl_field::{
    Clock, EngineOptions, FixedViewport, HostEnv, ManualClock, ManualResizeSource, ManualScheduler,
    RasterSurface, StatsObserver, StatsSample, SwirlEngine,
};

const VIEW_WIDTH: f64 = 640.0;
const VIEW_HEIGHT: f64 = 360.0;
const FRAME_MS: f64 = 1000.0 / 60.0;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <options.json> [frames]", args[0]);
        eprintln!();
        eprintln!("Render the swirl animation headlessly at a fixed 60 Hz cadence.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  options.json  Path to engine options file");
        eprintln!("  frames        Number of frames to render (default: 300)");
        eprintln!();
        eprintln!("Example options are printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_options();
        return;
    }

    let options_path = PathBuf::from(&args[1]);
    let frames: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(300);

    let options_str = fs::read_to_string(&options_path).unwrap_or_else(|e| {
        eprintln!("Error reading options file: {}", e);
        std::process::exit(1);
    });

    let options: EngineOptions = serde_json::from_str(&options_str).unwrap_or_else(|e| {
        eprintln!("Error parsing options: {}", e);
        std::process::exit(1);
    });

    let clock = Rc::new(RefCell::new(ManualClock::new(0.0)));
    let scheduler = Rc::new(RefCell::new(ManualScheduler::new()));
    let surface = Rc::new(RefCell::new(RasterSurface::new()));

    // Latest value per telemetry field; samples are partial.
    let latest = Rc::new(RefCell::new(StatsSample::default()));
    let sink = Rc::clone(&latest);
    let observer: StatsObserver = Box::new(move |sample: &StatsSample| {
        let mut latest = sink.borrow_mut();
        latest.fps = sample.fps.or(latest.fps);
        latest.points = sample.points.or(latest.points);
        latest.speed = sample.speed.or(latest.speed);
        latest.zoom = sample.zoom.or(latest.zoom);
        Ok(())
    });

    let env = HostEnv {
        clock: Box::new(Rc::clone(&clock)),
        scheduler: Box::new(Rc::clone(&scheduler)),
        viewport: Box::new(FixedViewport::new(VIEW_WIDTH, VIEW_HEIGHT, 1.0)),
        resize: Box::new(ManualResizeSource::new()),
    };

    let mut engine =
        SwirlEngine::new(Box::new(Rc::clone(&surface)), env, options, Some(observer))
            .unwrap_or_else(|e| {
                eprintln!("Error constructing engine: {}", e);
                std::process::exit(1);
            });

    println!("Swirl Field");
    println!("===========");
    println!("Surface: {}x{} logical", VIEW_WIDTH, VIEW_HEIGHT);
    println!(
        "Speed: {}, zoom: {}",
        engine.config().speed,
        engine.config().zoom
    );
    println!("Frames: {}", frames);
    println!();

    if !engine.is_running() {
        engine.play();
    }

    println!("Rendering...");
    let start = Instant::now();

    for i in 0..frames {
        clock.borrow_mut().advance(FRAME_MS);
        let dispatched = scheduler.borrow_mut().take_next();
        if dispatched.is_none() {
            break;
        }
        let now = clock.borrow().now_ms();
        if let Err(e) = engine.frame(now) {
            eprintln!("Frame {} failed: {}", i + 1, e);
            std::process::exit(1);
        }

        // Print progress every 10%
        if (i + 1) % (frames / 10).max(1) == 0 {
            let stats = *latest.borrow();
            let elapsed = start.elapsed().as_secs_f32();
            let frames_per_sec = (i + 1) as f32 / elapsed;
            println!(
                "  Frame {}/{}: fps_ema={:.1}, points={}, phase={:.3}, {:.1} frames/s",
                i + 1,
                frames,
                stats.fps.unwrap_or(0.0),
                stats.points.unwrap_or(0),
                engine.phase(),
                frames_per_sec
            );
        }
    }

    let elapsed = start.elapsed();
    let stats = *latest.borrow();

    println!();
    println!("Final state:");
    println!("  Phase: {:.4}", engine.phase());
    println!("  fps EMA: {:.2}", stats.fps.unwrap_or(0.0));
    println!("  Points per frame: {}", stats.points.unwrap_or(0));
    println!();
    println!(
        "Time: {:.2}s ({:.1} frames/s)",
        elapsed.as_secs_f32(),
        frames as f32 / elapsed.as_secs_f32()
    );

    engine.destroy();
}

fn print_example_options() {
    let options = EngineOptions {
        speed: Some(0.5),
        zoom: Some(1.0),
        running: Some(true),
    };

    println!("Example options (options.json):");
    println!("{}", serde_json::to_string_pretty(&options).unwrap());
}
