use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use framestats::{StatsConfig, StatsContext};

/// Drives the instrumentation layer with a simulated frame/event/network
/// workload and leaves the report files in the output directory.
#[derive(Parser)]
#[command(name = "framestats-demo")]
struct Args {
    /// Directory the report and sample files are written to
    #[arg(long, default_value = "output_stats")]
    output_dir: PathBuf,

    /// How long to run the simulated workload, in seconds
    #[arg(long, default_value_t = 10)]
    duration_secs: u64,

    /// Concurrent frame-loop workers
    #[arg(long, default_value_t = 2)]
    workers: u32,

    /// Seconds between periodic dumps
    #[arg(long, default_value_t = 5)]
    dump_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = StatsConfig {
        output_dir: args.output_dir.clone(),
        dump_interval: Duration::from_secs(args.dump_interval_secs),
        ..StatsConfig::default()
    };
    let ctx = match StatsContext::new(config) {
        Ok(ctx) => Arc::new(ctx),
        Err(err) => {
            eprintln!("framestats-demo: {err}");
            std::process::exit(1);
        }
    };
    ctx.start_background();

    // ── Workers ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let mut handles = Vec::with_capacity(args.workers as usize);
    for worker_id in 0..args.workers {
        let ctx = ctx.clone();
        let running = running.clone();
        handles.push(tokio::spawn(async move {
            frame_worker(worker_id, ctx, running).await;
        }));
    }

    tokio::time::sleep(Duration::from_secs(args.duration_secs)).await;
    running.store(false, Ordering::SeqCst);
    for handle in handles {
        let _ = handle.await;
    }

    // final dump happens here
    ctx.shutdown().await;

    match serde_json::to_string_pretty(&ctx.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(err) => log::warn!("snapshot serialization failed: {err}"),
    }
    println!("report files written to {}", args.output_dir.display());
}

/// One simulated frame loop: an encode pass nested in each frame, an
/// occasional stall for the punishing metrics to notice, an event dispatch,
/// and a sent-packet record per frame.
async fn frame_worker(worker_id: u32, ctx: Arc<StatsContext>, running: Arc<AtomicBool>) {
    // deterministic per-worker stream
    let mut rng = StdRng::seed_from_u64(1000 + worker_id as u64);

    while running.load(Ordering::Relaxed) {
        ctx.frame_loop.start_measurement();

        let dirty_regions = rng.gen_range(0u32..4);

        ctx.frame_encode.start_measurement();
        let payload_bytes = ctx.frame_encode.simple_measure("serialize frame", || {
            busy_wait(Duration::from_millis(rng.gen_range(0..3)));
            rng.gen_range(256u64..16_384)
        });
        let encode_span = ctx.frame_encode.end_measurement();
        ctx.frame_loop.add_measurement(encode_span);

        if rng.gen_bool(0.1) {
            // a stall the tail metrics should pick up
            busy_wait(Duration::from_millis(rng.gen_range(8..20)));
        }

        let frame = ctx.frame_loop.end_measurement_with(dirty_regions);
        ctx.network.add(frame.end_ms(), payload_bytes);

        ctx.event_loop.standalone_simple_measure("dispatch event", || {
            busy_wait(Duration::from_millis(rng.gen_range(0..2)));
        });

        tokio::time::sleep(Duration::from_millis(16)).await;
    }
}

/// Stand-in for real work; keeps the measured section synchronous the way
/// the actual frame loop is.
fn busy_wait(duration: Duration) {
    let start = std::time::Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}
