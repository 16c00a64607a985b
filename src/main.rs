// src/main.rs
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use tracing::info;

use bookfeed::parser::Wire;
use bookfeed::replay::{self, ReplayOptions};

#[derive(Parser, Debug)]
#[command(name = "bookfeed", version, about = "Rebuilds order books from a recorded event stream")]
struct Cli {
    /// Recorded stream file to replay.
    #[arg(long)]
    file: PathBuf,

    /// Snapshot log destination; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Book depth considered visible. Events disturbing only deeper levels
    /// log nothing.
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Reserved bytes after an update's price field (stream dialect).
    #[arg(long, default_value_t = 0)]
    update_tail: usize,

    /// Also write an untruncated final image of every book to this path.
    #[arg(long)]
    final_snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();

    let f = File::open(&cli.file).with_context(|| format!("open stream file {:?}", cli.file))?;
    let mmap = unsafe { Mmap::map(&f)? };
    info!("replay: file={:?} bytes={} depth={}", cli.file, mmap.len(), cli.depth);

    let opts = ReplayOptions {
        depth: cli.depth,
        wire: Wire {
            update_tail: cli.update_tail,
        },
    };

    let t0 = Instant::now();
    let (engine, metrics) = match &cli.out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {:?}", path))?;
            let mut w = BufWriter::new(file);
            let run = replay::replay_bytes(&mmap, &mut w, opts)?;
            w.flush()?;
            run
        }
        None => {
            let stdout = io::stdout();
            let mut w = BufWriter::new(stdout.lock());
            let run = replay::replay_bytes(&mmap, &mut w, opts)?;
            w.flush()?;
            run
        }
    };
    let elapsed = t0.elapsed();

    if let Some(path) = &cli.final_snapshot {
        std::fs::write(path, replay::final_snapshot_json(&engine))
            .with_context(|| format!("write final snapshot {:?}", path))?;
        info!("wrote final snapshot to {:?}", path);
    }

    let rate = metrics.frames as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!("done in {:.3?} ({rate:.0} events/s): {}", elapsed, metrics.summary());
    Ok(())
}
