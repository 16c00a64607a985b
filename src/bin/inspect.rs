use std::collections::HashSet;
use std::fs::File;

use anyhow::{bail, Context, Result};
use memmap2::Mmap;

use bookfeed::engine::Event;
use bookfeed::parser::{FrameReader, Wire};

fn main() -> Result<()> {
    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => bail!("usage: inspect <stream-file>"),
    };

    let f = File::open(&path).with_context(|| format!("open {path}"))?;
    let mmap = unsafe { Mmap::map(&f)? };

    let mut frames = FrameReader::new(&mmap[..], Wire::default());
    let mut symbols = HashSet::new();
    let mut adds = 0u64;
    let mut updates = 0u64;
    let mut deletes = 0u64;
    let mut executes = 0u64;
    let mut total = 0u64;

    while let Some(frame) = frames.next_frame()? {
        total += 1;
        symbols.insert(frame.event.symbol());
        match frame.event {
            Event::Add { .. } => adds += 1,
            Event::Update { .. } => updates += 1,
            Event::Delete { .. } => deletes += 1,
            Event::Execute { .. } => executes += 1,
        }
    }

    println!("frames={total}");
    println!("adds={adds} updates={updates} deletes={deletes} executes={executes}");
    println!("unique_symbols={}", symbols.len());
    println!("bytes={}", frames.bytes_read());
    Ok(())
}
