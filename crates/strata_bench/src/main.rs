//! Strata benchmark scenarios
//!
//! Drives the store through the workloads it is built for: large
//! insert/remove churn with slot reuse, and whole-column marker
//! sweeps, immediate and deferred. Pick a scenario by number:
//!
//! ```text
//! strata_bench <1|2|3> [lines]
//! ```

use anyhow::{bail, Result};
use rayon::prelude::*;
use std::time::Instant;
use strata_core::{AttributeStore, StoreConfig};

const DEFAULT_LINES: u32 = 20_000_000;
const CYCLES: u32 = 40;

fn churn(lines: u32) -> Result<()> {
    tracing::info!(lines, "scenario 1: insert/remove churn");
    let start = Instant::now();

    let mut store = AttributeStore::with_config(StoreConfig::default());
    let ints = store.add_attribute::<i32>("ints")?;
    let reals = store.add_attribute::<f32>("reals")?;
    let positions = store.add_attribute::<glam::Vec3>("positions")?;

    for _ in 0..lines {
        store.insert_line();
    }

    let mut i = store.begin();
    while i != store.end() {
        store.set_value(ints, i, 1 + i as i32)?;
        store.set_value(reals, i, 3.0 + 0.1 * i as f32)?;
        store.set_value(positions, i, glam::Vec3::splat(i as f32))?;
        i = store.next_after(i);
    }
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "filled");

    let cycle_start = Instant::now();
    for cycle in 0..CYCLES {
        let offset = cycle % 2;
        for stride in 0..lines / 10 {
            for delta in [1, 3, 8] {
                store.remove_line(offset + delta + stride * 10)?;
            }
        }
        for _ in 0..3 * (lines / 10) {
            store.insert_line();
        }
    }

    if store.len() as u32 != lines {
        bail!("expected {} occupied rows, found {}", lines, store.len());
    }
    tracing::info!(
        elapsed_ms = cycle_start.elapsed().as_millis() as u64,
        cycles = CYCLES,
        occupied = store.len(),
        "churn done"
    );
    Ok(())
}

fn mark_sweep(lines: u32) -> Result<()> {
    tracing::info!(lines, "scenario 2: immediate marker clearing");
    let mut store = AttributeStore::with_config(StoreConfig::default());
    let seen = store.add_marker_attribute("seen")?;
    store.insert_lines(lines);

    let marks = store.mark_column(seen)?;
    let mut i = store.begin();
    while i != store.end() {
        marks.set_true(i)?;
        i = store.next_after(i);
    }

    let start = Instant::now();
    for _ in 0..CYCLES {
        for i in 0..lines / 2 {
            marks.set_false(i)?;
            marks.set_false(lines - 1 - i)?;
        }
    }
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "cleared");
    Ok(())
}

fn mark_sweep_dirty(lines: u32) -> Result<()> {
    tracing::info!(lines, "scenario 3: deferred marker clearing, parallel");
    let mut store = AttributeStore::with_config(StoreConfig::default());
    let seen = store.add_marker_attribute("seen")?;
    store.insert_lines(lines);

    let marks = store.mark_column(seen)?;
    let mut i = store.begin();
    while i != store.end() {
        marks.set_true(i)?;
        i = store.next_after(i);
    }

    let start = Instant::now();
    // many workers staging clears at once, one cleanup pass at the end
    (0..lines / 2).into_par_iter().try_for_each(|i| {
        marks.set_false_dirty(i)?;
        marks.set_false_dirty(lines - 1 - i)
    })?;
    store.mark_column_mut(seen)?.cleanup();
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "cleared");

    let marks = store.mark_column(seen)?;
    let mut i = store.begin();
    while i != store.end() {
        if marks.get(i)? {
            bail!("row {} still marked after cleanup", i);
        }
        i = store.next_after(i);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("strata v{}", strata_core::VERSION);

    let mut args = std::env::args().skip(1);
    let scenario = match args.next() {
        Some(s) => s,
        None => bail!("usage: strata_bench <1|2|3> [lines]"),
    };
    let lines: u32 = match args.next() {
        Some(n) => n.parse()?,
        None => DEFAULT_LINES,
    };

    match scenario.as_str() {
        "1" => churn(lines),
        "2" => mark_sweep(lines),
        "3" => mark_sweep_dirty(lines),
        other => bail!("unknown scenario `{}`", other),
    }
}
