//! HV Pulse Counter Simulator for desktop platforms.
//!
//! Feeds the synthetic flasher waveform through the same cycle driver the
//! firmware runs, with a RAM-backed store in place of the FRAM, and prints
//! the resulting histogram. Set `RUST_LOG=debug` to see re-arm and
//! below-range events as they happen.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

mod run;
mod scenario;
mod timing;

use std::process::ExitCode;
use std::time::Instant;

use hvpulse_common::HV_BINS;
use hvpulse_common::report::{DischargeReport, format_line};
use log::{error, info};

use crate::run::{Outcome, run};
use crate::scenario::{Scenario, USAGE};
use crate::timing::simulated;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scenario = match Scenario::parse(std::env::args().skip(1)) {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let total_ticks = scenario.total_ticks();
    info!(
        "Simulating {:?} ({} ticks), restart every {:?} ticks",
        simulated(total_ticks),
        total_ticks,
        scenario.reset_every
    );

    let started = Instant::now();
    let Outcome { mut driver, restarts } = run(total_ticks, scenario.reset_every);
    let wall = started.elapsed();

    println!("Histogram:");
    let result = driver.histogram_mut().for_each_nonzero(&HV_BINS, |bin, count| {
        let line = format_line(&DischargeReport {
            bin: bin.index,
            voltage: bin.voltage,
            count,
        });
        println!("  {:>3}  {}", bin.index, line);
    });
    match result {
        Ok(0) => println!("  (empty)"),
        Ok(_) => {}
        Err(e) => {
            error!("histogram read failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    println!("Last reports:");
    for line in driver.sink().lines() {
        println!("  {line}");
    }

    let stats = *driver.stats();
    println!(
        "ticks={} discharges={} counted={} unbinned={} store_faults={} clamped={} restarts={}",
        stats.ticks, stats.discharges, stats.counted, stats.unbinned, stats.store_faults, stats.clamped, restarts
    );
    println!(
        "flashes generated={} reports received={} store writes={}",
        driver.source().flashes(),
        driver.sink().received(),
        driver.histogram().store().writes()
    );
    println!(
        "simulated {:?} in {:?} ({:.0}x real time)",
        simulated(stats.ticks),
        wall,
        simulated(stats.ticks).as_secs_f64() / wall.as_secs_f64().max(f64::EPSILON)
    );

    ExitCode::SUCCESS
}
