//! rawplay: plays a file's bytes as 16-bit stereo PCM through the default
//! output device until ENTER is pressed.
//!
//! A feeder thread reads the file into a lock-free ring buffer; the CPAL
//! callback drains it and advances the shared clock. Startup errors are
//! printed to stderr and the process still exits with status 0.

mod cli;
mod config;
mod engine;

use std::fmt::Display;
use std::io::{BufRead, Write};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::PlayerConfig;
use crate::engine::clock::PlaybackState;
use crate::engine::engine::PlaybackEngine;
use crate::engine::output::{cpal_backend::CpalBackend, device};

fn main() {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if args.list_devices {
        if let Err(e) = device::list_devices(&cpal::default_host()) {
            report_error(std::io::stderr().lock(), format_args!("{e:#}"));
        }
        return;
    }

    let config = PlayerConfig::from(&args);
    let mut engine = PlaybackEngine::new(config, Box::new(CpalBackend::new()));

    match engine.startup() {
        Ok(()) => {
            println!("Press ENTER to exit");
            wait_for_enter();
            if let Some(clock) = engine.clock() {
                let done = clock.state() == PlaybackState::Complete;
                tracing::info!(
                    position = clock.byte_pos(),
                    file_size = clock.file_size(),
                    seconds = clock.time_secs(),
                    complete = done,
                    "stopping playback"
                );
            }
        }
        Err(e) => report_error(std::io::stderr().lock(), &e),
    }

    engine.close();
}

/// Startup diagnostics go straight to stderr so they survive any log filter.
fn report_error<W: Write>(mut out: W, err: impl Display) {
    let _ = writeln!(out, "rawplay: {err}");
}

fn wait_for_enter() {
    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        tracing::warn!("stdin read failed: {e}");
    }
}
