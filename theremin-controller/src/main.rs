//! Theremin - ultrasonic hand-position controller
//!
//! Two HC-SR04 style range finders measure the distance of the player's
//! hands. One sets the volume, the other the pitch. Both sensors run as
//! cooperative tasks on a single background thread; the foreground reads
//! the latest positions and reports them.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

mod board;
mod channels;
mod config;
mod input;
mod tasks;

use crate::board::LinuxBoard;
use crate::config::ControllerConfig;
use crate::input::UserInput;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ultrasonic theremin controller", long_about = None)]
struct Cli {
    /// TOML configuration file (embedded defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    /// Stop after this many seconds instead of running until interrupted
    #[arg(long)]
    duration: Option<u64>,

    /// Print the effective configuration and exit
    #[arg(long, default_value_t = false)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .parse_default_env()
        .init();

    let config = ControllerConfig::load(cli.config.as_deref()).context("loading configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml().context("rendering configuration")?);
        return Ok(());
    }

    info!(
        "volume: trigger {} echo {}, pitch: trigger {} echo {}",
        config.volume.sensor.trigger_pin,
        config.volume.sensor.echo_pin,
        config.pitch.sensor.trigger_pin,
        config.pitch.sensor.echo_pin
    );

    let board = LinuxBoard::new(&config.controller.gpio_root);
    let input = UserInput::spawn(board, &config)?;

    let limit = cli.duration.map(Duration::from_secs);
    let started = Instant::now();
    let report = config.controller.report();

    while input.is_running() {
        thread::sleep(report);

        let (volume_m, pitch_m) = input.distances();
        info!(
            "volume {} ({}), pitch {} ({})",
            level(input.volume()),
            metres(volume_m),
            level(input.relative_pitch()),
            metres(pitch_m)
        );

        if limit.is_some_and(|limit| started.elapsed() >= limit) {
            info!("run time elapsed");
            break;
        }
    }

    input.shutdown()
}

fn level(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{:.2}", v))
}

fn metres(value: Option<f64>) -> String {
    value.map_or_else(|| "no echo".into(), |v| format!("{:.3} m", v))
}
