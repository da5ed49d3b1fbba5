//! partials - additive keyboard synthesizer in the terminal
//!
//! Run with: cargo run -- --partials 6 --log-file partials.log

mod app;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::PartialsApp;
use partials::{
    dsp::{analyser::DEFAULT_ANALYSER_SIZE, oscillator::Waveform},
    synth::{
        engine::DEFAULT_FRAME_RATE,
        params::{DEFAULT_PARTIAL_COUNT, MAX_PARTIALS},
        Params,
    },
};

/// Additive keyboard synthesizer.
#[derive(Parser, Debug)]
#[command(name = "partials")]
#[command(about = "Additive keyboard synthesizer with headroom control and a peak limiter")]
#[command(version)]
struct Args {
    /// Limiter and meter updates per second
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    frame_rate: f32,

    /// Analyser window in samples
    #[arg(long, default_value_t = DEFAULT_ANALYSER_SIZE)]
    analyser_size: usize,

    /// Oscillator waveform: sine, square, sawtooth or triangle
    #[arg(long, default_value = "sine")]
    waveform: Waveform,

    /// Number of harmonic partials per voice
    #[arg(long, default_value_t = DEFAULT_PARTIAL_COUNT)]
    partials: usize,

    /// Write logs to this file (nothing is logged without it)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let mut params = Params {
        waveform: args.waveform,
        ..Params::default()
    };
    params
        .partial_volumes
        .resize(args.partials.min(MAX_PARTIALS))
        .wrap_err("invalid --partials")?;

    tracing::info!(?args, "starting partials");

    let app = PartialsApp::new()
        .frame_rate(args.frame_rate)
        .analyser_size(args.analyser_size)
        .params(params);

    let mut terminal = ratatui::init();
    let res = app.run(&mut terminal);
    ratatui::restore();
    res
}

/// Logs go to a file only; stderr would tear up the terminal UI.
fn init_logging(path: Option<&PathBuf>) -> EyreResult<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
