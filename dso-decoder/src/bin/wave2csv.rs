//! wave2csv: Convert saved oscilloscope waveforms between CSV and LSF.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "wave2csv",
    version,
    about = "Convert saved oscilloscope waveforms between CSV and LSF"
)]
struct Cli {
    /// Input waveform file (.csv or .lsf)
    #[arg(short, long)]
    r#in: PathBuf,

    /// Output file; the extension selects the format
    #[arg(short, long)]
    out: PathBuf,

    /// Verbose mode
    #[arg(short, long, default_value_t = false)]
    verb: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verb { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    let set = dso_file::load_file(&cli.r#in)?;
    for ch in &set.channels {
        log::debug!(
            "{}: {} points, {} V/div, mode {:?}",
            ch.source,
            ch.points(),
            ch.vertical_scale,
            ch.mode
        );
    }
    dso_file::save_file(&cli.out, &set)?;

    eprintln!(
        "wave2csv: {} channel(s) x {} points written to {}",
        set.len(),
        set.points(),
        cli.out.display()
    );
    Ok(())
}
