#![allow(dead_code)]

mod config;
mod data;
mod instrument;
mod log;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use config::{PollPolicy, PortConfig, SocketEndpoint, PORT_CONFIG_FILE};
use data::acquisition::AcquisitionStore;
use data::display;
use dso_image::{ImageMode, Platform};
use instrument::{Dso, TcpTransport};
use crate::log::decode_log::{DecodeLog, Operation};

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Pi,
    Other,
}

#[derive(Parser)]
#[command(
    name = "openwave",
    version,
    about = "Capture waveforms and screen images from GW Instek oscilloscopes"
)]
struct Cli {
    /// Instrument address a.b.c.d:port (default: first port.config entry)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Override host platform detection
    #[arg(long, value_enum, global = true)]
    platform: Option<PlatformArg>,

    /// Write the session's decode log here (.json for JSON, tab-separated otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Describe a saved CSV/LSF waveform file
    Info {
        file: PathBuf,

        /// Print plot-ready traces as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Convert between CSV and LSF
    Convert { input: PathBuf, output: PathBuf },
    /// Capture channels from the instrument and save them
    Capture {
        /// Channels in capture order, e.g. 1,3
        #[arg(short, long, value_delimiter = ',', default_value = "1",
              value_parser = clap::value_parser!(u8).range(1..=4))]
        channels: Vec<u8>,

        /// Output file (.csv, or .lsf for one channel)
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Save the instrument screen as PNG
    Screenshot {
        #[arg(short, long)]
        out: PathBuf,

        /// Request PNG instead of RLE from the instrument
        #[arg(long, default_value_t = false)]
        png: bool,
    },
}

fn resolve_endpoint(device: Option<&str>) -> Result<SocketEndpoint, Box<dyn std::error::Error>> {
    if let Some(device) = device {
        return SocketEndpoint::parse(device)
            .ok_or_else(|| format!("invalid device address {:?}", device).into());
    }
    PortConfig::load(Path::new(PORT_CONFIG_FILE))?
        .sockets
        .into_iter()
        .next()
        .ok_or_else(|| "no device given and no [SOCKET] entry in port.config".into())
}

fn open_dso(
    cli: &Cli,
    decode_log: &mut DecodeLog,
) -> Result<Dso<TcpTransport>, Box<dyn std::error::Error>> {
    let endpoint = resolve_endpoint(cli.device.as_deref())?;
    let platform = match cli.platform {
        Some(PlatformArg::Pi) => Platform::RaspberryPi,
        Some(PlatformArg::Other) => Platform::Other,
        None => config::detect_platform(),
    };
    let target = endpoint.resource_name();
    let transport = decode_log.check(Operation::Connect, &target, TcpTransport::connect(&endpoint))?;
    let dso = decode_log.check(
        Operation::Connect,
        &target,
        Dso::connect(transport, platform, PollPolicy::default()),
    )?;
    decode_log.record_ok(Operation::Connect, dso.model());
    Ok(dso)
}

fn print_info(
    path: &Path,
    json: bool,
    decode_log: &mut DecodeLog,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = path.display().to_string();
    let mut store = AcquisitionStore::new();
    let set = decode_log.check(Operation::Load, &target, store.load(path))?;
    decode_log.record_set(Operation::Load, &target, set);
    let Some(view) = display::prepare(set) else {
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("File:       {}", path.display());
    if let Some(dialect) = set.dialect {
        println!("Format:     {}", dialect);
    }
    println!("Data bits:  {}", set.calibration.data_bits);
    println!("Points:     {}", set.points());
    if view.stride > 1 {
        println!("Display:    every {}th point", view.stride);
    }
    for (ch, trace) in set.channels.iter().zip(&view.traces) {
        println!(
            "  {:<16} {}  {} V/div  pos {} V  dt {} s  mode {:?}  range [{}, {}]",
            trace.label,
            trace.color,
            ch.vertical_scale,
            ch.vertical_position,
            ch.sample_period,
            ch.mode,
            trace.y_range.0,
            trace.y_range.1
        );
    }
    Ok(())
}

fn run(cli: &Cli, decode_log: &mut DecodeLog) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Info { file, json } => print_info(file, *json, decode_log)?,
        Command::Convert { input, output } => {
            let source = input.display().to_string();
            let target = output.display().to_string();
            let mut store = AcquisitionStore::new();
            let set = decode_log.check(Operation::Load, &source, store.load(input))?;
            decode_log.record_set(Operation::Load, &source, set);
            decode_log.check(Operation::Save, &target, store.save(output))?;
            if let Some(set) = store.current() {
                decode_log.record_set(Operation::Save, &target, set);
            }
        }
        Command::Capture { channels, out } => {
            let mut dso = open_dso(cli, decode_log)?;
            let model = dso.model().to_string();
            let mut store = AcquisitionStore::new();
            let result = store.replace_with(|| dso.capture(channels));
            dso.close();
            let set = decode_log.check(Operation::Capture, &model, result)?;
            decode_log.record_set(Operation::Capture, &model, set);

            let target = out.display().to_string();
            decode_log.check(Operation::Save, &target, store.save(out))?;
            if let Some(set) = store.current() {
                decode_log.record_set(Operation::Save, &target, set);
            }
        }
        Command::Screenshot { out, png } => {
            let mode = if *png { ImageMode::Png } else { ImageMode::Rle };
            let mut dso = open_dso(cli, decode_log)?;
            let platform = dso.platform();
            let result = dso.capture_image(mode);
            dso.close();

            let target = out.display().to_string();
            let img = decode_log.check(Operation::Screenshot, &target, result)?;
            decode_log.check(Operation::Screenshot, &target, img.export_png(out, platform))?;
            decode_log.record_image(Operation::Screenshot, &target, &img);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    ::log::info!("Starting openwave v{}", env!("CARGO_PKG_VERSION"));

    let mut decode_log = DecodeLog::new();
    let result = run(&cli, &mut decode_log);
    if let Some(path) = &cli.log_file {
        decode_log.save(path)?;
        ::log::info!(
            "Decode log written to {} ({} failure(s))",
            path.display(),
            decode_log.failures()
        );
    }
    result
}
