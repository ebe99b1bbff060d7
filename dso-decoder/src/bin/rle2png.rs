//! rle2png: Decode a saved screen image block to PNG.

use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use dso_core::DEFAULT_SCREEN;
use dso_image::{decode_image, ImageMode, Platform};
use dso_io::{read_block, ReadSource};

#[derive(Clone, Copy, ValueEnum)]
enum Encoding {
    Rle,
    Png,
}

#[derive(Parser)]
#[command(
    name = "rle2png",
    version,
    about = "Decode a saved oscilloscope screen image block to PNG"
)]
struct Cli {
    /// Input file holding one `#`-framed image block
    #[arg(short, long)]
    r#in: PathBuf,

    /// Output PNG file
    #[arg(short, long)]
    out: PathBuf,

    /// Block encoding
    #[arg(short, long, value_enum, default_value_t = Encoding::Rle)]
    encoding: Encoding,

    /// Flip the image top to bottom
    #[arg(long, default_value_t = false)]
    flip: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let mode = match cli.encoding {
        Encoding::Rle => ImageMode::Rle,
        Encoding::Png => ImageMode::Png,
    };
    let platform = if cli.flip {
        Platform::RaspberryPi
    } else {
        Platform::Other
    };

    let mut source = ReadSource::new(BufReader::new(File::open(&cli.r#in)?));
    let block = read_block(&mut source, None)?;
    let img = decode_image(block.payload(), mode, &DEFAULT_SCREEN, platform)?;
    img.save_png(&cli.out)?;

    eprintln!(
        "rle2png: {}x{} image written to {}",
        img.width,
        img.height,
        cli.out.display()
    );
    Ok(())
}
