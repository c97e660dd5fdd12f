//! Thin CLI wrapper around the decoder library: `decode <path> [--logging]`.
//!
//! Grounded on the teacher's `bin/gzipd.rs` (`structopt`-derived argument struct, one
//! positional path, one flag). Carries no decode logic of its own.

use std::path::PathBuf;
use std::process::ExitCode;

use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "decode", about = "Decode a PNG file and print its shape")]
struct DecodeParams {
    /// Path to the PNG file to decode.
    input: PathBuf,

    /// Install an env_logger subscriber so the decoder's log::debug!/info!/warn! calls
    /// are printed.
    #[structopt(long)]
    logging: bool,
}

fn main() -> ExitCode {
    let params = DecodeParams::from_args();

    if params.logging {
        env_logger::init();
    }

    let bytes = match std::fs::read(&params.input) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {}: {err}", params.input.display());
            return ExitCode::FAILURE;
        }
    };

    match pngcore_rs::decode(&bytes) {
        Ok(image) => {
            let shape = match &image.pixels {
                pngcore_rs::PixelBuffer::Gray8(a) => format!("Gray8{:?}", a.shape()),
                pngcore_rs::PixelBuffer::Gray16(a) => format!("Gray16{:?}", a.shape()),
                pngcore_rs::PixelBuffer::Rgb8(a) => format!("Rgb8{:?}", a.shape()),
                pngcore_rs::PixelBuffer::Rgb16(a) => format!("Rgb16{:?}", a.shape()),
                pngcore_rs::PixelBuffer::GrayAlpha8(a) => format!("GrayAlpha8{:?}", a.shape()),
                pngcore_rs::PixelBuffer::GrayAlpha16(a) => format!("GrayAlpha16{:?}", a.shape()),
                pngcore_rs::PixelBuffer::Rgba8(a) => format!("Rgba8{:?}", a.shape()),
                pngcore_rs::PixelBuffer::Rgba16(a) => format!("Rgba16{:?}", a.shape()),
            };
            println!(
                "{}x{} bit_depth={} color_type={} -> {}",
                image.header.width,
                image.header.height,
                image.header.bit_depth,
                image.header.color_type,
                shape
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
