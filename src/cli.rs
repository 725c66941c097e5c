use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::image_processing::fit::Dimensions;

/// Largest display side accepted by `--size`
const MAX_DISPLAY_SIDE: u32 = 8192;

#[derive(Parser, Debug, Default)]
#[command(
    name = "pictureframe",
    version,
    about = "rclone photos, resize, and (re)start slideshow",
    long_about = "
Picture Frame - album sync and slideshow launcher

Copies a remote photo album to local storage with rclone, fits every picture
to the framebuffer's resolution and restarts a qiv slideshow over the result.

Narrow portrait pictures on small screens are blown up slightly and trimmed
(mostly from the bottom) instead of being letterboxed.

Example Usage:
  # Full run: sync, resize new pictures, restart the slideshow
  pictureframe --verbose

  # Only restart the slideshow over what is already resized
  pictureframe --start

  # Override the display size and see what would be produced
  pictureframe --size 480x800 --dry-run --verbose

  # Use a specific configuration file
  pictureframe --config ~/.config/pictureframe/config.json"
)]
pub struct Args {
    /// Increase output verbosity
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Start slideshow without rclone (skips sync and resizing)
    #[arg(short = 's', long = "start")]
    pub start: bool,

    /// JSON configuration file (defaults to <config dir>/pictureframe/config.json when present)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// rclone remote and path of the album, e.g. "remote:album/Photo Frame"
    #[arg(long = "album", value_name = "REMOTE")]
    pub album: Option<String>,

    /// Where the album is copied to
    #[arg(long = "image-dir", value_name = "DIR")]
    pub image_dir: Option<PathBuf>,

    /// Where the resized pictures are written (and shown from)
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Display size (format: WIDTHxHEIGHT). Queried from fbset when omitted
    #[arg(long = "size", value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Seconds each picture stays on screen
    #[arg(long = "delay", value_name = "SECONDS")]
    pub delay: Option<u32>,

    /// Comma-separated list of image extensions to process
    #[arg(long = "extensions", value_name = "LIST")]
    pub extensions: Option<String>,

    /// Number of parallel resize jobs (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N")]
    pub jobs: usize,

    /// Resize pictures again even if their output already exists
    #[arg(long = "force")]
    pub force: bool,

    /// Compute and print resize plans without writing files or touching the slideshow
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Do not stop or start the slideshow viewer
    #[arg(long = "no-slideshow")]
    pub no_slideshow: bool,
}

/// Parse a `WIDTHxHEIGHT` string into display dimensions
pub fn parse_size(size: &str) -> Result<Dimensions> {
    let parts: Vec<&str> = size.trim().split('x').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!(
            "Invalid size format '{}'. Use WIDTHxHEIGHT (e.g., 800x480)",
            size
        ));
    }

    let width = parts[0]
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid width: '{}'", parts[0]))?;
    let height = parts[1]
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Invalid height: '{}'", parts[1]))?;

    if width > MAX_DISPLAY_SIDE || height > MAX_DISPLAY_SIDE {
        return Err(anyhow::anyhow!(
            "Width and height must be at most {} pixels",
            MAX_DISPLAY_SIDE
        ));
    }

    Dimensions::new(width, height)
}

/// Split a comma-separated extension list, normalized to lowercase
pub fn parse_extensions(extensions: &str) -> Vec<String> {
    extensions
        .split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
