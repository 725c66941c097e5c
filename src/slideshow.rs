use anyhow::{Context, Result};
use std::process::{Command, Stdio};

use crate::config_file::Settings;

/// Flags passed to qiv ahead of the delay, display and directory
const VIEWER_FLAGS: &[&str] = &[
    "--watch",
    "--maxpect",
    "--no_statusbar",
    "--slide",
    "--random",
    "--disable_grab",
    "--readonly",
    "--fullscreen",
    "--autorotate",
];

/// Full argument list for the slideshow viewer
pub fn viewer_args(settings: &Settings) -> Vec<String> {
    let mut args: Vec<String> = VIEWER_FLAGS.iter().map(|flag| flag.to_string()).collect();
    args.push("--delay".to_string());
    args.push(settings.slideshow_delay.to_string());
    args.push("--display".to_string());
    args.push(settings.x_display.clone());
    args.push(settings.output_dir.display().to_string());
    args
}

/// Stop any running viewer instance
///
/// `pkill` exits with 1 when nothing matched, which is fine here.
pub fn stop_viewer(viewer: &str) -> Result<()> {
    let status = Command::new("pkill")
        .arg(viewer)
        .status()
        .context("Failed to run pkill")?;

    match status.code() {
        Some(0) | Some(1) => Ok(()),
        _ => Err(anyhow::anyhow!("pkill {} failed ({})", viewer, status)),
    }
}

/// Launch the viewer in the background; it is not waited on
pub fn start_viewer(settings: &Settings) -> Result<()> {
    Command::new(&settings.viewer)
        .args(viewer_args(settings))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to start {}", settings.viewer))?;

    Ok(())
}
