use anyhow::{Context, Result};
use regex::Regex;
use std::process::Command;

use crate::image_processing::fit::Dimensions;

/// Extract the visible resolution from `fbset` output
///
/// `fbset` prints a `geometry <xres> <yres> <vxres> <vyres> <depth>` line; only
/// the first two numbers describe what is actually on screen.
pub fn parse_fbset_geometry(output: &str) -> Result<Dimensions> {
    let geometry = Regex::new(r"(?m)^\s*geometry\s+(\d+)\s+(\d+)")?;

    let captures = geometry
        .captures(output)
        .ok_or_else(|| anyhow::anyhow!("No geometry line in fbset output"))?;

    let width: u32 = captures[1]
        .parse()
        .with_context(|| format!("Invalid framebuffer width: '{}'", &captures[1]))?;
    let height: u32 = captures[2]
        .parse()
        .with_context(|| format!("Invalid framebuffer height: '{}'", &captures[2]))?;

    Dimensions::new(width, height).context("Framebuffer reported an empty geometry")
}

/// Ask the framebuffer device for its resolution
pub fn query_framebuffer() -> Result<Dimensions> {
    let output = Command::new("fbset")
        .output()
        .context("Failed to run fbset (is it installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow::anyhow!("fbset failed: {}", stderr.trim()));
    }

    parse_fbset_geometry(&String::from_utf8_lossy(&output.stdout))
}

/// Use the configured size when there is one, otherwise query the framebuffer
pub fn resolve_display(configured: Option<Dimensions>) -> Result<Dimensions> {
    match configured {
        Some(size) => Ok(size),
        None => query_framebuffer().context("Could not determine the display size; pass --size"),
    }
}
