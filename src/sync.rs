use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

use crate::config_file::Settings;

/// Check if rclone is available on the system
pub fn is_rclone_available() -> bool {
    Command::new("rclone")
        .arg("version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Arguments for `rclone copy <album> <destination>`
pub fn rclone_args(album: &str, destination: &Path) -> Vec<String> {
    vec![
        "copy".to_string(),
        album.to_string(),
        destination.display().to_string(),
    ]
}

/// Copy the remote album into the local image directory
///
/// rclone only transfers files that are new or changed, so repeated runs are cheap.
pub fn sync_album(settings: &Settings) -> Result<()> {
    let output = Command::new("rclone")
        .args(rclone_args(&settings.album, &settings.image_dir))
        .output()
        .context("Failed to run rclone (is it installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow::anyhow!(
            "rclone copy of \"{}\" failed ({}): {}",
            settings.album,
            output.status,
            stderr.trim()
        ));
    }

    Ok(())
}
