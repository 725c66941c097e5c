use crate::cli::{parse_extensions, parse_size, Args};
use crate::image_processing::fit::{Dimensions, FitPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_ALBUM: &str = "remote:album/Photo Frame";
const DEFAULT_EXTENSIONS: &str = "jpg,jpeg,png,webp,tif,tiff";
const DEFAULT_SLIDESHOW_DELAY: u32 = 30;
const DEFAULT_JPEG_QUALITY: u8 = 75;
const DEFAULT_VIEWER: &str = "qiv";
const DEFAULT_X_DISPLAY: &str = ":0";

/// On-disk configuration, every key optional
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub album: Option<String>,
    pub image_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub display_size: Option<String>,
    pub slideshow_delay: Option<u32>,
    pub extensions: Option<String>,
    pub jobs: Option<usize>,
    pub jpeg_quality: Option<u8>,
    pub viewer: Option<String>,
    pub x_display: Option<String>,
    pub fit_policy: Option<FitPolicy>,
}

impl ConfigFile {
    /// Read and parse a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// `<config dir>/pictureframe/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pictureframe").join("config.json"))
    }
}

/// Everything a run needs, after CLI flags have been laid over the config file
#[derive(Debug, Clone)]
pub struct Settings {
    pub album: String,
    pub image_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Explicit display size; `None` means ask the framebuffer
    pub display_size: Option<Dimensions>,
    pub slideshow_delay: u32,
    pub extensions: Vec<String>,
    pub jobs: usize,
    pub jpeg_quality: u8,
    pub viewer: String,
    pub x_display: String,
    pub fit_policy: FitPolicy,
    pub verbose: bool,
    pub skip_sync: bool,
    pub force: bool,
    pub dry_run: bool,
    pub no_slideshow: bool,
    /// Config file the settings were read from, if any
    pub config_path: Option<PathBuf>,
}

impl Settings {
    /// Load the config file named by `--config` (or the default one when it
    /// exists) and merge the command line over it
    pub fn load(args: &Args) -> Result<Self> {
        let config_path = match &args.config_file {
            Some(path) => Some(path.clone()),
            None => ConfigFile::default_path().filter(|path| path.is_file()),
        };

        let config = match &config_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let mut settings = Self::resolve(args, config)?;
        settings.config_path = config_path;
        Ok(settings)
    }

    /// Command-line arguments take precedence over config file values, which
    /// take precedence over built-in defaults
    pub fn resolve(args: &Args, config: ConfigFile) -> Result<Self> {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        let display_size = match args.size.as_deref().or(config.display_size.as_deref()) {
            Some(size) => Some(parse_size(size)?),
            None => None,
        };

        let extensions = parse_extensions(
            args.extensions
                .as_deref()
                .or(config.extensions.as_deref())
                .unwrap_or(DEFAULT_EXTENSIONS),
        );
        if extensions.is_empty() {
            return Err(anyhow::anyhow!("No valid extensions specified"));
        }

        let fit_policy = config.fit_policy.unwrap_or_default();
        fit_policy.validate().context("Invalid fit policy")?;

        let jobs = match (args.jobs, config.jobs) {
            (0, Some(jobs)) => jobs,
            (jobs, _) => jobs,
        };
        if jobs > 32 {
            return Err(anyhow::anyhow!("Job count too high (max 32), got: {}", jobs));
        }

        Ok(Self {
            album: args
                .album
                .clone()
                .or(config.album)
                .unwrap_or_else(|| DEFAULT_ALBUM.to_string()),
            image_dir: args
                .image_dir
                .clone()
                .or(config.image_dir)
                .unwrap_or_else(|| home.join("Pictures")),
            output_dir: args
                .output_dir
                .clone()
                .or(config.output_dir)
                .unwrap_or_else(|| home.join("PictureFrame")),
            display_size,
            slideshow_delay: args
                .delay
                .or(config.slideshow_delay)
                .unwrap_or(DEFAULT_SLIDESHOW_DELAY),
            extensions,
            jobs,
            jpeg_quality: config.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY).clamp(1, 100),
            viewer: config.viewer.unwrap_or_else(|| DEFAULT_VIEWER.to_string()),
            x_display: config
                .x_display
                .unwrap_or_else(|| DEFAULT_X_DISPLAY.to_string()),
            fit_policy,
            verbose: args.verbose,
            skip_sync: args.start,
            force: args.force,
            dry_run: args.dry_run,
            no_slideshow: args.no_slideshow,
            config_path: None,
        })
    }

    /// Number of worker threads, resolving 0 to the CPU count
    pub fn parallel_jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }
}
