pub mod fit;
pub mod resize;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config_file::Settings;
use crate::utils::{display_name, has_valid_extension, verbose_println, warn_println};
use fit::{Dimensions, FitPolicy, ResizePlan};

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub display: Dimensions,
    pub fit_policy: FitPolicy,
    pub output_dir: PathBuf,
    pub extensions: Vec<String>,
    pub jpeg_quality: u8,
    pub verbose: bool,
    pub parallel_jobs: usize,
    pub force: bool,
    pub dry_run: bool,
}

impl ProcessingConfig {
    pub fn from_settings(settings: &Settings, display: Dimensions) -> Self {
        Self {
            display,
            fit_policy: settings.fit_policy,
            output_dir: settings.output_dir.clone(),
            extensions: settings.extensions.clone(),
            jpeg_quality: settings.jpeg_quality,
            verbose: settings.verbose,
            parallel_jobs: settings.parallel_jobs(),
            force: settings.force,
            dry_run: settings.dry_run,
        }
    }
}

/// A picture that was resized (or, in dry-run mode, would have been)
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub source: Dimensions,
    pub plan: ResizePlan,
}

impl ProcessingResult {
    /// Whether the narrow-image exception trimmed this picture
    pub fn cropped(&self) -> bool {
        self.plan.is_cropped()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The output file exists from an earlier run
    AlreadyProcessed,
}

#[derive(Debug, Clone)]
pub struct SkippedResult {
    pub input_path: PathBuf,
    pub existing_output_path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Processed(ProcessingResult),
    Skipped(SkippedResult),
}

/// Outcome of a whole batch, in discovery order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<ProcessingResult>,
    pub skipped: Vec<SkippedResult>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl BatchReport {
    fn collect(files: &[PathBuf], results: Vec<Result<ImageOutcome>>) -> Self {
        let mut report = Self::default();
        for (path, result) in files.iter().zip(results) {
            match result {
                Ok(ImageOutcome::Processed(processed)) => report.processed.push(processed),
                Ok(ImageOutcome::Skipped(skipped)) => report.skipped.push(skipped),
                Err(e) => report.failed.push((path.clone(), e)),
            }
        }
        report
    }

    pub fn cropped_count(&self) -> usize {
        self.processed.iter().filter(|r| r.cropped()).count()
    }
}

pub struct ProcessingEngine {
    config: ProcessingConfig,
    pool: rayon::ThreadPool,
}

impl ProcessingEngine {
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        // Initialize thread pool with specified number of jobs
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_jobs)
            .build()
            .context("Failed to initialize thread pool")?;

        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Discover the image files directly inside `input_dir`
    pub fn discover_images(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        verbose_println(
            self.config.verbose,
            &format!("Scanning directory: {}", input_dir.display()),
        );

        let mut image_files = Vec::new();
        let walker = WalkDir::new(input_dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1);

        for entry in walker {
            // A dangling symlink or unreadable entry only costs that entry
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn_println(&format!("Skipping unreadable directory entry: {}", e));
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_file() && has_valid_extension(path, &self.config.extensions) {
                image_files.push(path.to_path_buf());
            }
        }

        // Sort for consistent processing order
        image_files.sort();

        verbose_println(
            self.config.verbose,
            &format!("Found {} image files", image_files.len()),
        );
        Ok(image_files)
    }

    /// Destination of a resized picture: same file name, in the output directory
    pub fn output_path_for(&self, input_path: &Path) -> Result<PathBuf> {
        let file_name = input_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Input has no file name: {}", input_path.display()))?;
        Ok(self.config.output_dir.join(file_name))
    }

    /// Process every image in parallel; a failing image never stops the others
    pub fn process_batch(&self, image_files: &[PathBuf], progress: &ProgressBar) -> BatchReport {
        let results: Vec<Result<ImageOutcome>> = self.pool.install(|| {
            image_files
                .par_iter()
                .map(|image_path| {
                    let result = self.process_single_image(image_path);
                    progress.inc(1);
                    progress.set_message(display_name(image_path).to_string());
                    result
                })
                .collect()
        });

        BatchReport::collect(image_files, results)
    }

    /// Process a single image file
    pub fn process_single_image(&self, input_path: &Path) -> Result<ImageOutcome> {
        let output_path = self.output_path_for(input_path)?;

        if output_path.exists() && !self.config.force {
            verbose_println(
                self.config.verbose,
                &format!("Skipping {}", output_path.display()),
            );
            return Ok(ImageOutcome::Skipped(SkippedResult {
                input_path: input_path.to_path_buf(),
                existing_output_path: output_path,
                reason: SkipReason::AlreadyProcessed,
            }));
        }

        let result = if self.config.dry_run {
            // Only the header is needed to plan
            let (width, height) = image::image_dimensions(input_path)
                .with_context(|| format!("Failed to read image header: {}", input_path.display()))?;
            let source = Dimensions::new(width, height)?;
            self.plan_for(input_path, output_path, source)
        } else {
            let img = image::open(input_path)
                .with_context(|| format!("Failed to open image: {}", input_path.display()))?
                .to_rgb8();
            let source = Dimensions::new(img.width(), img.height())?;
            let result = self.plan_for(input_path, output_path, source);

            let fitted = resize::apply_plan(&img, &result.plan)
                .with_context(|| format!("Failed to resize {}", input_path.display()))?;
            resize::save_jpeg(&fitted, &result.output_path, self.config.jpeg_quality)?;
            result
        };

        verbose_println(self.config.verbose, &self.completion_message(&result.output_path));
        Ok(ImageOutcome::Processed(result))
    }

    fn completion_message(&self, output_path: &Path) -> String {
        if self.config.dry_run {
            format!("Would write: {}", output_path.display())
        } else {
            format!("Image Resized: {}", output_path.display())
        }
    }

    fn plan_for(&self, input_path: &Path, output_path: PathBuf, source: Dimensions) -> ProcessingResult {
        let plan = fit::plan(source, self.config.display, &self.config.fit_policy);

        verbose_println(
            self.config.verbose,
            &format!(
                "{}: {} -> {}x{}{}",
                display_name(input_path),
                source,
                plan.width,
                plan.height,
                match plan.crop {
                    Some(crop) => format!(
                        ", crop ({},{})-({},{})",
                        crop.left, crop.top, crop.right, crop.bottom
                    ),
                    None => String::new(),
                }
            ),
        );

        ProcessingResult {
            input_path: input_path.to_path_buf(),
            output_path,
            source,
            plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};
    use std::fs;

    fn test_config(output_dir: &Path) -> ProcessingConfig {
        ProcessingConfig {
            display: Dimensions::new(48, 80).unwrap(),
            fit_policy: FitPolicy::default(),
            output_dir: output_dir.to_path_buf(),
            extensions: vec!["jpg".to_string(), "png".to_string()],
            jpeg_quality: 75,
            verbose: false,
            parallel_jobs: 2,
            force: false,
            dry_run: false,
        }
    }

    fn write_image(path: &Path, width: u32, height: u32) {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_discover_images_filters_and_sorts() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_image(&input.path().join("b.png"), 4, 4);
        write_image(&input.path().join("a.jpg"), 4, 4);
        fs::write(input.path().join("notes.txt"), "not an image").unwrap();
        fs::create_dir(input.path().join("nested")).unwrap();
        write_image(&input.path().join("nested").join("c.png"), 4, 4);

        let engine = ProcessingEngine::new(test_config(output.path())).unwrap();
        let files = engine.discover_images(input.path()).unwrap();

        let names: Vec<&str> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn test_process_single_image_writes_fitted_jpeg() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let source = input.path().join("portrait.png");
        write_image(&source, 60, 160);

        let engine = ProcessingEngine::new(test_config(output.path())).unwrap();
        let outcome = engine.process_single_image(&source).unwrap();

        let ImageOutcome::Processed(result) = outcome else {
            panic!("expected the image to be processed");
        };
        assert!(result.cropped());
        assert_eq!(result.output_path, output.path().join("portrait.png"));

        let written = image::ImageReader::open(&result.output_path)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(written.format(), Some(image::ImageFormat::Jpeg));
        let written = written.decode().unwrap();
        assert_eq!(
            (written.width(), written.height()),
            result.plan.final_dimensions()
        );
        assert_eq!(written.height(), 80);
    }

    #[test]
    fn test_existing_output_is_skipped_unless_forced() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let source = input.path().join("done.jpg");
        write_image(&source, 40, 20);
        fs::write(output.path().join("done.jpg"), b"previous run").unwrap();

        let engine = ProcessingEngine::new(test_config(output.path())).unwrap();
        match engine.process_single_image(&source).unwrap() {
            ImageOutcome::Skipped(skipped) => {
                assert_eq!(skipped.reason, SkipReason::AlreadyProcessed);
                assert_eq!(skipped.existing_output_path, output.path().join("done.jpg"));
            }
            ImageOutcome::Processed(_) => panic!("expected a skip"),
        }

        let forced = ProcessingEngine::new(ProcessingConfig {
            force: true,
            ..test_config(output.path())
        })
        .unwrap();
        assert!(matches!(
            forced.process_single_image(&source).unwrap(),
            ImageOutcome::Processed(_)
        ));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let source = input.path().join("wide.png");
        write_image(&source, 400, 200);

        let engine = ProcessingEngine::new(ProcessingConfig {
            dry_run: true,
            ..test_config(output.path())
        })
        .unwrap();
        let ImageOutcome::Processed(result) = engine.process_single_image(&source).unwrap() else {
            panic!("expected a plan");
        };

        assert_eq!((result.plan.width, result.plan.height), (48, 24));
        assert!(!result.output_path.exists());
    }

    #[test]
    fn test_batch_continues_past_broken_image() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_image(&input.path().join("good.png"), 30, 20);
        fs::write(input.path().join("broken.jpg"), b"definitely not a jpeg").unwrap();
        write_image(&input.path().join("other.png"), 20, 30);

        let engine = ProcessingEngine::new(test_config(output.path())).unwrap();
        let files = engine.discover_images(input.path()).unwrap();
        let report = engine.process_batch(&files, &ProgressBar::hidden());

        assert_eq!(report.processed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(display_name(&report.failed[0].0), "broken.jpg");
        assert!(output.path().join("good.png").exists());
        assert!(output.path().join("other.png").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_discovery_skips_dangling_symlink() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_image(&input.path().join("good.png"), 30, 20);
        std::os::unix::fs::symlink("/nonexistent/gone.jpg", input.path().join("gone.jpg")).unwrap();

        let engine = ProcessingEngine::new(test_config(output.path())).unwrap();
        let files = engine.discover_images(input.path()).unwrap();

        let names: Vec<&str> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["good.png"]);

        let report = engine.process_batch(&files, &ProgressBar::hidden());
        assert_eq!(report.processed.len(), 1);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_completion_message_reflects_dry_run() {
        let output = tempfile::tempdir().unwrap();
        let path = output.path().join("photo.jpg");

        let engine = ProcessingEngine::new(test_config(output.path())).unwrap();
        assert!(engine.completion_message(&path).starts_with("Image Resized: "));

        let dry_run = ProcessingEngine::new(ProcessingConfig {
            dry_run: true,
            ..test_config(output.path())
        })
        .unwrap();
        assert!(dry_run.completion_message(&path).starts_with("Would write: "));
    }
}
