use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::time::Instant;

use pictureframe::cli::Args;
use pictureframe::display::resolve_display;
use pictureframe::image_processing::{BatchReport, ProcessingConfig, ProcessingEngine};
use pictureframe::utils::{
    create_progress_bar, display_name, error_println, format_duration, verbose_println,
    warn_println,
};
use pictureframe::{slideshow, sync, Dimensions, Settings};

fn main() {
    if let Err(e) = run() {
        error_println(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let start_time = Instant::now();
    let args = Args::parse();
    let settings = Settings::load(&args)?;

    // Print banner
    println!("{}", style("Picture Frame - Album Sync & Slideshow").bold().blue());
    println!("{}", style("Starting PhotoFrame Update").dim());
    println!();

    let display = resolve_display(settings.display_size)?;
    print_configuration(&settings, display);

    if settings.skip_sync {
        verbose_println(settings.verbose, "Skipping album sync and resizing (--start)");
    } else {
        update_pictures(&settings, display)?;
    }

    if settings.no_slideshow || settings.dry_run {
        verbose_println(settings.verbose, "Leaving the slideshow untouched");
    } else {
        restart_slideshow(&settings);
    }

    println!();
    println!(
        "{} {}",
        style("Run Time:").bold(),
        style(format_duration(start_time.elapsed())).bold()
    );
    Ok(())
}

fn print_configuration(settings: &Settings, display: Dimensions) {
    if !settings.verbose {
        return;
    }

    println!("{}", style("Configuration:").bold());
    if let Some(ref path) = settings.config_path {
        println!("  Config file: {}", path.display());
    }
    println!("  Display Dimensions: {} X {}", display.width(), display.height());
    println!("  Album: {}", settings.album);
    println!("  Image directory: {}", settings.image_dir.display());
    println!("  Output directory: {}", settings.output_dir.display());
    println!("  Extensions: {:?}", settings.extensions);
    println!("  Parallel jobs: {}", settings.parallel_jobs());
    println!("  Slideshow delay: {}s", settings.slideshow_delay);
    println!("  Fit policy: {:?}", settings.fit_policy);
    if !settings.skip_sync {
        println!(
            "  rclone: {}",
            if sync::is_rclone_available() {
                "available"
            } else {
                "not found (sync will fail)"
            }
        );
    }
    if settings.dry_run {
        println!("  Dry run mode: enabled (simulation only - no files will be created)");
    }
    println!();
}

/// Sync the album and fit every new picture to the display
fn update_pictures(settings: &Settings, display: Dimensions) -> Result<()> {
    if !settings.dry_run {
        // Let's make sure directories exist
        std::fs::create_dir_all(&settings.image_dir).with_context(|| {
            format!("Failed to create image directory: {}", settings.image_dir.display())
        })?;
        std::fs::create_dir_all(&settings.output_dir).with_context(|| {
            format!("Failed to create output directory: {}", settings.output_dir.display())
        })?;

        println!(
            "Copying album \"{}\" to \"{}\"",
            settings.album,
            settings.image_dir.display()
        );
        if let Err(e) = sync::sync_album(settings) {
            warn_println(&format!("{:#}", e));
            warn_println("Continuing with the pictures already on disk");
        }
    } else {
        verbose_println(settings.verbose, "Dry run mode: skipping directory creation and sync");
    }

    let engine = ProcessingEngine::new(ProcessingConfig::from_settings(settings, display))?;

    if !settings.image_dir.is_dir() {
        warn_println(&format!(
            "Image directory does not exist: {}",
            settings.image_dir.display()
        ));
        return Ok(());
    }

    let image_files = engine.discover_images(&settings.image_dir)?;
    if image_files.is_empty() {
        println!("{}", style("No images found with specified extensions").yellow());
        return Ok(());
    }

    let progress = create_progress_bar(image_files.len() as u64);
    progress.set_message("Processing images");
    let report = engine.process_batch(&image_files, &progress);
    progress.finish_with_message("✓ Processing Photos Complete");

    print_summary(&report, settings.dry_run);
    Ok(())
}

fn print_summary(report: &BatchReport, dry_run: bool) {
    println!();
    let header = if dry_run {
        style("Dry Run Results Summary:").bold().cyan()
    } else {
        style("Results Summary:").bold().green()
    };
    println!("{}", header);

    let processed_label = if dry_run {
        "Would be processed"
    } else {
        "Successfully processed"
    };
    println!(
        "  {}: {}",
        processed_label,
        style(report.processed.len()).bold().green()
    );
    let cropped = report.cropped_count();
    if cropped > 0 {
        println!(
            "  Blown up and cropped: {}",
            style(cropped).bold().magenta()
        );
    }
    if !report.skipped.is_empty() {
        println!(
            "  Skipped (already exist): {}",
            style(report.skipped.len()).bold().yellow()
        );
    }
    if !report.failed.is_empty() {
        println!("  Failed: {}", style(report.failed.len()).bold().red());
    }

    if dry_run && !report.processed.is_empty() {
        println!();
        println!("{}", style("Planned Output:").bold().blue());
        for (i, result) in report.processed.iter().enumerate() {
            let (final_width, final_height) = result.plan.final_dimensions();
            println!(
                "  {}: {} [{}] -> {}x{}{}",
                style(format!("#{}", i + 1)).dim(),
                style(display_name(&result.input_path)).bold(),
                result.source,
                final_width,
                final_height,
                if result.cropped() { " (cropped)" } else { "" }
            );
        }
    }

    if !report.failed.is_empty() {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        for (i, (path, e)) in report.failed.iter().enumerate() {
            println!(
                "  {}: {} - {:#}",
                style(format!("#{}", i + 1)).dim(),
                style(display_name(path)).bold().red(),
                e
            );
        }
        println!("  Check image files and try again with --verbose for more details");
    }

    if !report.skipped.is_empty() {
        println!("  Use --force to process all files regardless of existing outputs");
    }
}

/// Stop the running viewer and start a new one over the output directory
fn restart_slideshow(settings: &Settings) {
    println!("Stopping Photo Frame.");
    if let Err(e) = slideshow::stop_viewer(&settings.viewer) {
        warn_println(&format!("{:#}", e));
    }

    println!("Starting Photo Frame.");
    if let Err(e) = slideshow::start_viewer(settings) {
        error_println(&format!("{:#}", e));
    }
}
