// Library exports for the binary and integration tests
pub mod cli;
pub mod config_file;
pub mod display;
pub mod image_processing;
pub mod slideshow;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use config_file::Settings;
pub use image_processing::fit::{plan, plan_checked, CropBox, Dimensions, FitPolicy, ResizePlan};
pub use image_processing::{
    BatchReport, ImageOutcome, ProcessingConfig, ProcessingEngine, ProcessingResult, SkipReason,
};
