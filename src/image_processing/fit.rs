//! Display fitting policy
//!
//! Decides, for a source image and a display, which size the image should be
//! resized to and whether the result must then be cropped. Everything here is
//! plain arithmetic on dimensions: no pixels are touched.
//!
//! All derived sizes are truncated toward zero and clamped to at least one
//! pixel. Aspect ratios are compared exactly through integer
//! cross-multiplication, so a source whose aspect ratio equals the display's
//! always takes the height-constrained path.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of an image or display, both guaranteed non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    /// Create dimensions, rejecting a zero width or height
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!(
                "Dimensions must be positive, got {}x{}",
                width,
                height
            );
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Constants steering the narrow-image exception
///
/// The bottom share is always `1.0 - top_share`, so the two trims together
/// account for the whole overflow created by the blow-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct FitPolicy {
    /// Displays narrower than this (in pixels) count as small screens
    pub small_screen_width: u32,
    /// Sources with an aspect ratio below this count as narrow
    pub narrow_aspect_max: f64,
    /// Multiplier applied to the display height before cropping
    pub blowup_factor: f64,
    /// Fraction of the overflow trimmed from the top edge
    pub top_share: f64,
}

impl Default for FitPolicy {
    fn default() -> Self {
        Self {
            small_screen_width: 801,
            narrow_aspect_max: 0.76,
            blowup_factor: 1.1,
            top_share: 0.3,
        }
    }
}

impl FitPolicy {
    /// Fraction of the overflow trimmed from the bottom edge
    pub fn bottom_share(&self) -> f64 {
        1.0 - self.top_share
    }

    /// Check that the constants describe a usable policy
    pub fn validate(&self) -> Result<()> {
        if !self.narrow_aspect_max.is_finite() || self.narrow_aspect_max <= 0.0 {
            bail!(
                "Narrow aspect threshold must be a positive number, got {}",
                self.narrow_aspect_max
            );
        }
        if !self.blowup_factor.is_finite() || self.blowup_factor <= 1.0 {
            bail!(
                "Blow-up factor must be greater than 1.0, got {}",
                self.blowup_factor
            );
        }
        if !(0.0..=1.0).contains(&self.top_share) {
            bail!(
                "Top crop share must be between 0.0 and 1.0, got {}",
                self.top_share
            );
        }
        Ok(())
    }

    fn is_narrow_on_small_screen(&self, source: Dimensions, display: Dimensions) -> bool {
        source.aspect_ratio() < self.narrow_aspect_max && display.width < self.small_screen_width
    }
}

/// Crop rectangle in the coordinate space of the resized image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// How a single source image gets fitted to the display
///
/// The caller resizes to `width` x `height`, then crops to `crop` if present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizePlan {
    pub width: u32,
    pub height: u32,
    pub crop: Option<CropBox>,
}

impl ResizePlan {
    fn uncropped(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: None,
        }
    }

    pub fn is_cropped(&self) -> bool {
        self.crop.is_some()
    }

    /// Size of the image once the plan has been fully applied
    pub fn final_dimensions(&self) -> (u32, u32) {
        match self.crop {
            Some(crop) => (crop.width(), crop.height()),
            None => (self.width, self.height),
        }
    }
}

/// Compute the resize plan for `source` on `display`
pub fn plan(source: Dimensions, display: Dimensions, policy: &FitPolicy) -> ResizePlan {
    let wider_than_display =
        source.width as u64 * display.height as u64 > display.width as u64 * source.height as u64;

    if wider_than_display {
        // Constrain to the full display width
        return ResizePlan::uncropped(
            display.width,
            scale_side(source.height, display.width, source.width),
        );
    }

    if policy.is_narrow_on_small_screen(source, display) {
        return blow_up_and_crop(source, display, policy);
    }

    ResizePlan::uncropped(
        scale_side(source.width, display.height, source.height),
        display.height,
    )
}

/// Same as [`plan`] but takes raw sizes, failing on any zero side
pub fn plan_checked(
    source_width: u32,
    source_height: u32,
    display_width: u32,
    display_height: u32,
    policy: &FitPolicy,
) -> Result<ResizePlan> {
    let source = Dimensions::new(source_width, source_height)?;
    let display = Dimensions::new(display_width, display_height)?;
    Ok(plan(source, display, policy))
}

/// Narrow pictures lose most of a small screen when fit by height. Blow them
/// up past the display height and trim the overflow, mostly from the bottom.
fn blow_up_and_crop(source: Dimensions, display: Dimensions, policy: &FitPolicy) -> ResizePlan {
    let height = truncate_side(display.height as f64 * policy.blowup_factor);
    let width = scale_side(source.width, height, source.height);

    let overflow = display.height as f64 * (policy.blowup_factor - 1.0);
    let top = truncate_offset(overflow * policy.top_share).min(height - 1);
    let mut bottom = height.saturating_sub(truncate_offset(overflow * policy.bottom_share()));

    // Truncating both trims can leave a one pixel residue; it goes to the bottom edge.
    if bottom.saturating_sub(top) != display.height {
        bottom = top.saturating_add(display.height).min(height);
    }
    if bottom <= top {
        bottom = top + 1;
    }

    ResizePlan {
        width,
        height,
        crop: Some(CropBox {
            left: 0,
            top,
            right: width,
            bottom,
        }),
    }
}

/// `side * numerator / denominator`, truncated, never below one pixel
fn scale_side(side: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = side as u64 * numerator as u64 / denominator as u64;
    scaled.clamp(1, u32::MAX as u64) as u32
}

fn truncate_side(value: f64) -> u32 {
    // `as` truncates toward zero and saturates at the type bounds
    (value as u32).max(1)
}

fn truncate_offset(value: f64) -> u32 {
    value as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions::new(width, height).unwrap()
    }

    #[test]
    fn test_wide_source_constrained_by_width() {
        let plan = plan(dims(4000, 2000), dims(1920, 1080), &FitPolicy::default());

        assert_eq!(plan.width, 1920);
        assert_eq!(plan.height, 960);
        assert!(plan.crop.is_none());
    }

    #[test]
    fn test_tall_source_on_large_screen_is_not_cropped() {
        let plan = plan(dims(1200, 1600), dims(1920, 1080), &FitPolicy::default());

        assert_eq!(plan.width, 810);
        assert_eq!(plan.height, 1080);
        assert!(plan.crop.is_none());
    }

    #[test]
    fn test_narrow_source_on_small_screen_is_blown_up_and_cropped() {
        let plan = plan(dims(600, 1600), dims(480, 800), &FitPolicy::default());

        assert_eq!(plan.height, 880);
        assert_eq!(plan.width, 330);
        assert_eq!(
            plan.crop,
            Some(CropBox {
                left: 0,
                top: 24,
                right: 330,
                bottom: 824,
            })
        );
        assert_eq!(plan.final_dimensions(), (330, 800));
    }

    #[test]
    fn test_cropped_height_matches_display_height() {
        let policy = FitPolicy::default();
        for display_height in [480, 600, 768, 800, 813, 1024, 1279] {
            let plan = plan(dims(600, 1600), dims(480, display_height), &policy);
            assert_eq!(plan.final_dimensions().1, display_height);
        }
    }

    #[test]
    fn test_equal_aspect_takes_height_constrained_path() {
        // 600x1000 and 480x800 share a 0.6 aspect ratio; only the height path
        // can reach the narrow-image exception.
        let plan = plan(dims(600, 1000), dims(480, 800), &FitPolicy::default());

        assert_eq!(plan.height, 880);
        assert_eq!(plan.width, 528);
        assert!(plan.is_cropped());
    }

    #[test]
    fn test_equal_aspect_without_exception_fills_display() {
        let plan = plan(dims(3840, 2160), dims(1920, 1080), &FitPolicy::default());

        assert_eq!((plan.width, plan.height), (1920, 1080));
        assert!(plan.crop.is_none());
    }

    #[test]
    fn test_aspect_at_narrow_threshold_is_not_cropped() {
        let policy = FitPolicy::default();

        let at_threshold = plan(dims(76, 100), dims(800, 1000), &policy);
        assert!(at_threshold.crop.is_none());
        assert_eq!((at_threshold.width, at_threshold.height), (760, 1000));

        let below_threshold = plan(dims(75, 100), dims(800, 1000), &policy);
        assert!(below_threshold.is_cropped());
    }

    #[test]
    fn test_display_at_small_screen_threshold_is_not_cropped() {
        let policy = FitPolicy::default();

        let at_threshold = plan(dims(600, 1600), dims(801, 1000), &policy);
        assert!(at_threshold.crop.is_none());
        assert_eq!((at_threshold.width, at_threshold.height), (375, 1000));

        let below_threshold = plan(dims(600, 1600), dims(800, 1000), &policy);
        assert!(below_threshold.is_cropped());
    }

    #[test]
    fn test_extreme_aspect_never_yields_zero_side() {
        let policy = FitPolicy::default();

        let wide = plan(dims(100_000, 1), dims(1920, 1080), &policy);
        assert_eq!((wide.width, wide.height), (1920, 1));

        let narrow = plan(dims(1, 100_000), dims(480, 800), &policy);
        assert_eq!(narrow.width, 1);
        assert_eq!(narrow.final_dimensions(), (1, 800));
    }

    #[test]
    fn test_plan_checked_rejects_zero_dimensions() {
        let policy = FitPolicy::default();

        assert!(plan_checked(0, 100, 800, 480, &policy).is_err());
        assert!(plan_checked(100, 0, 800, 480, &policy).is_err());
        assert!(plan_checked(100, 100, 0, 480, &policy).is_err());
        assert!(plan_checked(100, 100, 800, 0, &policy).is_err());
        assert!(plan_checked(100, 100, 800, 480, &policy).is_ok());
    }

    #[test]
    fn test_policy_validation() {
        assert!(FitPolicy::default().validate().is_ok());

        let flat_blowup = FitPolicy {
            blowup_factor: 1.0,
            ..FitPolicy::default()
        };
        assert!(flat_blowup.validate().is_err());

        let bad_share = FitPolicy {
            top_share: 1.5,
            ..FitPolicy::default()
        };
        assert!(bad_share.validate().is_err());

        let bad_threshold = FitPolicy {
            narrow_aspect_max: f64::NAN,
            ..FitPolicy::default()
        };
        assert!(bad_threshold.validate().is_err());
    }

    #[test]
    fn test_bottom_share_complements_top_share() {
        let policy = FitPolicy::default();
        assert!((policy.top_share + policy.bottom_share() - 1.0).abs() < f64::EPSILON);
    }
}
