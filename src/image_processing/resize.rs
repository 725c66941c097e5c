use anyhow::{Context, Result};
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::fit::{CropBox, ResizePlan};

/// Apply a resize plan to decoded pixels
///
/// Resizes to the planned size first, then crops when the plan carries a crop box.
pub fn apply_plan(img: &RgbImage, plan: &ResizePlan) -> Result<RgbImage> {
    let resized = resize_image(img, plan.width, plan.height)?;

    match plan.crop {
        Some(crop) => crop_image(&resized, &crop),
        None => Ok(resized),
    }
}

/// Crop an image to the given box
fn crop_image(img: &RgbImage, crop: &CropBox) -> Result<RgbImage> {
    let (img_width, img_height) = img.dimensions();

    // Validate crop parameters
    if crop.right > img_width
        || crop.bottom > img_height
        || crop.left >= crop.right
        || crop.top >= crop.bottom
    {
        return Err(anyhow::anyhow!(
            "Crop box ({},{})-({},{}) does not fit a {}x{} image",
            crop.left,
            crop.top,
            crop.right,
            crop.bottom,
            img_width,
            img_height
        ));
    }

    Ok(imageops::crop_imm(img, crop.left, crop.top, crop.width(), crop.height()).to_image())
}

/// Resize an image to exact dimensions using a Lanczos3 convolution
fn resize_image(img: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == width && src_height == height {
        return Ok(img.clone());
    }

    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!(
            "Target size must be positive, got {}x{}",
            width,
            height
        ));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x3)
        .context("Failed to wrap source pixels for resizing")?;

    let mut dst_image = Image::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .with_context(|| format!("Failed to resize {}x{} to {}x{}", src_width, src_height, width, height))?;

    RgbImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| anyhow::anyhow!("Resized buffer does not match {}x{}", width, height))
}

/// Encode an image as JPEG, whatever extension the destination carries
pub fn save_jpeg(img: &RgbImage, path: &Path, quality: u8) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100))
        .encode_image(img)
        .with_context(|| format!("Failed to encode JPEG: {}", path.display()))?;

    Ok(())
}
