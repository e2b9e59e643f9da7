//! Image preprocessing for classifier input.
//!
//! Pure byte-to-tensor transform: no model calls, no side effects. The
//! same input bytes always yield the same tensor.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

use super::ClassifyError;

/// Model input canvas, a model contract constant rather than a per-call
/// option. The trained artifact and the placeholder both expect 150x150x3.
pub const INPUT_SIZE: u32 = 150;
pub const INPUT_CHANNELS: usize = 3;

/// Maximum input image size (in bytes) before rejecting.
/// Prevents OOM on corrupt/adversarial files.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// Read an image file and preprocess it for the classifier.
pub fn preprocess_file(path: &Path) -> Result<Array4<f32>, ClassifyError> {
    let bytes = std::fs::read(path)?;
    preprocess_bytes(&bytes)
}

/// Preprocess raw image bytes (PNG, JPEG, TIFF) into a `(1, 150, 150, 3)`
/// tensor: decode, resize to the fixed canvas, force RGB, scale intensities
/// to [0, 1], add the batch dimension.
pub fn preprocess_bytes(bytes: &[u8]) -> Result<Array4<f32>, ClassifyError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(ClassifyError::Decode(format!(
            "input too small to be an image ({} bytes)",
            bytes.len()
        )));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ClassifyError::Decode(format!(
            "input exceeds {MAX_IMAGE_BYTES} bytes"
        )));
    }

    let image = image::load_from_memory(bytes).map_err(|e| ClassifyError::Decode(e.to_string()))?;
    Ok(tensor_from_image(&image))
}

/// Decoded image to normalized input tensor.
///
/// The resize stretches to the square canvas (no aspect-ratio padding);
/// grayscale and paletted inputs are converted to 3-channel color.
pub fn tensor_from_image(image: &DynamicImage) -> Array4<f32> {
    let resized = image.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);
    let rgb = resized.to_rgb8();

    Array4::from_shape_fn(
        (1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS),
        |(_, y, x, c)| rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
    )
}
