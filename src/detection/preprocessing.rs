use image::{DynamicImage, GrayImage, ImageReader};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use std::io::Cursor;

use crate::error::ImageDecodeError;

/// Output of the preprocessing stage.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub grayscale: GrayImage,
    /// Two-valued image: 255 above the threshold, 0 at or below it
    pub binarized: GrayImage,
    pub threshold: u8,
}

/// Decode an encoded image buffer, guessing the container format from its contents.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageDecodeError> {
    if bytes.is_empty() {
        return Err(ImageDecodeError::Empty);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageDecodeError::Unsupported(image::ImageError::IoError(e)))?;

    Ok(reader.decode()?)
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Binarize with a global threshold chosen by Otsu's method
pub fn binarize(gray: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(gray);
    (threshold(gray, level, ThresholdType::Binary), level)
}

/// Decode, grayscale and binarize in one go.
pub fn preprocess(bytes: &[u8]) -> Result<Preprocessed, ImageDecodeError> {
    let img = decode(bytes)?;
    let grayscale = to_grayscale(&img);
    let (binarized, threshold) = binarize(&grayscale);

    tracing::debug!(
        width = grayscale.width(),
        height = grayscale.height(),
        threshold,
        "preprocessed image"
    );

    Ok(Preprocessed {
        grayscale,
        binarized,
        threshold,
    })
}
