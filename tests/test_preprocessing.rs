use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use scanstruct::detection::preprocessing::{binarize, decode, preprocess, to_grayscale};
use std::io::Cursor;

const DARK: Rgb<u8> = Rgb([30, 40, 50]);
const LIGHT: Rgb<u8> = Rgb([200, 210, 220]);

/// Colour page whose left half is dark and right half light.
fn two_tone_page() -> RgbImage {
    RgbImage::from_fn(120, 80, |x, _| if x < 60 { DARK } else { LIGHT })
}

fn encode(img: DynamicImage, format: ImageFormat) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)?;
    Ok(buf)
}

#[test]
fn test_binarized_output_is_two_valued() -> anyhow::Result<()> {
    let bytes = encode(DynamicImage::ImageRgb8(two_tone_page()), ImageFormat::Png)?;

    let pre = preprocess(&bytes)?;

    assert_eq!(pre.binarized.dimensions(), (120, 80));
    assert!(pre.binarized.pixels().all(|p| p[0] == 0 || p[0] == 255));
    assert_eq!(pre.binarized.get_pixel(10, 10)[0], 0);
    assert_eq!(pre.binarized.get_pixel(110, 10)[0], 255);
    Ok(())
}

#[test]
fn test_threshold_separates_the_two_tones() -> anyhow::Result<()> {
    let gray = to_grayscale(&DynamicImage::ImageRgb8(two_tone_page()));
    let dark = gray.get_pixel(10, 40)[0];
    let light = gray.get_pixel(110, 40)[0];
    assert!(dark < light);

    let (binarized, level) = binarize(&gray);

    assert!(dark <= level && level < light, "{dark} <= {level} < {light}");
    assert_eq!(binarized.get_pixel(10, 40)[0], 0);
    assert_eq!(binarized.get_pixel(110, 40)[0], 255);
    Ok(())
}

#[test]
fn test_preprocessing_is_deterministic() -> anyhow::Result<()> {
    let bytes = encode(DynamicImage::ImageRgb8(two_tone_page()), ImageFormat::Png)?;

    let first = preprocess(&bytes)?;
    let second = preprocess(&bytes)?;

    assert_eq!(first.grayscale, second.grayscale);
    assert_eq!(first.binarized, second.binarized);
    assert_eq!(first.threshold, second.threshold);
    Ok(())
}

#[test]
fn test_decode_rgba_png() -> anyhow::Result<()> {
    let img = RgbaImage::from_fn(64, 48, |x, _| {
        if x < 32 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 128])
        }
    });
    let bytes = encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)?;

    let decoded = decode(&bytes)?;
    assert_eq!((decoded.width(), decoded.height()), (64, 48));

    let gray = to_grayscale(&decoded);
    assert_eq!(gray.dimensions(), (64, 48));
    assert_eq!(gray.get_pixel(0, 0)[0], 0);
    assert_eq!(gray.get_pixel(63, 0)[0], 255);
    Ok(())
}

#[test]
fn test_decode_jpeg() -> anyhow::Result<()> {
    let bytes = encode(DynamicImage::ImageRgb8(two_tone_page()), ImageFormat::Jpeg)?;

    let decoded = decode(&bytes)?;
    assert_eq!((decoded.width(), decoded.height()), (120, 80));

    // Lossy, so compare the halves rather than exact values
    let pre = preprocess(&bytes)?;
    assert!(pre.grayscale.get_pixel(10, 40)[0] < pre.grayscale.get_pixel(110, 40)[0]);
    assert_eq!(pre.binarized.get_pixel(10, 40)[0], 0);
    assert_eq!(pre.binarized.get_pixel(110, 40)[0], 255);
    Ok(())
}
