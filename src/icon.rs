//! Poster-to-icon transcoding.
//!
//! Downloaded posters are decoded (with a non-strict JPEG fallback, since CDN
//! JPEGs are frequently slightly out of spec), normalized to RGBA and resized
//! into the fixed resolution ladder of one multi-frame `.ico` container.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use zune_core::{colorspace::ColorSpace, options::DecoderOptions};
use zune_jpeg::JpegDecoder;

/// Square frame sizes embedded in every generated icon, largest first.
pub const ICON_SIZES: [u32; 6] = [256, 128, 64, 48, 32, 16];

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("could not decode image {}", .0.display())]
    Undecodable(PathBuf),
    #[error("icon encoding failed: {0}")]
    Codec(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Transcodes the image at `image_path` into a multi-resolution icon at
/// `icon_path`.
pub fn convert_to_icon(image_path: &Path, icon_path: &Path) -> Result<(), IconError> {
    let rgba = decode_poster(image_path)?.to_rgba8();

    let mut encoded_frames = Vec::with_capacity(ICON_SIZES.len());
    for size in ICON_SIZES {
        let resized = imageops::resize(&rgba, size, size, FilterType::Lanczos3);
        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            resized.as_raw(),
            size,
            size,
            ExtendedColorType::Rgba8,
        )?;
        encoded_frames.push(png);
    }

    let mut frames = Vec::with_capacity(ICON_SIZES.len());
    for (png, size) in encoded_frames.iter().zip(ICON_SIZES) {
        frames.push(IcoFrame::as_png(png, size, size, ExtendedColorType::Rgba8)?);
    }

    let writer = BufWriter::new(File::create(icon_path)?);
    IcoEncoder::new(writer).encode_images(&frames)?;
    Ok(())
}

fn decode_poster(path: &Path) -> Result<DynamicImage, IconError> {
    if let Ok(decoded) = image::open(path) {
        return Ok(decoded);
    }
    let bytes = fs::read(path)?;
    decode_jpeg_non_strict(&bytes).ok_or_else(|| IconError::Undecodable(path.to_path_buf()))
}

fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0xd8
}

fn decode_jpeg_non_strict(bytes: &[u8]) -> Option<DynamicImage> {
    if !looks_like_jpeg(bytes) {
        return None;
    }

    let options = DecoderOptions::new_cmd()
        .set_strict_mode(false)
        .jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);
    let pixels = decoder.decode().ok()?;
    let (width, height) = decoder.dimensions()?;
    let image = image::RgbaImage::from_raw(width as u32, height as u32, pixels)?;
    Some(DynamicImage::ImageRgba8(image))
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::{convert_to_icon, IconError, ICON_SIZES};

    fn sample_poster(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        })
    }

    #[test]
    fn test_png_poster_becomes_multi_size_icon() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join("poster.png");
        let icon = dir.path().join("poster.ico");
        sample_poster(300, 444).save(&poster).unwrap();

        convert_to_icon(&poster, &icon).unwrap();

        // The decoder yields the best (largest) embedded frame.
        let decoded = image::open(&icon).unwrap();
        assert_eq!(decoded.width(), ICON_SIZES[0]);
        assert_eq!(decoded.height(), ICON_SIZES[0]);
    }

    #[test]
    fn test_jpeg_poster_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join("poster.jpg");
        let icon = dir.path().join("poster.ico");
        sample_poster(190, 281).save(&poster).unwrap();

        convert_to_icon(&poster, &icon).unwrap();
        assert!(icon.exists());
    }

    #[test]
    fn test_garbage_input_reports_codec_failure() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join("poster.jpg");
        let icon = dir.path().join("poster.ico");
        std::fs::write(&poster, b"definitely not an image").unwrap();

        match convert_to_icon(&poster, &icon) {
            Err(IconError::Undecodable(path)) => assert_eq!(path, poster),
            other => panic!("expected Undecodable, got {other:?}"),
        }
    }
}
