//! Crop-and-scale of source images

use crate::error::{PreviewerError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

pub const JPEG_QUALITY: u8 = 100;

/// Decode `data`, scale it to cover `width` x `height`, crop the centre to
/// exactly that size and encode the result as JPEG
pub fn fill(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let source = image::load_from_memory(data)
        .map_err(|e| PreviewerError::Resize(format!("decode failed: {}", e)))?;

    let filled = source
        .resize_to_fill(width, height, FilterType::Lanczos3)
        .to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&filled)
        .map_err(|e| PreviewerError::Resize(format!("encode failed: {}", e)))?;
    Ok(out)
}

/// Run [`fill`] on the blocking pool
pub async fn fill_blocking(data: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || fill(&data, width, height))
        .await
        .map_err(|e| PreviewerError::Internal(format!("resize task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// Left half red, right half blue
    fn split_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_fill_produces_exact_jpeg() {
        let out = fill(&split_png(400, 300), 120, 80).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (120, 80));
    }

    #[test]
    fn test_fill_crops_centre() {
        // A tall target over a wide source keeps only the middle columns,
        // where red meets blue
        let out = fill(&split_png(400, 100), 50, 100).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (50, 100));

        let left = decoded.get_pixel(2, 50);
        let right = decoded.get_pixel(47, 50);
        assert!(left[0] > 200 && left[2] < 60, "left pixel {:?}", left);
        assert!(right[2] > 200 && right[0] < 60, "right pixel {:?}", right);
    }

    #[test]
    fn test_fill_upscales() {
        let out = fill(&split_png(10, 10), 64, 48).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_fill_rejects_garbage() {
        let err = fill(b"not an image", 10, 10).unwrap_err();
        assert!(matches!(err, PreviewerError::Resize(_)));
    }

    #[tokio::test]
    async fn test_fill_blocking() {
        let out = fill_blocking(split_png(40, 40), 20, 10).await.unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
    }
}
