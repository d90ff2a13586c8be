//! スクリーンショットの切り出しとエンコード

use crate::error::{BrandAiError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use brand_ai_common::EncodedImage;
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;

/// 切り出す領域の上限（左上基準）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
        }
    }
}

/// 画像を左上から上限サイズで切り出し、PNG + Base64 に変換
pub fn crop_encode_image(path: &Path, limits: ImageLimits) -> Result<EncodedImage> {
    let img = image::open(path)
        .map_err(|e| BrandAiError::ImageLoad(format!("{}: {}", path.display(), e)))?;

    let width = img.width().min(limits.max_width);
    let height = img.height().min(limits.max_height);
    if width == 0 || height == 0 {
        return Err(BrandAiError::ImageLoad(format!("空の画像: {}", path.display())));
    }

    let cropped = img.crop_imm(0, 0, width, height);

    let mut buffer = Cursor::new(Vec::new());
    cropped
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| BrandAiError::ImageLoad(format!("PNGエンコード失敗 {}: {}", path.display(), e)))?;

    Ok(EncodedImage {
        mime_type: "image/png".to_string(),
        data: STANDARD.encode(buffer.into_inner()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn test_crop_to_limits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.png");
        RgbImage::from_pixel(40, 30, Rgb([200, 10, 10])).save(&path).unwrap();

        let encoded = crop_encode_image(&path, ImageLimits { max_width: 16, max_height: 8 }).unwrap();
        assert_eq!(encoded.mime_type, "image/png");

        let bytes = STANDARD.decode(&encoded.data).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn test_small_image_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.png");
        RgbImage::new(5, 4).save(&path).unwrap();

        let encoded = crop_encode_image(&path, ImageLimits::default()).unwrap();
        let decoded = image::load_from_memory(&STANDARD.decode(&encoded.data).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 4));
    }

    #[test]
    fn test_invalid_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let result = crop_encode_image(&path, ImageLimits::default());
        assert!(matches!(result, Err(BrandAiError::ImageLoad(_))));
    }
}
