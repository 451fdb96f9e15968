use crate::error::{PosterError, PosterResult};
use crate::tools::file_tools::write_atomic;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageResult, Rgb, RgbImage};
use std::path::Path;

pub const PLACEHOLDER_WIDTH: u32 = 16;
pub const PLACEHOLDER_HEIGHT: u32 = 24;
const PLACEHOLDER_COLOR: Rgb<u8> = Rgb([32, 32, 36]);

/// 產生單色的小型 JPEG
pub fn placeholder_jpeg() -> ImageResult<Vec<u8>> {
    let image = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, PLACEHOLDER_COLOR);
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 85).encode_image(&image)?;
    Ok(bytes)
}

/// 原子寫入替代圖片，不依賴任何外部工具
pub fn write_placeholder(output: &Path) -> PosterResult<()> {
    let bytes = placeholder_jpeg()
        .map_err(|e| PosterError::cache_write(output, std::io::Error::other(e)))?;
    write_atomic(output, &bytes).map_err(|e| PosterError::cache_write(output, e))
}
