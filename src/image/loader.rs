use crate::utils::error::ClassifyError;
use crate::Result;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::path::Path;

/// 单边最大像素数
const MAX_DIMENSION: u32 = 8192;

pub struct ImageLoader;

impl ImageLoader {
    /// 从字节加载图像
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(ClassifyError::InvalidInput("Empty image data".to_string()));
        }

        // 检查文件大小
        if bytes.len() > max_size {
            return Err(ClassifyError::FileTooLarge(bytes.len(), max_size));
        }

        if let Some(format) = Self::detect_format(bytes) {
            tracing::debug!("Detected image format: {:?}", format);
        }

        let image = image::load_from_memory(bytes)?;
        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 从文件路径加载图像（按文件内容而不是扩展名识别格式）
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClassifyError::InvalidInput(format!(
                "Image has no pixels: {}x{}",
                width, height
            )));
        }

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ClassifyError::InvalidInput(format!(
                "Image too large: {}x{}, maximum {}x{}",
                width, height, MAX_DIMENSION, MAX_DIMENSION
            )));
        }

        Ok(())
    }
}
