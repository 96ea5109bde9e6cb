use crate::utils::error::ClassifyError;
use crate::Result;
use image::{imageops::FilterType, DynamicImage, RgbImage};
use ndarray::Array4;
use serde::Serialize;

/// 模型输入尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for InputSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// 输入张量布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TensorLayout {
    /// (1, H, W, 3)，Keras/TensorFlow 导出的默认布局
    Nhwc,
    /// (1, 3, H, W)
    Nchw,
}

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 分类预处理流水线：RGB -> 缩放 -> 归一化到 [0,1] -> 批次张量
    pub fn preprocess(
        image: &DynamicImage,
        size: InputSize,
        layout: TensorLayout,
    ) -> Result<Array4<f32>> {
        if size.width == 0 || size.height == 0 {
            return Err(ClassifyError::ImageProcessing(format!(
                "Invalid target size {}x{}",
                size.width, size.height
            )));
        }

        // 1. 转换为RGB（丢弃alpha通道）
        let rgb = image.to_rgb8();

        // 2. 缩放到模型输入尺寸（不保持宽高比）
        let resized = Self::resize(&rgb, size);

        // 3. 归一化并组装张量
        Ok(Self::to_tensor(&resized, layout))
    }

    /// 精确缩放到目标尺寸
    pub fn resize(image: &RgbImage, size: InputSize) -> RgbImage {
        if image.dimensions() == (size.width, size.height) {
            return image.clone();
        }
        image::imageops::resize(image, size.width, size.height, FilterType::CatmullRom)
    }

    /// 像素值除以255，按布局生成带batch维度的张量
    pub fn to_tensor(image: &RgbImage, layout: TensorLayout) -> Array4<f32> {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);

        match layout {
            TensorLayout::Nhwc => Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
                image.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
            }),
            TensorLayout::Nchw => Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
                image.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn resizes_to_declared_input_shape_nhwc() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(640, 480, image::Rgb([1, 2, 3])));
        let tensor =
            ImagePreprocessor::preprocess(&img, InputSize::new(224, 160), TensorLayout::Nhwc)
                .unwrap();

        assert_eq!(tensor.shape(), &[1, 160, 224, 3]);
    }

    #[test]
    fn resizes_to_declared_input_shape_nchw() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(31, 17, image::Rgb([1, 2, 3])));
        let tensor =
            ImagePreprocessor::preprocess(&img, InputSize::new(96, 64), TensorLayout::Nchw)
                .unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 64, 96]);
    }

    #[test]
    fn normalizes_into_unit_range() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(20, 20, |x, y| {
            image::Rgb([(x * 12) as u8, (y * 12) as u8, 255])
        }));
        let tensor =
            ImagePreprocessor::preprocess(&img, InputSize::new(8, 8), TensorLayout::Nhwc).unwrap();

        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn keeps_channel_order_and_drops_alpha() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(4, 4, Rgba([255, 0, 51, 0])));

        let nhwc =
            ImagePreprocessor::preprocess(&img, InputSize::new(4, 4), TensorLayout::Nhwc).unwrap();
        assert_eq!(nhwc[[0, 2, 1, 0]], 1.0);
        assert_eq!(nhwc[[0, 2, 1, 1]], 0.0);
        assert!((nhwc[[0, 2, 1, 2]] - 0.2).abs() < 1e-6);

        let nchw =
            ImagePreprocessor::preprocess(&img, InputSize::new(4, 4), TensorLayout::Nchw).unwrap();
        assert_eq!(nchw[[0, 0, 3, 3]], 1.0);
        assert!((nchw[[0, 2, 0, 0]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn rejects_zero_target() {
        let img = DynamicImage::new_rgb8(4, 4);
        assert!(
            ImagePreprocessor::preprocess(&img, InputSize::new(0, 4), TensorLayout::Nhwc).is_err()
        );
    }
}
