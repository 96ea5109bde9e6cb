use crate::config::ModelConfig;
use crate::image::{InputSize, TensorLayout};
use crate::utils::error::ClassifyError;
use crate::Result;
use ndarray::{Array4, Axis};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// 图像分类模型接口
pub trait Predictor: Send + Sync {
    /// 模型期望的输入尺寸
    fn input_size(&self) -> InputSize;

    /// 模型期望的张量布局
    fn layout(&self) -> TensorLayout;

    /// 前向推理，返回第一行输出 (num_classes,)
    fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>>;

    fn name(&self) -> &str {
        "predictor"
    }
}

/// 基于 ONNX Runtime 的分类器
pub struct Classifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
    input_size: InputSize,
    layout: TensorLayout,
    name: String,
}

impl Classifier {
    pub fn new(model_path: &Path, config: &ModelConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(ClassifyError::ModelLoad(format!(
                "Model file not found at {}. Place your ONNX model there.",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()
            .map_err(model_load_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_load_error)?
            .with_intra_threads(config.intra_threads)
            .map_err(model_load_error)?
            .commit_from_file(model_path)
            .map_err(model_load_error)?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| ClassifyError::ModelLoad("Model has no inputs".to_string()))?;
        let input_name = input.name.clone();

        // 从模型声明的输入形状推断尺寸和布局
        let (input_size, layout) = match input.input_type.tensor_shape() {
            Some(dims) => input_spec_from_shape(dims, config.fallback_input_size.into()),
            None => {
                tracing::warn!(
                    "Model input '{}' has no tensor shape, falling back to {:?}",
                    input_name,
                    config.fallback_input_size
                );
                (config.fallback_input_size.into(), TensorLayout::Nhwc)
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad("Model has no outputs".to_string()));
            }
        };

        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Model output[{}]: '{}'", i, output.name);
        }

        tracing::info!(
            "Model input '{}' {}x{} {:?}, output '{}'",
            input_name,
            input_size.width,
            input_size.height,
            layout,
            output_name
        );

        let name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_size,
            layout,
            name,
        })
    }
}

impl Predictor for Classifier {
    fn input_size(&self) -> InputSize {
        self.input_size
    }

    fn layout(&self) -> TensorLayout {
        self.layout
    }

    fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input)?;

        let mut session = self.session.lock();
        let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

        let output = match outputs.get(self.output_name.as_str()) {
            Some(output) => output,
            None => {
                let available_outputs: Vec<String> =
                    outputs.keys().map(|s| s.to_string()).collect();
                return Err(ClassifyError::Inference(format!(
                    "Output '{}' not found. Available outputs: {:?}",
                    self.output_name, available_outputs
                )));
            }
        };

        let predictions = output.try_extract_array::<f32>()?;
        let scores = first_row(predictions.view());

        if scores.is_empty() {
            return Err(ClassifyError::Inference("Model returned no scores".to_string()));
        }

        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn model_load_error(e: impl std::fmt::Display) -> ClassifyError {
    ClassifyError::ModelLoad(e.to_string())
}

/// 取输出张量的第一行（去掉batch维度）
fn first_row(predictions: ndarray::ArrayViewD<'_, f32>) -> Vec<f32> {
    if predictions.ndim() >= 2 && predictions.shape()[0] > 0 {
        predictions.index_axis(Axis(0), 0).iter().copied().collect()
    } else {
        predictions.iter().copied().collect()
    }
}

/// 根据输入形状推断 (尺寸, 布局)
///
/// 支持 `[N, H, W, C]` 与 `[N, C, H, W]`；动态维度（<= 0）使用回退尺寸。
pub fn input_spec_from_shape(dims: &[i64], fallback: InputSize) -> (InputSize, TensorLayout) {
    if dims.len() != 4 {
        tracing::warn!(
            "Unexpected input rank {} ({:?}), falling back to {}x{}",
            dims.len(),
            dims,
            fallback.width,
            fallback.height
        );
        return (fallback, TensorLayout::Nhwc);
    }

    let (layout, h, w) = if dims[1] == 3 && dims[3] != 3 {
        (TensorLayout::Nchw, dims[2], dims[3])
    } else {
        (TensorLayout::Nhwc, dims[1], dims[2])
    };

    if h <= 0 || w <= 0 {
        return (fallback, layout);
    }

    (InputSize::new(w as u32, h as u32), layout)
}
