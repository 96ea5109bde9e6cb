use crate::config::ModelConfig;
use crate::image::{InputSize, TensorLayout};
use crate::models::{Classifier, LabelSet, Predictor};
use crate::{Config, Result};
use std::sync::Arc;

/// 模型管理器：启动时加载一次，之后只读
pub struct ModelManager {
    predictor: Arc<dyn Predictor>,
    labels: LabelSet,
    config: ModelConfig,
}

impl ModelManager {
    /// 从配置加载模型和标签
    pub fn load(config: &Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let classifier = Classifier::new(&config.model_path, &config.model_config)?;
        let labels = LabelSet::load(&config.labels_path)?;

        let manager = Self::new(Arc::new(classifier), labels, config.model_config.clone());

        // 预热，同时检查输出类别数与标签数是否一致
        let num_classes = manager.warm_up()?;
        if num_classes != manager.labels.len() {
            tracing::warn!(
                "Model emits {} classes but {} labels are loaded",
                num_classes,
                manager.labels.len()
            );
        }

        tracing::info!("Model manager initialized successfully");
        Ok(manager)
    }

    pub fn new(predictor: Arc<dyn Predictor>, labels: LabelSet, config: ModelConfig) -> Self {
        if labels.is_empty() {
            tracing::warn!("Label set is empty, predictions will use placeholder names");
        }

        Self {
            predictor,
            labels,
            config,
        }
    }

    /// 获取推理器引用
    pub fn predictor(&self) -> Arc<dyn Predictor> {
        Arc::clone(&self.predictor)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// 模型健康检查
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");
        self.warm_up()?;
        tracing::debug!("Model health check passed");
        Ok(())
    }

    /// 用全零输入跑一次前向推理，返回输出类别数
    fn warm_up(&self) -> Result<usize> {
        let size = self.predictor.input_size();
        let (w, h) = (size.width as usize, size.height as usize);
        let input = match self.predictor.layout() {
            TensorLayout::Nhwc => ndarray::Array4::<f32>::zeros((1, h, w, 3)),
            TensorLayout::Nchw => ndarray::Array4::<f32>::zeros((1, 3, h, w)),
        };

        Ok(self.predictor.predict(input)?.len())
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            model: self.predictor.name().to_string(),
            input_size: self.predictor.input_size(),
            layout: self.predictor.layout(),
            num_labels: self.labels.len(),
            top_k: self.config.top_k,
            intra_threads: self.config.intra_threads,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model: String,
    pub input_size: InputSize,
    pub layout: TensorLayout,
    pub num_labels: usize,
    pub top_k: usize,
    pub intra_threads: usize,
}
