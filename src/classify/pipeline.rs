use crate::{
    classify::{ranking, ClassificationResult},
    image::{ImageLoader, ImagePreprocessor},
    models::ModelManager,
    utils::error::ClassifyError,
    Result,
};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// 分类处理流水线：预处理 -> 推理 -> 排序
pub struct ClassificationPipeline;

impl ClassificationPipeline {
    /// 处理已保存到磁盘的图像
    pub async fn process_path(
        manager: Arc<ModelManager>,
        path: &Path,
        filename: &str,
    ) -> Result<ClassificationResult> {
        let start_time = Instant::now();
        let path: PathBuf = path.to_path_buf();

        tracing::debug!("Classifying {}", path.display());

        let scores = run_blocking(Arc::clone(&manager), move |manager| {
            let image = ImageLoader::from_path(&path)?;
            Self::infer(manager, &image)
        })
        .await?;

        Ok(Self::finish(&manager, scores, filename, start_time))
    }

    /// 处理内存中的图像字节
    pub async fn process_bytes(
        manager: Arc<ModelManager>,
        bytes: Vec<u8>,
        filename: &str,
        max_size: usize,
    ) -> Result<ClassificationResult> {
        let start_time = Instant::now();

        let scores = run_blocking(Arc::clone(&manager), move |manager| {
            let image = ImageLoader::from_bytes(&bytes, max_size)?;
            Self::infer(manager, &image)
        })
        .await?;

        Ok(Self::finish(&manager, scores, filename, start_time))
    }

    /// 预处理并执行前向推理
    fn infer(manager: &ModelManager, image: &DynamicImage) -> Result<Vec<f32>> {
        let predictor = manager.predictor();
        let input = ImagePreprocessor::preprocess(image, predictor.input_size(), predictor.layout())?;

        let inference_start = Instant::now();
        let scores = predictor.predict(input)?;

        tracing::debug!(
            "Inference finished: classes={}, time={:.3}s",
            scores.len(),
            inference_start.elapsed().as_secs_f32()
        );

        Ok(scores)
    }

    fn finish(
        manager: &ModelManager,
        scores: Vec<f32>,
        filename: &str,
        start_time: Instant,
    ) -> ClassificationResult {
        let predictions = ranking::rank(&scores, manager.labels(), manager.config().top_k);
        let total_time = start_time.elapsed();

        tracing::info!(
            "Classification completed: file={}, top={:?}, time={:.3}s",
            filename,
            predictions.first().map(|p| p.label.as_str()),
            total_time.as_secs_f32()
        );

        ClassificationResult {
            filename: filename.to_string(),
            predictions,
            processing_time_ms: total_time.as_millis() as u64,
            input_size: manager.predictor().input_size(),
        }
    }
}

/// 在阻塞线程池中执行CPU密集的解码与推理
async fn run_blocking<T, F>(manager: Arc<ModelManager>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ModelManager) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&manager))
        .await
        .map_err(|e| ClassifyError::Internal(format!("Inference task failed: {}", e)))?
}
