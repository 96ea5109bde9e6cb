use crate::image::InputSize;
use serde::{Deserialize, Serialize};

/// 单个类别预测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// 模型输出中的类别索引
    pub index: usize,
    /// 类别名称
    pub label: String,
    /// 模型原始输出分数
    pub confidence: f32,
}

/// 完整的分类结果
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    /// 上传文件名（清理后）
    pub filename: String,
    /// 按置信度降序排列的预测
    pub predictions: Vec<Prediction>,
    /// 处理耗时（毫秒）
    pub processing_time_ms: u64,
    /// 实际使用的模型输入尺寸
    pub input_size: InputSize,
}
