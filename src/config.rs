use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径（ONNX）
    pub model_path: PathBuf,

    /// 标签文件路径，每行一个标签
    pub labels_path: PathBuf,

    /// 静态文件目录，上传目录位于其下的 uploads/
    pub static_dir: PathBuf,

    /// 开发模式
    pub dev_mode: bool,

    /// 模型配置
    pub model_config: ModelConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 模型未声明输入尺寸时使用的 (宽, 高)
    pub fallback_input_size: (u32, u32),

    /// 返回的预测数量
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            intra_threads: (num_cpus::get() * 3 / 4).max(1), // 使用75%的CPU核心
            fallback_input_size: (224, 224),
            top_k: 3,
        }
    }
}

impl ServerConfig {
    pub fn new(dev_mode: bool) -> Self {
        Self {
            request_timeout: if dev_mode { 300 } else { 60 }, // 开发模式更长超时
            max_request_size: 16 * 1024 * 1024,               // 16MB
        }
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: String,
        labels_path: String,
        static_dir: String,
        dev_mode: bool,
    ) -> Result<Self> {
        if bind_addr.trim().is_empty() {
            anyhow::bail!("bind address must not be empty");
        }

        Ok(Self {
            bind_addr,
            model_path: PathBuf::from(model_path),
            labels_path: PathBuf::from(labels_path),
            static_dir: PathBuf::from(static_dir),
            dev_mode,
            model_config: ModelConfig::default(),
            server_config: ServerConfig::new(dev_mode),
        })
    }

    /// 获取上传目录路径
    pub fn upload_dir(&self) -> PathBuf {
        self.static_dir.join("uploads")
    }
}
