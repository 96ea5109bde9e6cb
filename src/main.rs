use anyhow::Result;
use clap::Parser;
use leafscan::{config::Config, web::serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leafscan")]
#[command(about = "Single-page image classification service powered by ONNX Runtime")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: String,

    /// ONNX model path
    #[arg(long, default_value = "plant_model.onnx")]
    model: String,

    /// Labels file, one label per line in model output order
    #[arg(long, default_value = "labels.txt")]
    labels: String,

    /// Static files directory (uploads are stored in <static-dir>/uploads)
    #[arg(long, default_value = "static")]
    static_dir: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting Leafscan...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model: {}", args.model);
    tracing::info!("Labels: {}", args.labels);

    let config = Config::new(
        args.bind,
        args.model,
        args.labels,
        args.static_dir,
        args.dev,
    )?;

    serve(config).await?;

    Ok(())
}
