pub mod pipeline;
pub mod ranking;
pub mod types;

pub use pipeline::ClassificationPipeline;
pub use types::{ClassificationResult, Prediction};
