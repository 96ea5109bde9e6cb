pub mod classifier;
pub mod labels;
pub mod manager;

pub use classifier::{Classifier, Predictor};
pub use labels::LabelSet;
pub use manager::{ModelManager, ModelStats};
