mod error;
mod inference;
mod classifier;
pub mod builder;
pub mod labels;
pub mod scores;

pub use error::ClassifierError;
pub use classifier::Classifier;
pub use builder::ClassifierBuilder;
pub use labels::{display_name, CategorySet};
pub use scores::{argmax, normalize, softmax, Normalized, ProbabilityDistribution};

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Number of categories the model predicts
    pub num_labels: usize,
    /// Raw category names in model output order
    pub labels: Vec<String>,
    /// Tokens beyond this limit are truncated
    pub max_sequence_length: usize,
}
