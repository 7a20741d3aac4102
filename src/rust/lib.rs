//! A small inference service that classifies the emotional tone of text.
//!
//! Text is validated, scored by a pretrained sequence-classification model
//! (ONNX Runtime), turned into a probability distribution with a stable
//! softmax and returned together with the most likely emotion.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_classifier::{AnalysisContext, BuiltinModel, Classifier, ModelManager};
//! use std::sync::Arc;
//!
//! let model = BuiltinModel::DistilRobertaEmotion;
//! ModelManager::new_default()?
//!     .ensure_model_downloaded(&model.get_model_info())
//!     .await?;
//!
//! let classifier = Classifier::builder().with_model(model)?.build()?;
//! let context = AnalysisContext::new(Arc::new(classifier));
//!
//! let result = context.analyze("I am so happy today!")?;
//! println!("{} {:?}", result.label, result.scores.get(&result.label));
//! # Ok(())
//! # }
//! ```
//!
//! # Testing Without a Model
//!
//! The pipeline only depends on the [`EmotionOracle`] trait, so any scorer can
//! stand in for the ONNX model:
//!
//! ```
//! use emotion_classifier::{AnalysisContext, CategorySet, ClassifierError, EmotionOracle};
//! use std::sync::Arc;
//!
//! struct AlwaysJoy(CategorySet);
//!
//! impl EmotionOracle for AlwaysJoy {
//!     fn categories(&self) -> &CategorySet {
//!         &self.0
//!     }
//!     fn classify(&self, _text: &str) -> Result<Vec<f32>, ClassifierError> {
//!         Ok(vec![0.0, 4.0])
//!     }
//! }
//!
//! let oracle = AlwaysJoy(CategorySet::new(["anger", "joy"]).unwrap());
//! let context = AnalysisContext::new(Arc::new(oracle));
//! assert_eq!(context.analyze("  great news  ").unwrap().label, "Joy");
//! assert!(context.analyze("   ").is_err());
//! ```

pub mod analysis;
pub mod classifier;
pub mod model_manager;
pub mod models;
pub mod oracle;
mod runtime;
pub mod server;

pub use analysis::{AnalysisContext, AnalysisError, EmotionRequest, EmotionResult};
pub use classifier::{
    display_name, CategorySet, Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo,
    ProbabilityDistribution,
};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use oracle::EmotionOracle;
pub use runtime::{create_session_builder, RuntimeConfig};
pub use server::{AppState, ServerConfig};

/// Initializes `env_logger`, reading the filter from `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
