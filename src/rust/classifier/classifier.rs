use std::sync::Arc;
use ort::session::Session;
use tokenizers::Tokenizer;

use super::error::ClassifierError;
use super::inference::SequenceClassification;
use super::labels::CategorySet;
use super::scores::{normalize, Normalized};
use crate::oracle::EmotionOracle;

/// A thread-safe emotion classifier backed by an ONNX sequence-classification model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are thread-safe:
/// - `String`, `usize` and `CategorySet` are `Send + Sync`
/// - `Tokenizer` and `Session` are wrapped in `Arc` and only used through `&self`
///
/// Share it between request handlers with `Arc`:
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotion_classifier::{BuiltinModel, Classifier};
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(Classifier::builder()
///     .with_model(BuiltinModel::DistilRobertaEmotion)?
///     .build()?);
///
/// let classifier_clone = Arc::clone(&classifier);
/// thread::spawn(move || {
///     classifier_clone.predict("what a lovely day").unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub model_path: String,
    pub tokenizer_path: String,
    pub(crate) tokenizer: Arc<Tokenizer>,
    pub(crate) session: Arc<Session>,
    pub(crate) categories: CategorySet,
    pub(crate) max_sequence_length: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl SequenceClassification for Classifier {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }
}

impl EmotionOracle for Classifier {
    fn categories(&self) -> &CategorySet {
        &self.categories
    }

    fn classify(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        self.logits(text)
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            num_labels: self.categories.len(),
            labels: self.categories.names().to_vec(),
            max_sequence_length: self.max_sequence_length,
        }
    }

    /// Counts the tokens the model sees for `text` after truncation.
    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        SequenceClassification::count_tokens(self, text)
    }

    /// Runs the model and returns the normalized distribution and the top label.
    ///
    /// This bypasses request validation; use [`crate::AnalysisContext::analyze`]
    /// for the full request pipeline.
    ///
    /// # Example
    /// ```no_run
    /// # use emotion_classifier::{BuiltinModel, Classifier};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let classifier = Classifier::builder()
    /// #     .with_model(BuiltinModel::DistilRobertaEmotion)?
    /// #     .build()?;
    /// let prediction = classifier.predict("I can't believe they cancelled the show")?;
    /// println!("Predicted emotion: {}", prediction.label);
    /// for (emotion, p) in prediction.distribution.iter() {
    ///     println!("{}: {:.2}", emotion, p);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, text: &str) -> Result<Normalized, ClassifierError> {
        let raw = self.logits(text)?;
        normalize(&raw, &self.categories)
    }
}
