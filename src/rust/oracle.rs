//! The model seam of the analysis pipeline.

use crate::classifier::{CategorySet, ClassifierError};

/// A loaded, warm classification model.
///
/// `classify` returns one raw score (logit) per category, aligned by position
/// with [`EmotionOracle::categories`]. Implementations must tolerate any
/// number of concurrent calls; each call is independent of the others.
///
/// The ONNX-backed [`crate::Classifier`] is the production implementation.
/// Tests substitute their own:
///
/// ```
/// use emotion_classifier::{CategorySet, ClassifierError, EmotionOracle};
///
/// struct Fixed(CategorySet);
///
/// impl EmotionOracle for Fixed {
///     fn categories(&self) -> &CategorySet {
///         &self.0
///     }
///
///     fn classify(&self, _text: &str) -> Result<Vec<f32>, ClassifierError> {
///         Ok(vec![0.0, 1.0])
///     }
/// }
///
/// let oracle = Fixed(CategorySet::new(["sadness", "joy"]).unwrap());
/// assert_eq!(oracle.classify("hi").unwrap().len(), oracle.categories().len());
/// ```
pub trait EmotionOracle: Send + Sync {
    /// The fixed category set, in the order `classify` reports scores.
    fn categories(&self) -> &CategorySet;

    /// Scores `text`, which the caller has already validated and trimmed.
    fn classify(&self, text: &str) -> Result<Vec<f32>, ClassifierError>;
}
