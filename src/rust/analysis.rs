//! Request pipeline: validate, classify, normalize, shape the response.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::classifier::{normalize, CategorySet, ProbabilityDistribution};
use crate::oracle::EmotionOracle;

/// Message returned for empty or whitespace-only input.
pub const TEXT_REQUIRED: &str = "Text is required";

/// Body of `POST /api/emotion/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionRequest {
    pub text: String,
}

/// The predicted emotion and the probability of every category.
///
/// `label` is always a key of `scores` holding its maximum value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionResult {
    pub label: String,
    pub scores: ProbabilityDistribution,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The request text is unusable. Maps to a client error.
    #[error("{0}")]
    Validation(String),
    /// The model call failed or produced unusable output. Maps to a server error.
    #[error("Emotion analysis failed: {0}")]
    Oracle(String),
}

/// Trims `raw_text`, rejecting it when nothing is left.
///
/// ```
/// use emotion_classifier::analysis::validate;
///
/// assert_eq!(validate("  hello\n").unwrap(), "hello");
/// assert!(validate(" \t\n").is_err());
/// ```
pub fn validate(raw_text: &str) -> Result<&str, AnalysisError> {
    let text = raw_text.trim();
    if text.is_empty() {
        return Err(AnalysisError::Validation(TEXT_REQUIRED.to_string()));
    }
    Ok(text)
}

pub fn build_response(label: String, scores: ProbabilityDistribution) -> EmotionResult {
    EmotionResult { label, scores }
}

/// The process-wide, read-only state every request runs against.
///
/// Cloning is cheap; clones share the same oracle.
#[derive(Clone)]
pub struct AnalysisContext {
    oracle: Arc<dyn EmotionOracle>,
}

impl std::fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("categories", self.oracle.categories())
            .finish()
    }
}

impl AnalysisContext {
    pub fn new(oracle: Arc<dyn EmotionOracle>) -> Self {
        Self { oracle }
    }

    pub fn categories(&self) -> &CategorySet {
        self.oracle.categories()
    }

    /// Runs the full pipeline for one request.
    ///
    /// Validation failures return before the oracle is touched. The oracle is
    /// invoked exactly once; errors, panics and malformed output all surface
    /// as [`AnalysisError::Oracle`]. No partial result is ever returned.
    pub fn analyze(&self, raw_text: &str) -> Result<EmotionResult, AnalysisError> {
        let text = validate(raw_text)?;

        let raw = panic::catch_unwind(AssertUnwindSafe(|| self.oracle.classify(text)))
            .map_err(|payload| AnalysisError::Oracle(panic_message(payload.as_ref())))?
            .map_err(|e| AnalysisError::Oracle(e.to_string()))?;

        let normalized = normalize(&raw, self.oracle.categories()).map_err(|e| {
            log::warn!("Discarding malformed model output: {}", e);
            AnalysisError::Oracle(e.to_string())
        })?;

        log::debug!("Classified {} chars as {}", text.chars().count(), normalized.label);
        Ok(build_response(normalized.label, normalized.distribution))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("model panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("model panicked: {}", msg)
    } else {
        "model panicked".to_string()
    }
}
