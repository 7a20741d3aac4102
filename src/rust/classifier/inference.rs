use tokenizers::Tokenizer;
use ort::session::Session;
use ndarray::Array2;
use ort::value::Tensor;
use std::collections::HashMap;

use super::error::ClassifierError;

/// Runs a sequence-classification ONNX model over tokenized text.
///
/// This trait handles the conversion of text into raw class logits through:
/// 1. Tokenization of input text, truncated to the model's sequence limit
/// 2. Building `input_ids` and `attention_mask` tensors
/// 3. Running the ONNX model and extracting the logits row
///
/// The ONNX model is expected to:
/// - Accept `input_ids` and `attention_mask` (both `i64`, shape [batch_size, sequence_length])
/// - Output logits of shape [batch_size, num_labels], named `logits` or as its first output
///
/// Implemented by both the builder (for the warm-up check) and the finished classifier.
pub(crate) trait SequenceClassification {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Counts the tokens the model would see for `text`, special tokens included.
    ///
    /// The tokenizer is configured to truncate, so this never exceeds the
    /// maximum sequence length.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized
    /// - `TokenizerError` if the text cannot be encoded
    fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        tokenizer.encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
            .map(|encoding| encoding.get_ids().len())
    }

    /// Converts text into `(input_ids, attention_mask)` suitable for model input.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized
    /// - `TokenizerError` if the text cannot be encoded or encodes to nothing
    fn tokenize(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>), ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        let encoding = tokenizer.encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let attention_mask: Vec<i64> = encoding.get_attention_mask().iter().map(|&m| i64::from(m)).collect();

        if input_ids.is_empty() {
            return Err(ClassifierError::TokenizerError("Text produced no tokens".into()));
        }

        Ok((input_ids, attention_mask))
    }

    /// Produces the raw logits for `text`, one per label in model output order.
    ///
    /// # Errors
    /// Forwards all errors from `tokenize()` and `run_logits()`
    fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let (input_ids, attention_mask) = self.tokenize(text)?;
        self.run_logits(&input_ids, &attention_mask)
    }

    /// Runs the ONNX model over one encoded sequence.
    ///
    /// # Model Input Format
    /// - input_ids: Token IDs [batch_size=1, sequence_length]
    /// - attention_mask: 1 for real tokens, 0 for padding [batch_size=1, sequence_length]
    ///
    /// # Model Output Format
    /// - Shape: [batch_size=1, num_labels]
    ///
    /// # Errors
    /// - `ModelError` if the session is not initialized
    /// - `ModelError` if tensor creation or model execution fails
    /// - `PredictionError` if the output is missing or has an unexpected shape
    fn run_logits(&self, input_ids: &[i64], attention_mask: &[i64]) -> Result<Vec<f32>, ClassifierError> {
        let session = self.session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;

        let seq_len = input_ids.len();
        let input_array = Array2::from_shape_vec((1, seq_len), input_ids.to_vec())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let mask_array = Array2::from_shape_vec((1, seq_len), attention_mask.to_vec())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask array: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert("input_ids", Tensor::from_array(input_array)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);
        input_tensors.insert("attention_mask", Tensor::from_array(mask_array)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e)))?);

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;

        let logits = match outputs.get("logits") {
            Some(value) => value,
            None if outputs.len() > 0 => &outputs[0],
            None => return Err(ClassifierError::PredictionError("Model produced no outputs".into())),
        };
        let logits = logits.try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to extract logits: {}", e)))?;

        let shape = logits.shape();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(ClassifierError::PredictionError(
                format!("Expected logits of shape [1, num_labels], got {:?}", shape)
            ));
        }

        Ok(logits.iter().copied().collect())
    }
}
