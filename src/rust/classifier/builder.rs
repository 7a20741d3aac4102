use std::path::Path;
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use ort::session::Session;
use log::{info, error};

use super::error::ClassifierError;
use super::inference::SequenceClassification;
use super::classifier::Classifier;
use super::labels::CategorySet;
use crate::{BuiltinModel, ModelManager, runtime::{RuntimeConfig, create_session_builder}};

/// Sequence limit used when neither the model nor the caller provides one.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 256;

const WARMUP_TEXT: &str = "Warm-up input used to check the classification head";

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    categories: Option<CategorySet>,
    max_sequence_length: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl SequenceClassification for ClassifierBuilder {
    /// Returns a reference to the tokenizer if it exists
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    /// Returns a reference to the ONNX session if it exists
    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use emotion_classifier::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before the model is loaded to take effect.
    ///
    /// # Example
    /// ```
    /// use emotion_classifier::{ClassifierBuilder, RuntimeConfig};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::with_intra_threads(2));
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides the number of tokens fed to the model; longer inputs are truncated.
    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = Some(max_sequence_length);
        self
    }

    /// Loads a built-in model from the default model cache.
    ///
    /// Labels come from the cached `config.json`, falling back to the model's
    /// known label order.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The model paths are already set
    ///   - The model is not downloaded
    ///   - The model or tokenizer failed to load
    ///   - The model structure is invalid
    ///
    /// # Example
    /// ```no_run
    /// use emotion_classifier::{ClassifierBuilder, BuiltinModel};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_model(BuiltinModel::DistilRobertaEmotion);
    /// ```
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        let manager = ModelManager::new_default()
            .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;
        self.with_model_from(&manager, model)
    }

    /// Loads a built-in model from the cache managed by `manager`.
    pub fn with_model_from(mut self, manager: &ModelManager, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths already set".to_string()));
        }

        let model_info = model.get_model_info();
        if !manager.is_model_downloaded(&model_info.name) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let model_path = manager.get_model_path(&model_info.name);
        let tokenizer_path = manager.get_tokenizer_path(&model_info.name);
        let config_path = manager.get_config_path(&model_info.name);

        self.load(&model_path, &tokenizer_path)?;

        if self.categories.is_none() {
            let categories = if config_path.exists() {
                CategorySet::from_config_file(&config_path)?
            } else {
                CategorySet::new(model.default_labels().iter().copied())?
            };
            self.categories = Some(categories);
        }
        if self.max_sequence_length.is_none() {
            self.max_sequence_length = Some(model.characteristics().max_sequence_length);
        }

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        Ok(self)
    }

    /// Sets a custom model and tokenizer path for the classifier.
    ///
    /// Labels must be supplied separately with [`Self::with_labels`] or
    /// [`Self::with_label_config`].
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The model or tokenizer paths are empty
    ///   - The paths are already set
    ///   - The files don't exist
    ///   - The model or tokenizer failed to load
    ///   - The model structure is invalid
    ///
    /// # Example
    /// ```no_run
    /// use emotion_classifier::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_custom_model("path/to/model.onnx", "path/to/tokenizer.json");
    /// ```
    pub fn with_custom_model(mut self, model_path: &str, tokenizer_path: &str) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths already set".to_string()));
        }

        if !Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path)));
        }
        if !Path::new(tokenizer_path).exists() {
            return Err(ClassifierError::BuildError(format!("Tokenizer file not found: {}", tokenizer_path)));
        }

        self.load(Path::new(model_path), Path::new(tokenizer_path))?;

        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        Ok(self)
    }

    /// Sets the category names in model output order.
    ///
    /// # Example
    /// ```
    /// use emotion_classifier::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_labels(vec!["negative", "positive"])
    ///     .unwrap();
    /// ```
    pub fn with_labels<S: Into<String>>(mut self, labels: Vec<S>) -> Result<Self, ClassifierError> {
        self.categories = Some(CategorySet::new(labels)?);
        Ok(self)
    }

    /// Reads the category names from a HuggingFace `config.json` (`id2label`).
    pub fn with_label_config<P: AsRef<Path>>(mut self, config_path: P) -> Result<Self, ClassifierError> {
        self.categories = Some(CategorySet::from_config_file(config_path)?);
        Ok(self)
    }

    fn load(&mut self, model_path: &Path, tokenizer_path: &Path) -> Result<(), ClassifierError> {
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
            })?;
        info!("Tokenizer loaded successfully");

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::BuildError(format!("Failed to load model {:?}: {}", model_path, e)))?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(())
    }

    /// Builds and returns the final Classifier instance
    ///
    /// A warm-up inference runs before returning, so the model is ready for
    /// the first request and its output width is checked against the labels.
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The constructed Classifier if successful, or an error if:
    ///   - No model and tokenizer are loaded
    ///   - No category set was configured (`ConfigurationError`)
    ///   - The model's output width differs from the number of categories (`ConfigurationError`)
    ///   - The warm-up inference fails
    pub fn build(mut self) -> Result<Classifier, ClassifierError> {
        let (Some(model_path), Some(tokenizer_path)) = (self.model_path.take(), self.tokenizer_path.take()) else {
            return Err(ClassifierError::BuildError("Model and tokenizer paths must be set".to_string()));
        };
        let categories = self.categories.take().ok_or_else(|| {
            ClassifierError::ConfigurationError("No category labels configured for the model".to_string())
        })?;
        let max_sequence_length = self.max_sequence_length.unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH);
        if max_sequence_length == 0 {
            return Err(ClassifierError::ConfigurationError("Max sequence length must be positive".to_string()));
        }

        let tokenizer = self.tokenizer.as_mut()
            .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::BuildError(format!("Failed to configure truncation: {}", e)))?;
        // Single sequences never need padding
        tokenizer.with_padding(None);

        let warmup = self.logits(WARMUP_TEXT)?;
        if warmup.len() != categories.len() {
            return Err(ClassifierError::ConfigurationError(format!(
                "Model produces {} scores but {} categories are configured",
                warmup.len(),
                categories.len()
            )));
        }
        info!("Classifier ready with {} categories: {:?}", categories.len(), categories.names());

        let tokenizer = Arc::new(self.tokenizer.take()
            .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?);
        let session = Arc::new(self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?);

        Ok(Classifier {
            model_path,
            tokenizer_path,
            tokenizer,
            session,
            categories,
            max_sequence_length,
        })
    }

    /// Validates that the model has the expected input/output structure
    ///
    /// # Returns
    /// * `Result<(), ClassifierError>` - Ok if validation passes, or an error if:
    ///   - The model doesn't have the required input tensors
    ///   - The model asks for inputs other than input_ids and attention_mask
    ///   - The model doesn't have any output tensors
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        const SUPPORTED_INPUTS: [&str; 2] = ["input_ids", "attention_mask"];

        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(ClassifierError::ModelError(
                format!("Model must have at least 2 inputs (input_ids and attention_mask), found {}", inputs.len())
            ));
        }
        if let Some(input) = inputs.iter().find(|i| !SUPPORTED_INPUTS.contains(&i.name.as_str())) {
            return Err(ClassifierError::ModelError(
                format!("Unsupported model input '{}'", input.name)
            ));
        }

        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(())
    }
}
