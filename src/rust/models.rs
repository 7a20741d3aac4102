use serde::{Deserialize, Serialize};

/// Represents the available built-in models in the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// DistilRoBERTa fine-tuned for English emotion recognition
    ///
    /// Characteristics:
    /// - Labels: anger, disgust, fear, joy, neutral, sadness, surprise
    /// - Max sequence length: 256 (truncated beyond that)
    /// - Size: ~330MB
    DistilRobertaEmotion,
}

/// Characteristics of a model including its capabilities and requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Number of categories in the classification head
    pub num_labels: usize,
    /// Maximum number of tokens fed to the model per request
    pub max_sequence_length: usize,
    /// Approximate on-disk size of the model in megabytes
    pub model_size_mb: usize,
}

/// Where to fetch a model's files and how to verify them.
///
/// Digests are optional: when `None` the file is accepted as downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub config_url: String,
    pub model_hash: Option<String>,
    pub tokenizer_hash: Option<String>,
    pub config_hash: Option<String>,
}

const EMOTION_REPO: &str = "https://huggingface.co/j-hartmann/emotion-english-distilroberta-base/resolve/main";

impl BuiltinModel {
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::DistilRobertaEmotion => ModelCharacteristics {
                num_labels: 7,
                max_sequence_length: 256,
                model_size_mb: 330,
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BuiltinModel::DistilRobertaEmotion => ModelInfo {
                name: "emotion-english-distilroberta-base".to_string(),
                model_url: format!("{}/onnx/model.onnx", EMOTION_REPO),
                tokenizer_url: format!("{}/tokenizer.json", EMOTION_REPO),
                config_url: format!("{}/config.json", EMOTION_REPO),
                model_hash: None,
                tokenizer_hash: None,
                config_hash: None,
            },
        }
    }

    /// Category names in model output order, used when no `config.json` is available.
    pub fn default_labels(&self) -> &'static [&'static str] {
        match self {
            BuiltinModel::DistilRobertaEmotion => &[
                "anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_characteristics_match_labels() {
        let model = BuiltinModel::DistilRobertaEmotion;
        let characteristics = model.characteristics();
        assert_eq!(characteristics.num_labels, model.default_labels().len());
        assert_eq!(characteristics.max_sequence_length, 256);
    }

    #[test]
    fn test_builtin_model_info() {
        let info = BuiltinModel::DistilRobertaEmotion.get_model_info();
        assert_eq!(info.name, "emotion-english-distilroberta-base");
        assert!(info.model_url.ends_with("model.onnx"));
        assert!(info.tokenizer_url.ends_with("tokenizer.json"));
        assert!(info.config_url.ends_with("config.json"));
    }
}
