use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::ModelInfo;

/// Environment variable overriding the cache root; models live in `<root>/models`.
pub const CACHE_ENV_VAR: &str = "EMOTION_CLASSIFIER_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// One cached artifact of a model.
struct ModelFile<'a> {
    file_type: &'static str,
    url: &'a str,
    path: PathBuf,
    hash: Option<&'a str>,
}

/// Downloads and caches model artifacts (`model.onnx`, `tokenizer.json`, `config.json`).
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("emotion-classifier").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("emotion-classifier").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("emotion-classifier").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("model.onnx")
    }

    pub fn get_tokenizer_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("tokenizer.json")
    }

    pub fn get_config_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("config.json")
    }

    fn files<'a>(&self, info: &'a ModelInfo) -> [ModelFile<'a>; 3] {
        [
            ModelFile {
                file_type: "model",
                url: &info.model_url,
                path: self.get_model_path(&info.name),
                hash: info.model_hash.as_deref(),
            },
            ModelFile {
                file_type: "tokenizer",
                url: &info.tokenizer_url,
                path: self.get_tokenizer_path(&info.name),
                hash: info.tokenizer_hash.as_deref(),
            },
            ModelFile {
                file_type: "config",
                url: &info.config_url,
                path: self.get_config_path(&info.name),
                hash: info.config_hash.as_deref(),
            },
        ]
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        let model_path = self.get_model_path(name);
        let tokenizer_path = self.get_tokenizer_path(name);
        let config_path = self.get_config_path(name);
        log::debug!("Checking if model '{}' is downloaded:", name);
        log::debug!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("  Tokenizer path: {:?} (exists: {})", tokenizer_path, tokenizer_path.exists());
        log::debug!("  Config path: {:?} (exists: {})", config_path, config_path.exists());
        model_path.exists() && tokenizer_path.exists() && config_path.exists()
    }

    /// Downloads every missing or corrupted file of `info`.
    ///
    /// Concurrent calls on clones of the same manager are serialized. On any
    /// failure the partially downloaded model is removed.
    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for file in self.files(info) {
            if let Err(e) = self.ensure_file(&file).await {
                log::error!("Failed to setup {} file: {}", file.file_type, e);
                let _ = self.remove_download(&info.name);
                return Err(e);
            }
        }

        log::info!("Model '{}' ready to use", info.name);
        Ok(())
    }

    async fn ensure_file(&self, file: &ModelFile<'_>) -> Result<(), ModelError> {
        if file.path.exists() {
            log::info!("{} file exists at {:?}, verifying...", file.file_type, file.path);
            if self.verify_file(&file.path, file.hash)? {
                log::info!("Existing {} file verified successfully", file.file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file.file_type);
        } else {
            log::info!("{} file does not exist, downloading...", file.file_type);
        }
        self.download_and_verify_file(file).await
    }

    fn verify_file(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool, ModelError> {
        let Some(expected_hash) = expected_hash else {
            return Ok(path.exists());
        };
        if !path.exists() {
            return Ok(false);
        }
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: calculated {}, expected {}", path, hash, expected_hash);
        Ok(hash == expected_hash)
    }

    /// Returns true when all files exist and match their known digests.
    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        let mut all_ok = true;
        for file in self.files(info) {
            let ok = self.verify_file(&file.path, file.hash)?;
            log::info!("  {} verification: {}", file.file_type, ok);
            all_ok &= ok;
        }
        Ok(all_ok)
    }

    async fn download_and_verify_file(&self, file: &ModelFile<'_>) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file.file_type, file.url, file.path);
        let response = reqwest::get(file.url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = file.hash {
            let hash = sha256_hex(&bytes);
            if hash != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file.file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file.file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        } else {
            log::warn!("No digest known for {} file, skipping verification", file.file_type);
        }

        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write next to the target and rename so a crash never leaves a truncated file behind
        let partial = file.path.with_extension("part");
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, &file.path)?;

        if !self.verify_file(&file.path, file.hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file.file_type);
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        for path in [
            self.get_model_path(name),
            self.get_tokenizer_path(name),
            self.get_config_path(name),
        ] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<(), ModelError> {
        log::info!("Checking if model '{}' is downloaded...", info.name);
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model not found, downloading...");
            self.download_model(info).await?;
        } else if !self.verify_model(info)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(&info.name)?;
            self.download_model(info).await?;
        } else {
            log::info!("Model verification successful");
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
