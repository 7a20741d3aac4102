use emotion_classifier::{
    init_logger, AnalysisContext, AppState, BuiltinModel, Classifier, ClassifierBuilder, ModelManager,
    RuntimeConfig, ServerConfig,
};
use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP service that classifies the emotional tone of text", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, env = "EMOTION_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(short, long, env = "EMOTION_PORT", default_value_t = 8000)]
    port: u16,

    /// ONNX model file; replaces the built-in model
    #[arg(long, env = "EMOTION_MODEL_PATH", requires = "tokenizer_path")]
    model_path: Option<String>,

    /// tokenizer.json matching --model-path
    #[arg(long, env = "EMOTION_TOKENIZER_PATH", requires = "model_path")]
    tokenizer_path: Option<String>,

    /// Model config.json whose id2label defines the categories
    #[arg(long, env = "EMOTION_LABEL_CONFIG", conflicts_with = "labels")]
    label_config: Option<PathBuf>,

    /// Comma-separated categories in model output order
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,

    /// Truncate inputs to this many tokens
    #[arg(long)]
    max_sequence_length: Option<usize>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    intra_threads: usize,

    /// Force a fresh download of the built-in model files
    #[arg(short, long)]
    fresh: bool,
}

async fn ensure_model_downloaded(manager: &ModelManager, model: BuiltinModel, fresh: bool) -> anyhow::Result<()> {
    let info = model.get_model_info();

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(&info.name)?;
    }

    manager
        .ensure_model_downloaded(&info)
        .await
        .with_context(|| format!("Failed to download model '{}'", info.name))?;
    Ok(())
}

fn build_classifier(args: &Args, manager: &ModelManager) -> anyhow::Result<Classifier> {
    let mut builder = ClassifierBuilder::new()
        .with_runtime_config(RuntimeConfig::with_intra_threads(args.intra_threads));

    if let Some(max_len) = args.max_sequence_length {
        builder = builder.with_max_sequence_length(max_len);
    }
    if !args.labels.is_empty() {
        builder = builder.with_labels(args.labels.clone())?;
    } else if let Some(config) = &args.label_config {
        builder = builder.with_label_config(config)?;
    }

    builder = match (&args.model_path, &args.tokenizer_path) {
        (Some(model_path), Some(tokenizer_path)) => builder.with_custom_model(model_path, tokenizer_path)?,
        _ => builder.with_model_from(manager, BuiltinModel::DistilRobertaEmotion)?,
    };

    Ok(builder.build()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    let args = Args::parse();

    info!("=== Starting Emotion Service ===");

    let manager = ModelManager::new_default().context("Failed to create model cache directory")?;
    if args.model_path.is_none() {
        ensure_model_downloaded(&manager, BuiltinModel::DistilRobertaEmotion, args.fresh).await?;
    } else if args.fresh {
        warn!("--fresh has no effect with --model-path");
    }

    let start_time = Instant::now();
    info!("Loading classifier...");
    let classifier = build_classifier(&args, &manager).context("Classifier failed to start")?;
    let model_info = classifier.info();
    info!("=== Classifier Loaded (took {:.2?}) ===", start_time.elapsed());
    info!("  Model: {}", model_info.model_path);
    info!("  Labels: {:?}", model_info.labels);
    info!("  Max sequence length: {}", model_info.max_sequence_length);

    let state = AppState::new(AnalysisContext::new(Arc::new(classifier)));
    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };

    emotion_classifier::server::serve(&config, state, shutdown_signal()).await?;
    Ok(())
}
