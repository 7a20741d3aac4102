//! HTTP surface: a health check and the analysis endpoint.

pub mod error;
pub mod handlers;

use std::future::Future;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use crate::analysis::AnalysisContext;

/// Status string reported by `GET /`.
pub const DEFAULT_STATUS_MESSAGE: &str = "Emotion service running ✅";

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub analysis: AnalysisContext,
    pub status_message: &'static str,
}

impl AppState {
    pub fn new(analysis: AnalysisContext) -> Self {
        Self {
            analysis,
            status_message: DEFAULT_STATUS_MESSAGE,
        }
    }
}

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/emotion/analyze", post(handlers::analyze_emotion))
        .with_state(state)
}

/// Binds `config` and serves until `shutdown` resolves.
pub async fn serve<F>(config: &ServerConfig, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    // Host names such as `localhost` are resolved here
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    log::info!("Emotion service listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    log::info!("Emotion service stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CategorySet, ClassifierError, EmotionOracle};
    use std::sync::Arc;

    struct Silent(CategorySet);

    impl EmotionOracle for Silent {
        fn categories(&self) -> &CategorySet {
            &self.0
        }

        fn classify(&self, _text: &str) -> Result<Vec<f32>, ClassifierError> {
            Ok(vec![0.0; self.0.len()])
        }
    }

    fn state() -> AppState {
        AppState::new(AnalysisContext::new(Arc::new(Silent(CategorySet::new(["joy", "sadness"]).unwrap()))))
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
    }

    #[tokio::test]
    async fn test_serve_resolves_host_names() {
        for host in ["localhost", "127.0.0.1"] {
            let config = ServerConfig {
                host: host.to_string(),
                port: 0,
            };
            serve(&config, state(), async {}).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_serve_rejects_unresolvable_host() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            port: 0,
        };
        assert!(serve(&config, state(), async {}).await.is_err());
    }
}
