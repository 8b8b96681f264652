//! HTTP API server for the Nova classifier

pub mod command;
pub mod health;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::assistant::Classifier;
use crate::config::{DEFAULT_PORT, DEFAULT_WAKE_WORD};
use crate::db::CommandLogRepo;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub classifier: Classifier,
    /// Command log; commands are not logged when absent
    pub command_log: Option<CommandLogRepo>,
    pub wake_word: String,
    pub locale: String,
    /// Whether cloud transcription and synthesis are configured
    pub cloud_speech: bool,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    port: u16,
    classifier: Classifier,
    command_log: Option<CommandLogRepo>,
    wake_word: String,
    locale: String,
    cloud_speech: bool,
    static_dir: Option<PathBuf>,
}

impl Default for ApiServerBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            port,
            classifier: Classifier::default(),
            command_log: None,
            wake_word: DEFAULT_WAKE_WORD.to_string(),
            locale: "en-US".to_string(),
            cloud_speech: false,
            static_dir: None,
        }
    }

    /// Set the classifier
    #[must_use]
    pub const fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Log every classified command
    #[must_use]
    pub fn command_log(mut self, repo: CommandLogRepo) -> Self {
        self.command_log = Some(repo);
        self
    }

    /// Set voice details reported by the capabilities endpoint
    #[must_use]
    pub fn voice_config(mut self, config: &crate::config::VoiceConfig, cloud_speech: bool) -> Self {
        self.wake_word.clone_from(&config.wake_word);
        self.locale.clone_from(&config.locale);
        self.cloud_speech = cloud_speech;
        self
    }

    /// Set the static files directory for serving a web front end
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let state = Arc::new(ApiState {
            classifier: self.classifier,
            command_log: self.command_log,
            wake_word: self.wake_word,
            locale: self.locale,
            cloud_speech: self.cloud_speech,
        });

        ApiServer {
            state,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(command::router(self.state.clone()))
            .nest("/api/voice", voice::router(self.state.clone()))
            .merge(health::router());

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        router.layer(cors()).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// CORS for browser front ends on any origin
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

/// API errors, rendered as `{ "error": message }`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    NotConfigured(&'static str),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<crate::Error> for ApiError {
    fn from(e: crate::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
