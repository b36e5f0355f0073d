//! Civic Eye API /v1: REST endpoints
//!
//! Public routes accept submissions and answer tracking lookups. Every other
//! route resolves a bearer token to an [`Authority`](civic_core::Authority)
//! and goes through region-scoped access control in the service layer.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod views;

use auth::{CredentialService, StaticCredentials};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use civic_core::CivicError;
use civic_service::{Classifier, HttpClassifier, ReportService};
use civic_store::{
    seed_authorities, AuthorityStore, FsArtifactStore, MemoryStore, SeedFile, MAX_IMAGE_BYTES,
};
use config::ApiConfig;
use error::{ApiError, StartupError};
use metrics::ApiMetrics;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for the form fields around a maximum-size image
const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
    pub authorities: Arc<dyn AuthorityStore>,
    pub credentials: Arc<dyn CredentialService>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    /// Record the error in metrics and turn it into a response
    pub fn reject(&self, err: CivicError) -> ApiError {
        self.metrics.observe(&err);
        ApiError(err)
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/reports",
            post(handlers::submit_report).get(handlers::list_reports),
        )
        .route("/v1/reports/{id}/resolution", put(handlers::update_resolution))
        .route("/v1/reports/{id}/verify", post(handlers::verify_report))
        .route("/v1/track/{tracking_code}", get(handlers::track_report))
        .route("/v1/auth/me", get(handlers::me))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire stores, classifier and credentials from configuration, seeding
/// authorities first when a seed file is configured.
pub async fn build_state(config: &ApiConfig) -> Result<AppState, StartupError> {
    let store = Arc::new(MemoryStore::new());
    let artifacts = Arc::new(FsArtifactStore::open(&config.upload_dir).await?);

    let mut credentials = StaticCredentials::new();
    if let Some(path) = &config.seed_file {
        let seed = SeedFile::load(path).await?;
        seed_authorities(store.as_ref(), &seed.authorities).await?;
        credentials = seed.tokens().collect();
        tracing::info!(path = %path.display(), tokens = credentials.len(), "seed file applied");
    }

    let classifier = match &config.classifier_url {
        Some(url) => {
            let client = HttpClassifier::new(url, config.classifier_timeout)?;
            tracing::info!(analyze_url = client.analyze_url(), "classifier configured");
            Some(Arc::new(client) as Arc<dyn Classifier>)
        }
        None => {
            tracing::warn!("no classifier configured; new reports will be UNAVAILABLE");
            None
        }
    };

    let service = ReportService::new(store.clone(), artifacts, classifier)
        .with_classifier_timeout(config.classifier_timeout);

    Ok(AppState {
        service: Arc::new(service),
        authorities: store,
        credentials: Arc::new(credentials),
        metrics: Arc::new(ApiMetrics::new()?),
    })
}

pub async fn run(config: ApiConfig) -> Result<(), StartupError> {
    let state = build_state(&config).await?;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    tracing::info!(addr = %config.addr, "Civic Eye API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
