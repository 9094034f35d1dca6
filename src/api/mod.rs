//! HTTP layer exposing the upload pipeline.

pub mod routes;
pub mod types;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, sync::Mutex};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Settings,
    nlp::{mask::AnonMask, model::SentenceClassifier, sentences::RuleSplitter},
    pipeline::PipelineContext,
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: PipelineContext,
    pub default_mask: AnonMask,
    /// Chunk directories are shared, so uploads run one at a time.
    pub gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(settings: Settings, model: Arc<dyn SentenceClassifier>) -> Result<Self> {
        let default_mask = AnonMask::load_or_default(settings.anon_mask_path.as_deref())?;
        Ok(Self {
            pipeline: PipelineContext {
                settings,
                model,
                splitter: Arc::new(RuleSplitter),
            },
            default_mask,
            gate: Arc::new(Mutex::new(())),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.pipeline.settings.max_upload_bytes;
    Router::new()
        .route("/", get(routes::root))
        .route("/upload", post(routes::upload))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

pub async fn serve(state: AppState, host: String, port: u16) -> Result<()> {
    let router = router(state);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "serving note-classifier API");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
