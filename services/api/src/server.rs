use crate::cli::ServeArgs;
use crate::infra::{persistence_config, AppState, PipelineStore};
use crate::routes::with_pipeline_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use talent_pipeline::config::AppConfig;
use talent_pipeline::error::AppError;
use talent_pipeline::telemetry;
use talent_pipeline::workflows::pipeline::PipelineEngine;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    config.persistence = persistence_config(config.persistence, args.state_path.take());

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(PipelineStore::from_config(&config.persistence));
    let state_location = store.describe();
    let engine = PipelineEngine::restore(store)?;
    info!(
        candidates = engine.store().len(),
        state = %state_location,
        "pipeline state restored"
    );
    let pipeline = Arc::new(Mutex::new(engine));

    let app = with_pipeline_routes(pipeline)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "talent pipeline service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
