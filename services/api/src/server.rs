use crate::cli::ServeArgs;
use crate::infra::{build_pipeline, AppState, InMemoryWizardStore};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use quote_intake::config::AppConfig;
use quote_intake::error::AppError;
use quote_intake::intake::IntakeService;
use quote_intake::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pipeline = build_pipeline(&config.dispatch)?;
    let store = Arc::new(InMemoryWizardStore::default());
    let intake_service = Arc::new(IntakeService::new(store, pipeline));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "quote intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
