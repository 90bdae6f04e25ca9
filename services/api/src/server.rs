use crate::cli::ServeArgs;
use crate::infra::{load_catalog, AppState, InMemoryLearnerRepository};
use crate::routes::with_registration_routes;
use academy_enrollment::config::AppConfig;
use academy_enrollment::error::AppError;
use academy_enrollment::telemetry;
use academy_enrollment::workflows::registration::intake::RegistrationService;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
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

    let catalog = Arc::new(load_catalog(config.reference_data.as_deref())?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        catalog: catalog.clone(),
    };

    let repository = Arc::new(InMemoryLearnerRepository::default());
    let registration_service = Arc::new(RegistrationService::new(repository, catalog));

    let app = with_registration_routes(registration_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "learner registration service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
