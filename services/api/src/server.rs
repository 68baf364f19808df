use crate::cli::{override_api_base_url, ServeArgs};
use crate::infra::AppState;
use crate::routes::with_kiosk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use gym_checkin::config::AppConfig;
use gym_checkin::error::AppError;
use gym_checkin::telemetry;
use gym_checkin::workflows::checkin::CheckInProcessor;
use gym_checkin::workflows::membership::HttpMembershipApi;
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
    override_api_base_url(&mut config, args.api_base_url.take())?;

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let api = Arc::new(HttpMembershipApi::new(&config.membership_api)?);
    let processor = Arc::new(CheckInProcessor::new(api));

    let app = with_kiosk_routes(processor, config.kiosk)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        membership_api = config.membership_api.base_url(),
        "gym check-in kiosk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
