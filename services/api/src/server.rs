use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAccountStore, InMemoryPortfolioRepository, InspectionSources,
};
use crate::routes::with_open_home_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use open_home::config::AppConfig;
use open_home::error::AppError;
use open_home::telemetry;
use open_home::workflows::accounts::AccountService;
use open_home::workflows::portfolio::PortfolioService;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let sources = InspectionSources::from_config(&config.inspections);
    let data_source = sources.data_source();

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        sources: Arc::new(sources),
        accounts: Arc::new(AccountService::new(
            Arc::new(InMemoryAccountStore::default()),
            config.sessions.policy(),
        )),
        portfolio: Arc::new(PortfolioService::new(Arc::new(
            InMemoryPortfolioRepository::default(),
        ))),
    };

    let app = with_open_home_routes(&app_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, data_source, "open home planner ready");

    axum::serve(listener, app).await?;
    Ok(())
}
