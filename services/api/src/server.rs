use crate::cli::ServeArgs;
use crate::infra::{seed_demo_data, AppState, CoreServices};
use crate::routes::with_core_routes;
use axum::{middleware, Extension, ServiceExt};
use axum_prometheus::PrometheusMetricLayer;
use casora::auth::{authenticate, SessionProvider, StaticSessions};
use casora::config::AppConfig;
use casora::error::{AppError, DomainError};
use casora::store::memory::MemoryStore;
use casora::telemetry;
use casora::tenancy::{
    route_request, DomainRegistry, HostResolver, RoutingState, StaticDomainRegistry,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::Layer;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(config.environment, &config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryStore::new());
    if args.seed_demo {
        seed_demo_data(&store).await.map_err(DomainError::from)?;
    }
    let core = CoreServices::in_memory(store, config.portal);

    let sessions: Arc<dyn SessionProvider> =
        Arc::new(StaticSessions::from_grants(&config.auth.sessions));
    let registry: Arc<dyn DomainRegistry> = Arc::new(StaticDomainRegistry::new(
        config.tenancy.custom_domains.clone(),
    ));
    let routing = RoutingState::new(HostResolver::new(&config.tenancy), registry);

    let router = with_core_routes(&core)
        .layer(middleware::from_fn_with_state(sessions, authenticate))
        .layer(Extension(app_state))
        .layer(prometheus_layer);
    // Host routing rewrites the path, so it has to run before the router matches.
    let app = middleware::from_fn_with_state(routing, route_request).layer(router);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        root_domain = %config.tenancy.root_domain,
        "casora api ready"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
