use std::net::SocketAddr;

use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use day_planner::planner::PlannerConfig;
use day_planner::routing::{CacheConfig, CachedRouteLookup, RouteClient, RouteClientConfig};
use day_planner::web::{AppState, create_router};

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Log to stdout, filtered by `RUST_LOG` (default `info`).
fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    // Routing service from the environment, OSRM demo server otherwise
    let mut route_config = RouteClientConfig::default();
    if let Ok(url) = std::env::var("ROUTE_SERVICE_URL") {
        route_config.base_url = url;
    }
    if let Ok(profile) = std::env::var("ROUTE_PROFILE") {
        route_config = route_config.with_profile(profile);
    }
    info!(url = %route_config.base_url, profile = %route_config.profile, "using routing service");

    let client = RouteClient::new(route_config)?;
    let lookup = CachedRouteLookup::new(client, &CacheConfig::default());

    let state = AppState::new(lookup, PlannerConfig::default());
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()?;
    info!(%addr, "day planner listening");
    info!("GET  /itinerary         - current day");
    info!("POST /stops             - add a stop");
    info!("DELETE /stops/:id       - remove a stop");
    info!("GET  /render?after=N    - render commands");
    info!("GET  /notices?after=N   - user notices");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
