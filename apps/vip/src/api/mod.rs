//! # HTTP API
//!
//! axum server exposing VIP status, point awards and the tier table.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | [`handlers::health_handler`] |
//! | `GET /vip/status` | [`handlers::status_query_handler`] |
//! | `POST /vip/status` | [`handlers::status_handler`] |
//! | `POST /vip/add-points` | [`handlers::add_points_handler`] |
//! | `GET /vip/levels` | [`handlers::levels_handler`] |

pub mod error;
pub mod handlers;
pub mod middleware;

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::AUTHORIZATION, header::CONTENT_TYPE},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use vip_core::VipStore;

use crate::config::ServerConfig;

pub use error::ApiError;
pub use handlers::{AddPointsResponse, MAX_TIER_SENTINEL, StatusResponse};

/// Shared request state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VipStore>,
    pub api_key: Option<Arc<str>>,
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AppState {
    pub fn new(store: Arc<VipStore>, config: &ServerConfig) -> Self {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(Arc::from);
        let limiter = NonZeroU32::new(config.rate_limit)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));

        Self {
            store,
            api_key,
            limiter,
        }
    }

    /// Whether requests to `/vip/*` must carry the API key.
    #[must_use]
    pub fn auth_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Build the router with all routes and layers.
pub fn create_router(state: AppState) -> Router {
    let vip_routes = Router::new()
        .route(
            "/vip/status",
            get(handlers::status_query_handler).post(handlers::status_handler),
        )
        .route("/vip/add-points", post(handlers::add_points_handler))
        .route("/vip/levels", get(handlers::levels_handler))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_api_key));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(handlers::health_handler))
        .merge(vip_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit)),
        )
        .with_state(state)
}

/// Open the store, serve until a shutdown signal, then release the store.
pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(path = %config.db_path.display(), "Opening VIP store...");
    let store = Arc::new(VipStore::open(&config.db_path)?);
    let tiers = store.tiers()?;
    info!(
        path = %store.path().display(),
        tiers = tiers.len(),
        users = store.user_count()?,
        "VIP store ready"
    );

    let state = AppState::new(Arc::clone(&store), &config);
    if state.auth_enabled() {
        info!("API key authentication enabled");
    }
    if state.limiter.is_some() {
        info!(rate = config.rate_limit, "Rate limiting enabled (requests/second)");
    }

    let app = create_router(state);

    let address = config.bind_address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("VIP API running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(store);
    info!("Server shut down, store closed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
