//! # BlueCarbon HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Registry statistics
//! - `GET /projects` - Project explorer (query/status/type filters)
//! - `GET /projects/{id}` - One project
//! - `GET /reviews` - Projects awaiting verifier review
//! - `POST /projects/{id}/review` - Approve or reject (wallet required)
//! - `POST /projects/{id}/issue` - Issue and list credits (wallet required)
//! - `GET /listings` - Active credit listings
//! - `POST /purchase` - Buy credits (wallet required)
//! - `POST /retire` - Retire credits for a certificate (wallet required)
//! - `GET /balance` - Caller's holdings and history (wallet required)
//! - `GET /metadata/{cid}` - Stored project metadata document
//! - `POST /wizard` - Start a registration wizard
//! - `GET /wizard/{id}` - Wizard state
//! - `PATCH /wizard/{id}/draft` - Edit draft fields
//! - `POST /wizard/{id}/files` - Add files (base64 payloads)
//! - `POST /wizard/{id}/upload` - Upload pending files
//! - `POST /wizard/{id}/advance` - Next step (409 when uploads gate it)
//! - `POST /wizard/{id}/retreat` - Previous step
//! - `POST /wizard/{id}/submit` - Submit (wallet required)
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `BLUECARBON_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `BLUECARBON_RATE_LIMIT`: Requests per second per caller (default: 100, 0 to disable)
//! - `BLUECARBON_API_KEY`: If set, non-public endpoints require Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;
mod wallet;

// Re-exports for external use
pub use auth::get_api_key_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use wallet::WALLET_HEADER;
// Re-export handlers and types for integration tests (via `bluecarbon::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    balance_handler, health_handler, issue_handler, listings_handler, metadata_handler,
    pending_reviews_handler, project_handler, projects_handler, purchase_handler, retire_handler,
    review_handler, status_handler, wizard_advance_handler, wizard_create_handler,
    wizard_draft_handler, wizard_files_handler, wizard_get_handler, wizard_retreat_handler,
    wizard_submit_handler, wizard_upload_handler,
};
#[allow(unused_imports)]
pub use types::{
    AddFilesRequest, AddFilesResponse, BalanceResponse, DraftPatch, ErrorResponse,
    FilePayloadJson, HealthResponse, IssueRequest, ListingsResponse, MAX_FILE_SIZE, ProjectJson,
    ProjectListResponse, PurchaseRequest, PurchaseResponse, RetireRequest, RetireResponse,
    ReviewRequest, StatusResponse, StepResponse, WizardCreated, WizardSnapshot,
};

use crate::orchestrator::WizardSession;
use crate::transport::Gateways;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use bluecarbon_core::{MarketError, Registry};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::sync::{Mutex, RwLock};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the registry, live wizard sessions, and the
/// gateway transports.
///
/// Each wizard session carries its own lock so a slow upload or
/// submission on one wizard never stalls requests against another; the
/// outer map lock is only held long enough to look a session up.
#[derive(Clone)]
pub struct AppState {
    /// The project registry and marketplace books.
    pub registry: Arc<RwLock<Registry>>,
    /// Live registration wizards keyed by id.
    pub wizards: Arc<RwLock<BTreeMap<u64, Arc<Mutex<WizardSession>>>>>,
    /// Next wizard id.
    pub next_wizard: Arc<AtomicU64>,
    /// Injected external transports.
    pub gateways: Gateways,
}

impl AppState {
    /// Create new app state around a registry and a gateway set.
    #[must_use]
    pub fn new(registry: Registry, gateways: Gateways) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
            wizards: Arc::new(RwLock::new(BTreeMap::new())),
            next_wizard: Arc::new(AtomicU64::new(1)),
            gateways,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `BLUECARBON_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
///
/// # Security Note
///
/// The default is restrictive (localhost only). Set
/// `BLUECARBON_CORS_ORIGINS=*` explicitly only for development or if you
/// understand the security implications.
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("BLUECARBON_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            // Explicit wildcard - warn about security implications
            tracing::warn!(
                "CORS: Allowing ALL origins (BLUECARBON_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            // Parse comma-separated origins
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in BLUECARBON_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                    .allow_headers(cors_headers())
            }
        }
        None => {
            // No configuration - default to localhost only (restrictive)
            tracing::info!("CORS: No BLUECARBON_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn cors_headers() -> [header::HeaderName; 3] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        header::HeaderName::from_static(wallet::WALLET_HEADER),
    ]
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(cors_headers())
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit - caps request size
/// 4. Rate Limiting - protects against DoS (if enabled)
/// 5. Authentication - validates API key (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Check if authentication is enabled
    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "⚠️  API key authentication DISABLED - all endpoints are publicly accessible! \
             Set BLUECARBON_API_KEY environment variable to enable authentication."
        );
    }

    // Build base router with routes
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/projects", get(handlers::projects_handler))
        .route("/projects/{id}", get(handlers::project_handler))
        .route("/reviews", get(handlers::pending_reviews_handler))
        .route("/projects/{id}/review", post(handlers::review_handler))
        .route("/projects/{id}/issue", post(handlers::issue_handler))
        .route("/listings", get(handlers::listings_handler))
        .route("/purchase", post(handlers::purchase_handler))
        .route("/retire", post(handlers::retire_handler))
        .route("/balance", get(handlers::balance_handler))
        .route("/metadata/{cid}", get(handlers::metadata_handler))
        .route("/wizard", post(handlers::wizard_create_handler))
        .route("/wizard/{id}", get(handlers::wizard_get_handler))
        .route("/wizard/{id}/draft", patch(handlers::wizard_draft_handler))
        .route("/wizard/{id}/files", post(handlers::wizard_files_handler))
        .route("/wizard/{id}/upload", post(handlers::wizard_upload_handler))
        .route(
            "/wizard/{id}/advance",
            post(handlers::wizard_advance_handler),
        )
        .route(
            "/wizard/{id}/retreat",
            post(handlers::wizard_retreat_handler),
        )
        .route("/wizard/{id}/submit", post(handlers::wizard_submit_handler));

    // Apply authentication middleware (innermost - runs last on request)
    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply tracing, CORS, and the body limit (outermost layers).
    // Body limit leaves headroom over MAX_FILE_SIZE for base64 framing.
    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::extract::DefaultBodyLimit::max(16 * 1024 * 1024)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    registry: Registry,
    gateways: Gateways,
) -> Result<(), MarketError> {
    let state = AppState::new(registry, gateways);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MarketError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("BlueCarbon HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| MarketError::IoError(format!("Server error: {}", e)))
}
