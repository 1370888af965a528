//! Axum router construction for the Goldtap API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin game-client access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the Goldtap server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /api/user/:id` -- ledger view
/// - `POST /api/register` -- idempotent registration
/// - `POST /api/tap` -- resolve one tap
/// - `POST /api/upgrade` -- purchase a level
/// - `POST /api/recover-energy` -- recover energy
/// - `POST /api/passive-income` -- collect income
/// - `POST /api/boost/activate` -- activate the mega boost
/// - `GET /api/boost/:id` -- boost status
/// - `GET /api/referrals/:id` -- referral totals
/// - `GET /api/upgrade-prices/:id` -- next price per track
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // REST API
        .route("/api/user/{id}", get(handlers::get_user))
        .route("/api/register", post(handlers::register))
        .route("/api/tap", post(handlers::do_tap))
        .route("/api/upgrade", post(handlers::do_upgrade))
        .route("/api/recover-energy", post(handlers::recover_energy))
        .route("/api/passive-income", post(handlers::passive_income))
        .route("/api/boost/activate", post(handlers::activate_boost))
        .route("/api/boost/{id}", get(handlers::boost_status))
        .route("/api/referrals/{id}", get(handlers::referral_stats))
        .route("/api/upgrade-prices/{id}", get(handlers::upgrade_prices))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
