//! REST API endpoint handlers for the Goldtap server.
//!
//! Every mutating handler runs the same sequence: admit the request
//! through the abuse guards, take the player's mutation lock, load the
//! ledger row, run exactly one economy engine, persist the row, and
//! return the engine's outcome as JSON.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/user/:id` | Ledger view (404 if unregistered) |
//! | `POST` | `/api/register` | Idempotent registration with optional referral |
//! | `POST` | `/api/tap` | Resolve one tap |
//! | `POST` | `/api/upgrade` | Purchase one level on a track |
//! | `POST` | `/api/recover-energy` | Recover a fixed energy step |
//! | `POST` | `/api/passive-income` | Collect accrued passive income |
//! | `POST` | `/api/boost/activate` | Activate the mega boost |
//! | `GET` | `/api/boost/:id` | Boost slot status |
//! | `GET` | `/api/referrals/:id` | Referral totals |
//! | `GET` | `/api/upgrade-prices/:id` | Next price per track |

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Json;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse};
use chrono::{DateTime, Utc};
use goldtap_db::user_store::UserStore;
use goldtap_economy::boost::BoostStatus;
use goldtap_economy::income::IncomeBonus;
use goldtap_economy::tap::TapOutcome;
use goldtap_economy::upgrade::UpgradeOutcome;
use goldtap_economy::{boost, income, referral, tap, tiers, upgrade};
use goldtap_types::{RegisterStatus, UpgradeTrack, UserId, UserLedger};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// The client's IP address, when the transport resolved one.
///
/// Reads the [`ConnectInfo`] extension installed by
/// `into_make_service_with_connect_info`. Router tests driven through
/// `oneshot` carry no connect info and yield `None`, which the abuse
/// guard admits unconditionally.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip()),
        ))
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Payload for `POST /api/register`.
#[derive(Debug, serde::Deserialize)]
pub struct RegisterRequest {
    /// External platform identity of the player.
    pub user_id: i64,
    /// Display name, when the platform supplied one.
    pub username: Option<String>,
    /// The referring player's id, if the player followed an invite.
    pub referrer_id: Option<i64>,
}

/// Payload for the single-user action endpoints (tap, recover-energy,
/// boost activation).
#[derive(Debug, serde::Deserialize)]
pub struct UserActionRequest {
    /// External platform identity of the player.
    pub user_id: i64,
}

/// Payload for `POST /api/upgrade`.
#[derive(Debug, serde::Deserialize)]
pub struct UpgradeRequest {
    /// External platform identity of the player.
    pub user_id: i64,
    /// The track to level up: `multitap`, `profit`, `energy` or `luck`.
    pub track: String,
}

/// Payload for `POST /api/passive-income`.
#[derive(Debug, serde::Deserialize)]
pub struct PassiveIncomeRequest {
    /// External platform identity of the player.
    pub user_id: i64,
    /// Optional client-declared bonus descriptor; clamped server-side.
    pub bonus: Option<IncomeBonus>,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// JSON projection of a ledger row plus its derived stats.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserView {
    /// External platform identity.
    pub user_id: UserId,
    /// Display name, when known.
    pub username: Option<String>,
    /// Coin balance.
    pub coins: i64,
    /// Current energy reserve.
    pub energy: i64,
    /// Energy capacity.
    pub max_energy: i64,
    /// Multitap track level.
    pub multitap_level: u32,
    /// Profit track level.
    pub profit_level: u32,
    /// Energy track level.
    pub energy_level: u32,
    /// Luck track level.
    pub luck_level: u32,
    /// Coins per tap at the current multitap level.
    pub profit_per_tap: i64,
    /// Passive hourly rate at the current profit level.
    pub profit_per_hour: i64,
    /// Boost slot status at the time of the request.
    pub boost: BoostStatus,
    /// Number of credited invitees.
    pub referral_count: u32,
    /// Total coins earned from referral bonuses.
    pub referral_earnings: i64,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl UserView {
    /// Project a ledger row, evaluating the boost slot against `now`.
    fn from_ledger(ledger: &UserLedger, now: DateTime<Utc>) -> Self {
        let boost = match ledger.active_boost {
            Some(active) if active.is_live(now) => BoostStatus {
                active: true,
                expires_at: Some(active.expires_at),
                remaining_seconds: Some(active.remaining_seconds(now)),
            },
            _ => BoostStatus {
                active: false,
                expires_at: None,
                remaining_seconds: None,
            },
        };
        Self {
            user_id: ledger.user_id,
            username: ledger.username.clone(),
            coins: ledger.coins,
            energy: ledger.energy,
            max_energy: ledger.max_energy,
            multitap_level: ledger.multitap_level,
            profit_level: ledger.profit_level,
            energy_level: ledger.energy_level,
            luck_level: ledger.luck_level,
            profit_per_tap: tiers::coins_per_tap(ledger.multitap_level),
            profit_per_hour: tiers::hourly_rate(ledger.profit_level),
            boost,
            referral_count: ledger.referral_count,
            referral_earnings: ledger.referral_earnings,
            created_at: ledger.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a player's ledger row or fail with 404.
async fn load_user(store: &UserStore<'_>, user_id: UserId) -> Result<UserLedger, ApiError> {
    store
        .get(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id}")))
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
#[allow(clippy::unused_async)] // handler signature
pub async fn index() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Goldtap</title>
    <style>
        body {
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }
        h1 { color: #d4a017; margin-bottom: 0.25rem; }
        .subtitle { color: #8b949e; margin-top: 0; }
        a { color: #58a6ff; text-decoration: none; }
        a:hover { text-decoration: underline; }
        ul { list-style: none; padding: 0; }
        li { padding: 0.3rem 0; }
        .get::before { content: "GET  "; color: #7ee787; font-weight: bold; white-space: pre; }
        .post::before { content: "POST "; color: #d2a8ff; font-weight: bold; white-space: pre; }
        .status { color: #3fb950; font-weight: bold; }
    </style>
</head>
<body>
    <h1>Goldtap</h1>
    <p class="subtitle">Idle-clicker economy service</p>

    <p>Status: <span class="status">RUNNING</span></p>

    <h2>API Endpoints</h2>
    <ul>
        <li class="get">/api/user/:id -- Ledger view</li>
        <li class="post">/api/register -- Register (idempotent)</li>
        <li class="post">/api/tap -- Resolve one tap</li>
        <li class="post">/api/upgrade -- Purchase a level</li>
        <li class="post">/api/recover-energy -- Recover energy</li>
        <li class="post">/api/passive-income -- Collect income</li>
        <li class="post">/api/boost/activate -- Activate the mega boost</li>
        <li class="get">/api/boost/:id -- Boost status</li>
        <li class="get">/api/referrals/:id -- Referral totals</li>
        <li class="get">/api/upgrade-prices/:id -- Next price per track</li>
    </ul>
</body>
</html>"#,
    )
}

// ---------------------------------------------------------------------------
// GET /api/user/:id
// ---------------------------------------------------------------------------

/// Return the ledger view for a player.
///
/// Unregistered ids get a 404; reads never auto-create rows. An
/// expired boost entry observed here is swept and persisted before the
/// view is built.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Path(id): Path<i64>,
) -> Result<Json<UserView>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "user", now).await?;

    let user_id = UserId::new(id);
    let lock = state.user_lock(user_id).await;
    let _guard = lock.lock().await;

    let store = UserStore::new(state.pool());
    let mut ledger = load_user(&store, user_id).await?;

    let had_boost = ledger.active_boost.is_some();
    let live = boost::sweep(&mut ledger, now);
    if had_boost && !live {
        store.update(&ledger).await?;
    }

    Ok(Json(UserView::from_ledger(&ledger, now)))
}

// ---------------------------------------------------------------------------
// POST /api/register
// ---------------------------------------------------------------------------

/// Register a player, creating the ledger row if needed.
///
/// Idempotent: an existing row is returned unchanged with status
/// `exists`. A valid referrer is credited exactly once, atomically
/// with the row creation.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "register", now).await?;

    let user_id = UserId::new(req.user_id);
    let lock = state.user_lock(user_id).await;
    let _guard = lock.lock().await;

    let store = UserStore::new(state.pool());
    let (status, ledger) = store
        .register(user_id, req.username, req.referrer_id.map(UserId::new), now)
        .await?;

    if status != RegisterStatus::Exists {
        tracing::info!(user_id = %user_id, ?status, "User registered");
    }

    Ok(Json(serde_json::json!({
        "status": status,
        "user": UserView::from_ledger(&ledger, now),
    })))
}

// ---------------------------------------------------------------------------
// POST /api/tap
// ---------------------------------------------------------------------------

/// Resolve one tap for a player.
///
/// A client-declared click count is ignored; one request is one tap.
pub async fn do_tap(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Json(req): Json<UserActionRequest>,
) -> Result<Json<TapOutcome>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "tap", now).await?;

    let user_id = UserId::new(req.user_id);
    state.check_tap_limit(user_id, now).await?;

    let lock = state.user_lock(user_id).await;
    let _guard = lock.lock().await;

    let store = UserStore::new(state.pool());
    let mut ledger = load_user(&store, user_id).await?;
    let outcome = tap::resolve_tap(&mut ledger, now, &mut rand::rng())?;
    store.update(&ledger).await?;

    Ok(Json(outcome))
}

// ---------------------------------------------------------------------------
// POST /api/upgrade
// ---------------------------------------------------------------------------

/// Purchase one level on an upgrade track.
pub async fn do_upgrade(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Json(req): Json<UpgradeRequest>,
) -> Result<Json<UpgradeOutcome>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "upgrade", now).await?;

    let track: UpgradeTrack = req
        .track
        .parse()
        .map_err(|e: goldtap_types::UnknownTrack| ApiError::Validation(e.to_string()))?;

    let user_id = UserId::new(req.user_id);
    let lock = state.user_lock(user_id).await;
    let _guard = lock.lock().await;

    let store = UserStore::new(state.pool());
    let mut ledger = load_user(&store, user_id).await?;
    let outcome = upgrade::apply_upgrade(&mut ledger, track)?;
    store.update(&ledger).await?;

    Ok(Json(outcome))
}

// ---------------------------------------------------------------------------
// POST /api/recover-energy
// ---------------------------------------------------------------------------

/// Recover a fixed energy step, clamped to the capacity.
///
/// Idempotent at the cap: repeated calls simply report the full
/// reserve.
pub async fn recover_energy(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Json(req): Json<UserActionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "recover-energy", now).await?;

    let user_id = UserId::new(req.user_id);
    let lock = state.user_lock(user_id).await;
    let _guard = lock.lock().await;

    let store = UserStore::new(state.pool());
    let mut ledger = load_user(&store, user_id).await?;
    let energy = ledger.recover_energy(tiers::ENERGY_RECOVERY_STEP);
    store.update(&ledger).await?;

    Ok(Json(serde_json::json!({
        "user_id": user_id,
        "energy": energy,
        "max_energy": ledger.max_energy,
    })))
}

// ---------------------------------------------------------------------------
// POST /api/passive-income
// ---------------------------------------------------------------------------

/// Collect accrued passive income.
///
/// An unsatisfied accrual gate returns zero income with a 200, not an
/// error.
pub async fn passive_income(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Json(req): Json<PassiveIncomeRequest>,
) -> Result<Json<income::IncomeOutcome>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "passive-income", now).await?;

    let user_id = UserId::new(req.user_id);
    let lock = state.user_lock(user_id).await;
    let _guard = lock.lock().await;

    let store = UserStore::new(state.pool());
    let mut ledger = load_user(&store, user_id).await?;

    let before = ledger.last_passive_income_at;
    let outcome = income::collect(&mut ledger, req.bonus.as_ref(), now);
    if ledger.last_passive_income_at != before {
        store.update(&ledger).await?;
    }

    Ok(Json(outcome))
}

// ---------------------------------------------------------------------------
// POST /api/boost/activate
// ---------------------------------------------------------------------------

/// Activate the mega boost.
///
/// Fails with 409 while one is already live; the live timer is never
/// extended.
pub async fn activate_boost(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Json(req): Json<UserActionRequest>,
) -> Result<Json<BoostStatus>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "boost-activate", now).await?;

    let user_id = UserId::new(req.user_id);
    let lock = state.user_lock(user_id).await;
    let _guard = lock.lock().await;

    let store = UserStore::new(state.pool());
    let mut ledger = load_user(&store, user_id).await?;
    let activated = boost::activate(&mut ledger, now)?;
    store.update(&ledger).await?;

    tracing::info!(user_id = %user_id, expires_at = %activated.expires_at, "Boost activated");

    Ok(Json(BoostStatus {
        active: true,
        expires_at: Some(activated.expires_at),
        remaining_seconds: Some(activated.remaining_seconds(now)),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/boost/:id
// ---------------------------------------------------------------------------

/// Report the boost slot's status, sweeping an expired entry first.
pub async fn boost_status(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Path(id): Path<i64>,
) -> Result<Json<BoostStatus>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "boost-status", now).await?;

    let user_id = UserId::new(id);
    let lock = state.user_lock(user_id).await;
    let _guard = lock.lock().await;

    let store = UserStore::new(state.pool());
    let mut ledger = load_user(&store, user_id).await?;

    let had_boost = ledger.active_boost.is_some();
    let status = boost::status(&mut ledger, now);
    if had_boost && !status.active {
        store.update(&ledger).await?;
    }

    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// GET /api/referrals/:id
// ---------------------------------------------------------------------------

/// Report a player's referral totals.
pub async fn referral_stats(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Path(id): Path<i64>,
) -> Result<Json<referral::ReferralStats>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "referrals", now).await?;

    let store = UserStore::new(state.pool());
    let ledger = load_user(&store, UserId::new(id)).await?;

    Ok(Json(referral::stats(&ledger)))
}

// ---------------------------------------------------------------------------
// GET /api/upgrade-prices/:id
// ---------------------------------------------------------------------------

/// Report the player's current level and next price on every track.
///
/// `next_price` is `null` for a capped track.
pub async fn upgrade_prices(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let now = Utc::now();
    state.check_addr_limit(addr, "upgrade-prices", now).await?;

    let store = UserStore::new(state.pool());
    let ledger = load_user(&store, UserId::new(id)).await?;

    let mut tracks = serde_json::Map::new();
    for track in UpgradeTrack::ALL {
        let level = ledger.level(track);
        tracks.insert(
            track.as_str().to_owned(),
            serde_json::json!({
                "level": level,
                "max_level": tiers::max_level(track),
                "next_price": tiers::next_price(track, level),
            }),
        );
    }

    Ok(Json(serde_json::json!({
        "user_id": ledger.user_id,
        "tracks": tracks,
    })))
}
