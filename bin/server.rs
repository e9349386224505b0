// Exoplanet Sky - Web Server
// Read-only JSON API over the stored dataset

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use exoplanet_sky::display::{available_records, pick_planet, type_counts, PlanetView};
use exoplanet_sky::{DatasetStore, PlanetType, SkyConfig, SqliteStore};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<DatasetStore<SqliteStore>>>,
}

impl AppState {
    fn lock(&self) -> MutexGuard<'_, DatasetStore<SqliteStore>> {
        // Readers only; a poisoned lock still holds a usable connection
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Stats response
#[derive(Serialize)]
struct StatsResponse {
    total_planets: usize,
    enriched: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetched_at: Option<String>,
    by_type: Vec<TypeStat>,
}

#[derive(Serialize)]
struct TypeStat {
    planet_type: PlanetType,
    label: &'static str,
    count: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/planet/random - One formatted planet
async fn random_planet(State(state): State<AppState>) -> Response {
    let view = {
        let store = state.lock();
        pick_planet(&*store, &mut rand::rng())
    };
    (StatusCode::OK, Json(ApiResponse::ok(view))).into_response()
}

/// GET /api/planets - Every planet, formatted
async fn get_planets(State(state): State<AppState>) -> Response {
    let records = available_records(&*state.lock());
    let response: Vec<PlanetView> = records.iter().map(PlanetView::from_record).collect();

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /api/stats - Counts per planet type
async fn get_stats(State(state): State<AppState>) -> Response {
    let (records, meta) = {
        let store = state.lock();
        (available_records(&*store), store.load_meta())
    };

    let stats = StatsResponse {
        total_planets: records.len(),
        enriched: records.iter().filter(|r| r.has_enrichment()).count(),
        fetched_at: meta.map(|m| m.fetched_at.to_rfc3339()),
        by_type: type_counts(&records)
            .into_iter()
            .map(|(planet_type, count)| TypeStat {
                planet_type,
                label: planet_type.label(),
                count,
            })
            .collect(),
    };

    (StatusCode::OK, Json(ApiResponse::ok(stats))).into_response()
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/planet/random", get(random_planet))
        .route("/planets", get(get_planets))
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("EXOSKY_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))?;

    println!("🌐 Exoplanet Sky - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = SkyConfig::load(None).context("failed to load configuration")?;
    let kv = SqliteStore::open(&config.storage.path)
        .with_context(|| format!("failed to open store at {}", config.storage.path.display()))?;
    info!(path = %config.storage.path.display(), "store opened");

    let state = AppState {
        store: Arc::new(Mutex::new(DatasetStore::new(kv))),
    };

    let addr = std::env::var("EXOSKY_SERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/planet/random", addr);
    println!("\n   Press Ctrl+C to stop\n");

    if let Err(e) = axum::serve(listener, router(state)).await {
        error!(error = %e, "server stopped");
        return Err(e.into());
    }
    Ok(())
}
