use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use almanac_core::calendar::{self, DayCell, MonthStats, ScoreBand};
use almanac_core::domain::fortune::HistoryRecord;
use almanac_core::domain::lifemap::{LifeMapData, LifeMapRequest};
use almanac_core::domain::recommendation::{RecommendReport, RecommendRequest};
use almanac_core::lifemap::LifeMapClient;
use almanac_core::picker::remote::{HttpDayFortuneProvider, HttpRecommendService};
use almanac_core::picker::{CancelToken, DateRecommendationEngine};
use almanac_core::storage::history::{HistoryStats, HistoryStore};
use almanac_core::storage::kv::PgKvStore;
use almanac_core::trends::{self, DimensionTrendPoint, TrendAnalysis, TrendDataPoint};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = almanac_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match almanac_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let history = pool.map(|pool| HistoryStore::new(Arc::new(PgKvStore::new(pool))));

    let engine = match (
        HttpRecommendService::from_settings(&settings),
        HttpDayFortuneProvider::from_settings(&settings),
    ) {
        (Ok(remote), Ok(days)) => Some(Arc::new(DateRecommendationEngine::new(
            Arc::new(remote),
            Arc::new(days),
        ))),
        (remote, days) => {
            for e in [remote.err(), days.err()].into_iter().flatten() {
                tracing::error!(error = %e, "recommendation engine unavailable");
            }
            None
        }
    };

    let lifemap = match LifeMapClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::error!(error = %e, "life map client unavailable");
            None
        }
    };

    let state = AppState {
        history,
        engine,
        lifemap,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/history",
            get(get_history).post(append_history).delete(clear_history),
        )
        .route("/history/stats", get(get_history_stats))
        .route("/trends/recent", get(get_recent_trends))
        .route("/trends/dimensions", get(get_dimension_trends))
        .route("/trends/analysis", get(get_trend_analysis))
        .route("/trends/top", get(get_top_days))
        .route("/calendar/:year/:month", get(get_calendar))
        .route("/date-picker/recommend", post(post_recommend))
        .route("/lifemap/trends", post(post_lifemap_trends))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    history: Option<HistoryStore>,
    engine: Option<Arc<DateRecommendationEngine>>,
    lifemap: Option<Arc<LifeMapClient>>,
}

impl AppState {
    fn history(&self) -> Result<&HistoryStore, StatusCode> {
        self.history.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

#[derive(Debug, Deserialize)]
struct WindowQuery {
    days: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

const DEFAULT_TREND_DAYS: usize = 7;
const DEFAULT_TOP_LIMIT: usize = 3;

async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<HistoryRecord>>, StatusCode> {
    Ok(Json(state.history()?.list().await))
}

async fn append_history(
    State(state): State<AppState>,
    Json(record): Json<HistoryRecord>,
) -> Result<StatusCode, StatusCode> {
    state.history()?.append(record).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_history(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    state.history()?.clear().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_history_stats(
    State(state): State<AppState>,
) -> Result<Json<Option<HistoryStats>>, StatusCode> {
    Ok(Json(state.history()?.stats().await))
}

async fn get_recent_trends(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<TrendDataPoint>>, StatusCode> {
    let records = state.history()?.list().await;
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    Ok(Json(trends::recent_trends(&records, today(), days)))
}

async fn get_dimension_trends(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<DimensionTrendPoint>>, StatusCode> {
    let records = state.history()?.list().await;
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    Ok(Json(trends::dimension_trends(&records, today(), days)))
}

async fn get_trend_analysis(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Option<TrendAnalysis>>, StatusCode> {
    let records = state.history()?.list().await;
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    Ok(Json(trends::analyze_trend(&records, today(), days)))
}

async fn get_top_days(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TrendDataPoint>>, StatusCode> {
    let records = state.history()?.list().await;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    Ok(Json(trends::top_days(&records, today(), limit)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarResponse {
    cells: Vec<DayCell>,
    stats: MonthStats,
    average_band: Option<ScoreBand>,
}

async fn get_calendar(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<CalendarResponse>, StatusCode> {
    let view = NaiveDate::from_ymd_opt(year, month, 1).ok_or(StatusCode::BAD_REQUEST)?;

    let records = state.history()?.list().await;
    let scores: HashMap<NaiveDate, u8> = records
        .iter()
        .map(|record| (record.date, record.fortune.total_score))
        .collect();

    let cells = calendar::build_month(view, today(), |date| scores.get(&date).copied());
    let stats = calendar::month_stats(&cells);
    let average_band = stats.average.map(ScoreBand::for_score);

    Ok(Json(CalendarResponse {
        cells,
        stats,
        average_band,
    }))
}

async fn post_recommend(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<RecommendReport>, StatusCode> {
    let Some(engine) = &state.engine else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let report = engine
        .recommend(&req, today(), &CancelToken::new())
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "date recommendation failed");
            StatusCode::BAD_GATEWAY
        })?;

    Ok(Json(report))
}

async fn post_lifemap_trends(
    State(state): State<AppState>,
    Json(req): Json<LifeMapRequest>,
) -> Result<Json<LifeMapData>, StatusCode> {
    let Some(lifemap) = &state.lifemap else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let data = lifemap.trends(&req).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "life map trends failed");
        StatusCode::BAD_GATEWAY
    })?;

    Ok(Json(data))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &almanac_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
