use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use almanac_core::domain::fortune::HistoryRecord;
use almanac_core::picker::remote::HttpDayFortuneProvider;
use almanac_core::picker::DayFortuneProvider;
use almanac_core::storage::history::HistoryStore;
use almanac_core::storage::kv::PgKvStore;

#[derive(Debug, Parser)]
#[command(name = "almanac_worker")]
struct Args {
    /// Day to record (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    date: Option<String>,

    /// Do everything except writing to the database.
    #[arg(long)]
    dry_run: bool,
}

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

    let args = Args::parse();

    let date = resolve_date(args.date.as_deref())?;
    let profile = settings.birth_profile()?;

    let provider = HttpDayFortuneProvider::from_settings(&settings)?;
    let fortune = match provider.day_fortune(&profile, date).await {
        Ok(fortune) => fortune,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%date, error = %err, "daily fortune fetch failed");
            return Err(err);
        }
    };

    if args.dry_run {
        tracing::info!(
            %date,
            total_score = fortune.total_score,
            dry_run = true,
            "daily fortune fetched (dry-run)"
        );
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    almanac_core::storage::migrate(&pool).await?;

    let store = HistoryStore::new(Arc::new(PgKvStore::new(pool)));
    let record = HistoryRecord {
        date,
        timestamp: chrono::Utc::now().timestamp_millis(),
        fortune,
    };
    store.append(record).await;

    tracing::info!(%date, "recorded daily fortune snapshot");
    Ok(())
}

fn resolve_date(date_arg: Option<&str>) -> anyhow::Result<chrono::NaiveDate> {
    if let Some(s) = date_arg {
        return Ok(chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")?);
    }
    Ok(chrono::Utc::now().date_naive())
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
