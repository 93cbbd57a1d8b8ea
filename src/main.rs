use tokio_util::sync::CancellationToken;

use pickjudge::api::router::create_router;
use pickjudge::config::AppConfig;
use pickjudge::services::{follow_up, sweep};
use pickjudge::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database connected, migrations applied");

    if config.xai_api_key.is_none() {
        tracing::warn!("XAI_API_KEY is not set, sweeps and classification will fail");
    }
    if config.evm_rpc_url.is_none() {
        tracing::warn!("EVM_RPC_URL is not set, ledger builds will fail and be retried");
    }
    if !config.has_backend() {
        tracing::warn!("BACKEND_URL is not set, settlement and claims run in dry-run mode");
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("pickjudge/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let state = AppState {
        db: pool,
        config,
        http,
        metrics_handle: metrics::init_metrics(),
    };

    let shutdown = CancellationToken::new();

    // --- Follow-up worker: settle, ledger, totals, claims ---
    tokio::spawn(follow_up::run_follow_up_worker(state.clone(), shutdown.child_token()));
    tracing::info!(
        poll_secs = state.config.followup_poll_secs,
        max_attempts = state.config.followup_max_attempts,
        "Follow-up worker spawned"
    );

    // --- Optional in-process sweep ticker (otherwise driven by cron) ---
    if state.config.sweep_interval_secs > 0 {
        let interval = state.config.sweep_interval_secs;
        tokio::spawn(sweep::run_sweep_ticker(state.clone(), interval, shutdown.child_token()));
        tracing::info!(interval_secs = interval, "Sweep ticker spawned");
    } else {
        tracing::info!("Sweep ticker disabled (SWEEP_INTERVAL_SECS=0), waiting for POST /api/sweep");
    }

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown requested");
            server_shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to JSON lines for log shippers.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
