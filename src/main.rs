use quiz_backend::{
    config::{get_config, init_config, LogFormat},
    database::{pool::create_pool, pool::run_migrations, Stores},
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STALE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let stores = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            run_migrations(&pool).await?;
            info!("Connected to Postgres, migrations applied");
            Stores::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store, data is lost on restart");
            Stores::memory().0
        }
    };

    let app_state = AppState::new(config.clone(), stores);

    if let Some(hours) = config.attempt_ttl_hours {
        let quiz_service = app_state.quiz_service.clone();
        let ttl = chrono::Duration::hours(hours);
        info!(ttl_hours = hours, "Stale attempt expiry enabled");
        tokio::spawn(async move {
            loop {
                if let Err(e) = quiz_service.expire_stale_attempts(ttl).await {
                    tracing::error!(error = ?e, "Stale attempt sweep failed");
                }
                tokio::time::sleep(STALE_SWEEP_INTERVAL).await;
            }
        });
    }

    let app = routes::router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
