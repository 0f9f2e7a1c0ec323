//! Dispatchboard - a delivery tracking dashboard backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatchboard::{
    api::{self, AppState, RequestStats},
    config::Config,
    db::{
        self,
        repositories::{SqlxEntryRepository, SqlxSessionRepository, SqlxUserRepository},
    },
    services::{AuthService, EntryService, HttpIdentityProvider},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dispatchboard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Dispatchboard...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let entry_repo = SqlxEntryRepository::boxed(pool.clone());

    // Identity provider client with a bounded exchange timeout
    let provider = Arc::new(HttpIdentityProvider::new(
        config.auth.provider_url.clone(),
        Duration::from_secs(config.auth.provider_timeout_secs),
    )?);

    // Initialize services
    let auth_service = Arc::new(AuthService::with_config(
        user_repo.clone(),
        session_repo,
        provider,
        config.auth.session_ttl_days,
        config.auth.admin_emails.clone(),
    ));
    let entry_service = Arc::new(EntryService::new(entry_repo));

    // Build application state
    let state = AppState {
        auth_service: auth_service.clone(),
        entry_service,
        user_repo,
        request_stats: Arc::new(RequestStats::new()),
    };

    // Start expired-session sweep task
    {
        let auth = auth_service.clone();
        let interval_secs = config.auth.sweep_interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                match auth.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(count) => tracing::info!("Swept {} expired session(s)", count),
                    Err(e) => tracing::warn!("Session sweep failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
