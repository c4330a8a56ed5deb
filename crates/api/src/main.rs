use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::app::build_router;
use api::config::Config;
use api::services::accounts::RegisterInput;
use api::state::AppState;
use infra::{PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Some(Duration::from_secs(600))) // 10 minutes
        .max_lifetime(Some(Duration::from_secs(1800))) // 30 minutes
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        "Connected to Postgres with max {} connections",
        config.database.max_connections
    );

    if config.database.skip_migrations {
        tracing::info!("Skipping database migrations (SKIP_MIGRATIONS=true)");
    } else {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::info!("Database migrations completed successfully");
    }

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let state = AppState::new(store, config.auth.clone());

    if let Some(admin) = &config.bootstrap_admin {
        let user = state
            .accounts()
            .ensure_admin(RegisterInput {
                full_name: Some(admin.full_name.clone()),
                email: Some(admin.email.clone()),
                password: Some(admin.password.clone()),
            })
            .await?;
        tracing::info!(user_id = %user.id, "Administrator account ready");
    }

    let app = build_router(state, &config.http);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    // Peer addresses feed the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
