use std::net::{IpAddr, SocketAddr};

use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopfront::{
    app::build_app,
    config::AppConfig,
    db::{create_pool, run_migrations},
    middleware::session::create_session_layer,
    services::product_service::spawn_reservation_sweeper,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shopfront=debug,tower_sessions=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    let store = PostgresStore::new(pool.clone());
    store.migrate().await?;
    let session_layer = create_session_layer(store, &config);

    let _sweeper = spawn_reservation_sweeper(pool.clone(), config.reservation_sweep_every);

    let addr = SocketAddr::from((config.host.parse::<IpAddr>()?, config.port));
    let app = build_app(AppState::new(pool, config), session_layer);

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
