use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub session_secure: bool,
    pub session_ttl_hours: i64,
    pub reservation_ttl: Duration,
    pub reservation_sweep_every: Duration,
    pub low_stock_threshold: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        Ok(Self {
            port,
            database_url,
            host,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            session_secure: parse_or("SESSION_SECURE", false),
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24),
            reservation_ttl: Duration::from_secs(parse_or("RESERVATION_TTL_SECS", 120)),
            reservation_sweep_every: Duration::from_secs(parse_or("RESERVATION_SWEEP_SECS", 30)),
            low_stock_threshold: parse_or("LOW_STOCK_THRESHOLD", 5),
        })
    }

    /// Defaults for everything but the database url; used by tests and tools.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            db_max_connections: 5,
            session_secure: false,
            session_ttl_hours: 24,
            reservation_ttl: Duration::from_secs(120),
            reservation_sweep_every: Duration::from_secs(30),
            low_stock_threshold: 5,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
