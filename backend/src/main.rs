//! Backend entry-point: loads settings, connects storage and serves the API.

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use pawresq::inbound::http::health::HealthState;
use pawresq::inbound::http::session_config::{BuildMode, session_settings_from_env};
use pawresq::outbound::persistence::{DbPool, run_migrations};
use pawresq::server::{AppSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|err| std::io::Error::other(format!("failed to load settings: {err}")))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    let mut config = ServerConfig::from_session(session, settings.bind_addr()?);

    if let Some(pool_config) = settings.pool_config() {
        if settings.run_migrations {
            run_migrations(pool_config.database_url())
                .await
                .map_err(|err| std::io::Error::other(err.to_string()))?;
        }
        let pool = DbPool::new(pool_config)
            .await
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        info!(max_connections = settings.max_connections(), "database pool ready");
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
