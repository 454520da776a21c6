//! Backend entry-point: loads settings, applies migrations, and runs the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::config::{AppSettings, SecretPolicy};
use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{RunningServer, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|err| color_eyre::eyre::eyre!("failed to load configuration: {err}"))?
        .resolve(SecretPolicy::for_build())
        .wrap_err("invalid configuration")?;
    if settings.uses_development_secret {
        warn!("DOCKET_JWT_SECRET is unset; signing tokens with the development secret");
    }

    let bind_addr = settings.bind_addr;
    let config = match settings.database_url.clone() {
        Some(url) => {
            run_pending_migrations(&url)
                .await
                .wrap_err("failed to apply database migrations")?;
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .wrap_err("failed to connect to the database")?;
            ServerConfig::new(settings).with_db_pool(pool)
        }
        None => ServerConfig::new(settings),
    };

    let health_state = web::Data::new(HealthState::new());
    let RunningServer { server, scheduler } =
        create_server(health_state.clone(), config).wrap_err("failed to start server")?;
    info!(%bind_addr, "listening");

    let outcome = server.await;
    health_state.mark_unhealthy();
    scheduler.shutdown().await;
    outcome.wrap_err("server terminated with an error")
}
