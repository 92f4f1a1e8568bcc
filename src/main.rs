mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod password;
mod rate_limit;
mod state;

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;
use crate::rate_limit::RateLimiter;
use crate::state::{AppState, OwnerCredentials};

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();

    if let Some(password) = &args.hash_password {
        println!("{}", password::hash_password(password)?);
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "automart_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rate_config = args.rate_limit_config();
    let rate_limiter = Arc::new(RateLimiter::new(rate_config));

    match &args.owner_password_hash {
        Some(hash) => password::validate_hash(hash)
            .context("AUTOMART_OWNER_PASSWORD_HASH is not a valid argon2 PHC string")?,
        None => {
            tracing::warn!("No owner password hash configured - every login will be rejected")
        }
    }

    // creating shared state
    let state = Arc::new(AppState {
        rate_limiter: Arc::clone(&rate_limiter),
        owner: OwnerCredentials {
            username: args.owner_username.clone(),
            password_hash: args.owner_password_hash.clone(),
        },
    });

    // spawn the background sweeper
    let sweeper = rate_limiter.spawn_sweeper();

    let app = handlers::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Gateway running on http://localhost:{}", args.port);
    tracing::info!(
        "Login rate limit: {} attempts per {} seconds (sweep every {}s)",
        rate_limiter.max_attempts(),
        rate_config.window.as_secs(),
        rate_config.sweep_interval.as_secs()
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.stop().await;
    tracing::info!("Gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
