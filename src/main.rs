use tracing::info;

use infra_pilot::{build_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,infra_pilot=debug")),
        )
        .init();

    let config = load_config()?;

    let state = AppState::initialize(&config).await?;
    info!(chat_backend = state.chat.is_available(), "chat service ready");

    let router = build_router(state, &config.cors_origins)?;
    let addr = config.bind_addr();

    info!(%addr, "infra-pilot starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install CTRL+C handler");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    info!("infra-pilot stopped");
    Ok(())
}

#[cfg(feature = "config-toml")]
fn load_config() -> anyhow::Result<ServiceConfig> {
    let base = match std::env::var("INFRA_PILOT_CONFIG") {
        Ok(path) => {
            info!(%path, "loading configuration file");
            ServiceConfig::from_toml_file(&path)?
        }
        Err(_) => ServiceConfig::default(),
    };
    Ok(base.with_overrides(|key| std::env::var(key).ok())?)
}

#[cfg(not(feature = "config-toml"))]
fn load_config() -> anyhow::Result<ServiceConfig> {
    Ok(ServiceConfig::from_env()?)
}
