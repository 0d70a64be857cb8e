use std::net::SocketAddr;

use anyhow::Context;

use knowledge_auth::{
    config::{AppConfig, LoggingConfig},
    db::connection,
    logging::init_tracing,
    routes::app,
    services::{ServiceContext, spawn_token_cleanup},
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            // Without a config there is no configured filter yet.
            init_tracing(&LoggingConfig::default());
            return Err(err);
        }
    };
    init_tracing(&cfg.logging);

    let db = connection::connect(&cfg.database).await?;

    let cleanup = spawn_token_cleanup(
        ServiceContext::new(&db).token_store(cfg.auth.refresh_token_ttl_days),
        cfg.cleanup.interval(),
    );

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;

    let state = AppState::new(cfg, db)?;
    let router = app(state);

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cleanup.abort();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        return;
    }
    tracing::info!("shutdown signal received");
}
