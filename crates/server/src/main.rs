use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use requeue_gateway::GatewayBuilder;
use requeue_provider::HttpTaskEngine;
use requeue_server::api::AppState;
use requeue_server::auth::CredentialValidator;
use requeue_server::config::RequeueConfig;
use requeue_server::error::ServerError;
use requeue_server::ratelimit::RateLimiter;
use requeue_webhook::WebhookNotifier;

/// Requeue dead-letter replay server.
#[derive(Parser, Debug)]
#[command(name = "requeue-server", about = "Standalone HTTP server for Requeue")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "requeue.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run database migrations for the configured store backend, then exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_found = Path::new(&cli.config).exists();
    let mut config = RequeueConfig::load(Path::new(&cli.config))?;
    config.apply_env_overrides();

    requeue_server::telemetry::init(&config.telemetry);
    if !config_found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    if let Some(Commands::Migrate) = cli.command {
        return run_migrate(&config).await;
    }

    config.validate()?;

    let stores = requeue_server::store_factory::create_stores(&config.store).await?;
    info!(backend = %config.store.backend, "replay store initialized");

    let engine_config = config
        .engine
        .to_http_config()
        .ok_or_else(|| ServerError::Config("engine.url is required".into()))?;
    let engine = HttpTaskEngine::new(engine_config)?;

    let mut builder = GatewayBuilder::new()
        .store(Arc::clone(&stores.replay))
        .engine(Arc::new(engine))
        .audit_store(stores.audit)
        .executor_config(config.replay.executor_config())
        .replay_config(config.replay.replay_config());

    if let Some(webhook) = config.notifications.webhook_config() {
        info!(url = %webhook.url, "replay notifications enabled");
        builder = builder.notifier(Arc::new(WebhookNotifier::new(webhook)?));
    }

    let gateway = builder.build()?;
    let validator = CredentialValidator::from_config(&config.auth, Arc::clone(&stores.replay))?;
    let rate_limiter = RateLimiter::new(Arc::clone(&stores.replay), config.rate_limit.clone());

    let state = AppState {
        gateway: Arc::new(gateway),
        validator: Arc::new(validator),
        rate_limiter: Arc::new(rate_limiter),
        max_body_bytes: config.server.max_body_bytes,
    };
    let app = requeue_server::api::router(state);

    // CLI overrides take precedence.
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "requeue-server listening");

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let mut server = tokio::spawn({
        let shutdown = Arc::clone(&shutdown);
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    // In-flight replay runs are not cancellable; give them a bounded drain.
    shutdown.notify_one();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(result) => result??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded, abandoning in-flight requests"
        ),
    }

    info!("requeue-server shut down");
    Ok(())
}

/// Run the `migrate` subcommand: initialize the store schema and exit.
async fn run_migrate(config: &RequeueConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.store.validate()?;
    info!(backend = %config.store.backend, "running store migrations...");
    let _stores = requeue_server::store_factory::create_stores(&config.store).await?;
    info!(backend = %config.store.backend, "store migrations complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
