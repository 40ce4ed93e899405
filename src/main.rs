use std::path::PathBuf;

use clap::Parser;
use courtside::config::{
    Settings, create_app, init_tracing, make_pool, run_migrations,
};
use tokio::signal;

#[derive(Parser)]
#[command(about = "Beach tennis tournament API")]
struct Args {
    /// TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    database_url: Option<String>,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
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
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(url) = args.database_url {
        settings.database_url = url;
    }
    if settings.uses_dev_secret() {
        tracing::warn!("JWT_SECRET is not set; using the development secret");
    }

    tracing::info!(database = %settings.database_url, "opening database");
    let pool = make_pool(&settings.database_url, settings.pool_size)?;
    run_migrations(&pool).await?;

    let app = create_app(pool, &settings);
    let listener =
        tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
            .await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
