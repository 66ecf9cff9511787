use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use zywrap_mirror::config::Config;
use zywrap_mirror::error::IsRetryable;
use zywrap_mirror::mirror::BatchOptions;
use zywrap_mirror::remote::{HttpRemote, decode_bundle};
use zywrap_mirror::server::{AppState, mirror_router};
use zywrap_mirror::sync::{self, SyncActorHandle, SyncEngine, SyncOutcome};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Local SQLite mirror of the Zywrap catalog.
#[derive(Parser)]
#[command(name = "zywrap-mirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to ./config.toml when present)
    #[arg(global = true, short, long, env = "ZYWRAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass against the export API
    Sync,

    /// Apply a local bundle (zip or JSON) as a full reset
    Import {
        /// Bundle file
        path: PathBuf,
    },

    /// Download the full bundle without applying it
    Download {
        /// Destination file
        #[arg(default_value = "zywrap-data.zip")]
        out: PathBuf,
    },

    /// Serve the read API, with periodic sync when `sync.interval_secs` > 0
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref())?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        updates_url = %cfg.remote.updates_url,
        proxy = %cfg.remote.proxy.as_ref().map_or("<none>", |u| u.as_str()),
        loglevel = %cfg.basic.loglevel,
        "configuration loaded"
    );

    match cli.command {
        Commands::Sync => run_sync(&cfg).await?,
        Commands::Import { path } => run_import(&cfg, &path).await?,
        Commands::Download { out } => run_download(&cfg, &out).await?,
        Commands::Serve => run_serve(&cfg).await?,
    }
    Ok(())
}

async fn build_engine(cfg: &Config) -> Result<SyncEngine, Box<dyn std::error::Error>> {
    let pool = zywrap_mirror::db::connect(&cfg.basic.database_url).await?;
    let remote = HttpRemote::new(&cfg.remote, &cfg.sync)?;
    Ok(SyncEngine::new(
        pool,
        Arc::new(remote),
        BatchOptions::from(&cfg.sync),
    ))
}

fn print_outcome(outcome: &SyncOutcome) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

async fn run_sync(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    cfg.validate_remote()?;
    let engine = build_engine(cfg).await?;
    let outcome = engine.run().await?;
    print_outcome(&outcome)
}

async fn run_import(cfg: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %path.display(), "importing local bundle");
    let bytes = tokio::fs::read(path).await?;
    let bundle = decode_bundle(&bytes, &cfg.sync.bundle_entry)?;
    let engine = build_engine(cfg).await?;
    let outcome = engine.import_bundle(&bundle).await?;
    print_outcome(&outcome)
}

async fn run_download(cfg: &Config, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    cfg.validate_remote()?;
    let remote = HttpRemote::new(&cfg.remote, &cfg.sync)?;
    let bytes = remote.download_bundle_bytes(None).await?;
    tokio::fs::write(out, &bytes).await?;
    info!(path = %out.display(), bytes = bytes.len(), "bundle saved");
    Ok(())
}

async fn run_serve(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(cfg).await?;
    let pool = engine.pool().clone();

    let handle = if cfg.validate_remote().is_ok() {
        Some(sync::spawn(engine).await?)
    } else {
        warn!("remote.api_key is not set, serving the mirror read-only");
        None
    };

    if let Some(handle) = handle.clone()
        && cfg.sync.interval_secs > 0
    {
        tokio::spawn(periodic_sync(
            handle,
            Duration::from_secs(cfg.sync.interval_secs),
        ));
    }

    let app = mirror_router(AppState::new(pool, handle.clone()));
    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = handle {
        handle.stop();
    }
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn periodic_sync(handle: SyncActorHandle, every: Duration) {
    info!(every_secs = every.as_secs(), "periodic sync enabled");
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match handle.run_sync().await {
            Ok(SyncOutcome::Committed(report)) => info!(
                run_id = %report.run_id,
                upserted = report.upserted(),
                deleted = report.deleted(),
                "periodic sync committed"
            ),
            Ok(_) => {}
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "periodic sync failed, will retry on next tick");
            }
            Err(e) => error!(error = %e, "periodic sync failed"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }
}
