use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use folio_store::http::{self, AppState};
use folio_store::{
    BlobStore, ConfigStore, FileSystemBlobStore, InMemoryBlobStore, MediaReconciler, Settings,
    DEFAULT_RECONCILE_GRACE,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "folio-store")]
#[command(about = "Portfolio config and media service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (settings come from the environment)
    Serve {
        /// Override FOLIO_BIND_ADDR
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Override FOLIO_DATA_DIR
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,
    },
    /// Delete unreferenced media once, print the report, and exit
    Reconcile {
        /// Store root to reconcile
        #[arg(long = "data-dir", env = "FOLIO_DATA_DIR")]
        data_dir: PathBuf,

        /// Keep unreferenced blobs younger than this many seconds
        #[arg(
            long = "grace-secs",
            env = "FOLIO_RECONCILE_GRACE_SECS",
            default_value_t = DEFAULT_RECONCILE_GRACE.as_secs()
        )]
        grace_secs: u64,
    },
}

async fn open_blobs(data_dir: Option<&PathBuf>) -> Result<Arc<dyn BlobStore>, String> {
    match data_dir {
        Some(dir) => {
            tracing::info!(data_dir = %dir.display(), "using filesystem store");
            let store = FileSystemBlobStore::open(dir)
                .await
                .map_err(|e| format!("failed to open {}: {}", dir.display(), e))?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("FOLIO_DATA_DIR not set; data is kept in memory only");
            Ok(Arc::new(InMemoryBlobStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutting down");
}

async fn run_serve(bind: Option<SocketAddr>, data_dir: Option<PathBuf>) -> Result<(), String> {
    let mut settings = Settings::from_env().map_err(|e| e.to_string())?;
    if let Some(bind) = bind {
        settings.bind_addr = bind;
    }
    if data_dir.is_some() {
        settings.data_dir = data_dir;
    }

    let blobs = open_blobs(settings.data_dir.as_ref()).await?;
    let store = Arc::new(
        ConfigStore::new(blobs)
            .with_fallback(settings.fallback)
            .with_version_policy(settings.version_policy),
    );

    let reconciler = settings.reconcile_interval.map(|interval| {
        tracing::info!(?interval, grace = ?settings.reconcile_grace, "starting media reconciler");
        MediaReconciler::spawn(store.clone(), interval, settings.reconcile_grace)
    });

    let state = AppState::new(store, settings.auth_gate())
        .with_max_upload_bytes(settings.max_upload_bytes);
    let served = http::serve(state, settings.bind_addr, shutdown_signal()).await;

    if let Some(reconciler) = reconciler {
        let stats = reconciler.stop().await;
        tracing::info!(
            passes = stats.passes,
            deleted = stats.blobs_deleted,
            "media reconciler stopped"
        );
    }

    served.map_err(|e| format!("server error: {}", e))
}

async fn run_reconcile(data_dir: PathBuf, grace: Duration) -> Result<(), String> {
    let blobs = open_blobs(Some(&data_dir)).await?;
    let store = ConfigStore::new(blobs);
    let report = store
        .reconcile_media(grace)
        .await
        .map_err(|e| format!("reconcile failed: {}", e))?;

    let rendered = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { bind, data_dir } => run_serve(bind, data_dir).await,
        Commands::Reconcile {
            data_dir,
            grace_secs,
        } => run_reconcile(data_dir, Duration::from_secs(grace_secs)).await,
    };

    if let Err(error) = result {
        tracing::error!("{}", error);
        std::process::exit(1);
    }
}
