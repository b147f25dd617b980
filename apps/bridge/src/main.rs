//! # Stok Bridge Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing to stderr (stdout carries the protocol)
//! 2. Resolve the data directory
//! 3. Open the store (create dirs, connect, run migrations)
//! 4. Serve the JSON-lines loop until stdin closes
//! 5. Close the store and exit
//!
//! An unopenable store is fatal: there is nothing useful the bridge
//! can do without it, so it logs the cause and exits non-zero.

use std::path::PathBuf;

use directories::ProjectDirs;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stok_db::{Store, StoreOptions};

/// Resolves the data directory.
///
/// `STOK_DATA_DIR` wins when set; otherwise the platform data dir
/// (`~/.local/share/stok` on Linux, `%APPDATA%` on Windows, Application
/// Support on macOS), with `./stok-data` as a last resort.
fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STOK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    ProjectDirs::from("com", "stok", "stok")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./stok-data"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let data_dir = data_dir();
    info!(path = %data_dir.display(), "starting stok bridge");

    let store = match Store::open(StoreOptions::new(&data_dir)).await {
        Ok(store) => store,
        Err(err) => {
            error!(%err, "failed to open store");
            std::process::exit(1);
        }
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    if let Err(err) = stok_bridge::serve(&store, stdin, stdout).await {
        error!(%err, "bridge i/o failure");
        store.close().await;
        std::process::exit(1);
    }

    store.close().await;
    info!("stdin closed; bridge shut down");
}
