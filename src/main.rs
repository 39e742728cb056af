use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookshelf_server::covers::CoverApiClient;
use bookshelf_server::library_store::SqliteLibraryStore;
use bookshelf_server::server::run_server;

const DEFAULT_COVER_API_URL: &str =
    "https://book-cover-api2.p.rapidapi.com/api/public/books/v1/cover/url";

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the library database file (created on first run).
    #[clap(long, default_value = "library.db", value_parser = parse_path)]
    pub db_path: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Directory served under /static (placeholder cover images live here).
    #[clap(long, value_parser = parse_path)]
    pub static_dir: Option<PathBuf>,

    /// Base URL of the book-cover lookup service.
    #[clap(long, default_value = DEFAULT_COVER_API_URL)]
    pub cover_api_url: String,

    /// RapidAPI key for the cover lookup service. Without it every lookup
    /// falls back to the placeholder image.
    #[clap(long)]
    pub cover_api_key: Option<String>,

    /// RapidAPI host header for the cover lookup service.
    #[clap(long)]
    pub cover_api_host: Option<String>,

    /// Timeout in seconds for cover lookup requests.
    #[clap(long, default_value_t = 15)]
    pub cover_timeout_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let covers = Arc::new(CoverApiClient::new(
        cli_args.cover_api_url.clone(),
        cli_args.cover_api_key.clone(),
        cli_args.cover_api_host.clone(),
        Duration::from_secs(cli_args.cover_timeout_sec),
    )?);

    if !cli_args.db_path.exists() {
        info!("Creating new library database at {:?}", cli_args.db_path);
    }
    let store = Arc::new(SqliteLibraryStore::new(&cli_args.db_path, covers)?);

    info!("Ready to serve at port {}!", cli_args.port);

    tokio::select! {
        result = run_server(store, cli_args.static_dir.clone(), cli_args.port) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
