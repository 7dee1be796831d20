//! feria-web - Leads wizard and bulk listing import service
//!
//! HTTP service for the marketplace publishing flows: the multi-step lead
//! capture wizard and the spreadsheet listing importer.

use anyhow::Result;
use clap::Parser;
use feria_common::config::{
    database_path, ensure_root_folder, resolve_root_folder, uploads_path, DEFAULT_PORT,
};
use feria_common::db::init::init_database;
use feria_web::{build_router, AppState};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "feria-web", about = "Leads wizard and bulk listing import service")]
struct Args {
    /// Root folder holding feria.db and the uploads directory
    #[arg(long)]
    root_folder: Option<String>,

    /// Port to listen on
    #[arg(long, env = "FERIA_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting feria-web v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), "FERIA_ROOT_FOLDER");
    ensure_root_folder(&root_folder)?;

    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let uploads_dir = uploads_path(&root_folder);
    std::fs::create_dir_all(&uploads_dir)?;

    let state = AppState::new(pool, uploads_dir);
    let app = build_router(state);

    let port = args.port.unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("feria-web listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
