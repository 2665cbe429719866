use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use taskboard_store::StoreConfig;

#[derive(Parser)]
#[command(name = "taskboard-server")]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "TASKBOARD_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on.
    #[arg(long, env = "TASKBOARD_PORT", default_value_t = 3720)]
    port: u16,

    /// Directory for the database and uploaded files. Defaults to an
    /// XDG-style data dir.
    #[arg(long, env = "TASKBOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let db = match &cli.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            taskboard_db::Db::open(&dir.join("taskboard.db"))?
        }
        None => taskboard_db::Db::open_default()?,
    };
    let store = taskboard_store::create_store(&StoreConfig {
        data_dir: cli
            .data_dir
            .as_ref()
            .map(|d| d.to_string_lossy().to_string())
            .or_else(|| StoreConfig::from_env().data_dir),
    });

    let addr = SocketAddr::new(cli.bind.parse()?, cli.port);
    let listener = TcpListener::bind(addr).await?;
    info!("taskboard-server listening on http://{addr}");

    taskboard_server::serve(listener, db, store).await
}
