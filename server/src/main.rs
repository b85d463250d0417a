use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use server::report;

/// Parses command-line arguments, starts the server and runs it until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ServerConfig::parse();
    info!(
        "Starting battle server on {}:{} (max {} clients)",
        config.host, config.port, config.max_clients
    );

    let server = Server::bind(&config).await?;
    let arena = server.arena();

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    let history = arena.stats.history().await;
    info!("Final report:\n{}", report::full_report(&history));
    Ok(())
}
