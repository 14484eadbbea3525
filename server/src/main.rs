use clap::Parser;
use log::{error, info};
use server::game::GameConfig;
use server::network::{Server, ServerMessage};
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Simulation steps per second
    #[clap(short, long, default_value = "60")]
    tick_rate: u32,
    /// Maximum number of connected clients
    #[clap(short, long, default_value = "16")]
    max_clients: usize,
    /// Arena width
    #[clap(long, default_value = "800")]
    width: f64,
    /// Arena height
    #[clap(long, default_value = "600")]
    height: f64,
    /// Downward acceleration applied to every dynamic body
    #[clap(short, long, default_value = "500")]
    gravity: f64,
    /// Seconds of silence before a client is dropped
    #[clap(long, default_value = "5")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let config = GameConfig {
        width: args.width,
        height: args.height,
        gravity: args.gravity,
        tick_rate: args.tick_rate,
    };

    info!(
        "Starting server on {} at {}Hz (max {} clients)",
        address, args.tick_rate, args.max_clients
    );

    let mut server = Server::with_timeout(
        &address,
        config,
        args.max_clients,
        Duration::from_secs(args.timeout_secs),
    )
    .await?;

    let control = server.control();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down");
                let _ = control.send(ServerMessage::Shutdown);
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    server.run().await
}
