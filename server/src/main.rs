use clap::Parser;
use log::{error, info};
use server::authority::WorldConfig;
use server::network::{Server, ServerError};
use shared::{ITEM_COUNT, RESPAWN_DELAY_MS};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3069")]
    port: u16,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_clients: usize,

    /// Number of collectible items in the world; startup fails if the join
    /// snapshot would not fit in one frame (about 23k items)
    #[arg(long, default_value_t = ITEM_COUNT)]
    items: usize,

    /// Delay before a collected item reappears, in milliseconds
    #[arg(long, default_value_t = RESPAWN_DELAY_MS)]
    respawn_ms: u64,

    /// Seed for item placement and kind draws (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Terrain seed; clients must use the same value
    #[arg(long, default_value = "0")]
    terrain_seed: u64,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let world = WorldConfig {
        item_count: args.items,
        respawn_delay_ms: args.respawn_ms,
        seed: args.seed,
        terrain_seed: args.terrain_seed,
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, args.max_clients, world).await?;
    let shutdown = server.shutdown_handle();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.shutdown(),
            Err(e) => error!("Failed to listen for ctrl-c: {}", e),
        }
    });

    server.run().await?;
    info!("Server stopped");

    Ok(())
}
