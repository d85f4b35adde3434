use clap::Parser;
use client::game::ClientGame;
use client::input::InputManager;
use client::network::{NetEvent, NetworkClient};
use client::rendering::Renderer;
use log::{error, info};
use macroquad::prelude::*;
use shared::{Packet, RollingTerrain};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3069")]
    server: String,

    /// Display name shown to other players
    #[arg(short = 'n', long, default_value = "Forager")]
    name: String,

    /// Terrain seed; must match the server's
    #[arg(long, default_value = "0")]
    terrain_seed: u64,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Forager".to_owned(),
        window_width: 1024,
        window_height: 768,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to {} as {}", args.server, args.name);
    info!("Controls: WASD/arrows to move, Q/E to turn, L for leaderboard, Esc to quit");

    let network = match NetworkClient::connect(&args.server, &args.name) {
        Ok(network) => network,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    let mut game = ClientGame::new(RollingTerrain::new(args.terrain_seed));
    let mut input_manager = InputManager::new();
    let mut renderer = Renderer::new();
    let started = std::time::Instant::now();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        for event in network.poll() {
            match event {
                NetEvent::Connected => info!("Connected, waiting for snapshot"),
                NetEvent::Packet(packet) => game.handle_packet(packet),
                NetEvent::Disconnected(reason) => {
                    game.handle_packet(Packet::Disconnected { reason });
                }
            }
        }

        let input = input_manager.update();
        let now_ms = started.elapsed().as_millis() as u64;
        for packet in game.update(get_frame_time(), &input, now_ms) {
            network.send(packet);
        }

        renderer.render(&game);
        next_frame().await;
    }

    network.shutdown();
}
