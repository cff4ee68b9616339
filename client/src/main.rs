use clap::Parser;
use client::events::{EventBus, GameEventKind};
use client::network::Client;
use log::{info, warn};
use std::time::{Duration, Instant};
use tokio::time::interval;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// How long to keep flying, in seconds
    #[arg(short = 'd', long, default_value = "30")]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut events = EventBus::new();
    events.subscribe(GameEventKind::Joined, |event| {
        info!("Event: {:?}", event);
    });
    events.subscribe(GameEventKind::RemoteShipSpawned, |event| {
        info!("Event: {:?}", event);
    });
    events.subscribe(GameEventKind::RemoteShipDespawned, |event| {
        info!("Event: {:?}", event);
    });

    let mut client = Client::connect(&args.server, events).await?;

    let mut frame_interval = interval(Duration::from_secs_f32(1.0 / 60.0));
    let started = Instant::now();
    let mut frame_count: u64 = 0;

    while started.elapsed() < Duration::from_secs(args.duration) {
        frame_interval.tick().await;
        client.frame(1.0 / 60.0);

        if client.world().is_joined() {
            // Fly a lazy curve so there is always something to watch
            let t = started.elapsed().as_secs_f32();
            let horizontal = (t / 5.0).sin();
            let vertical = (t / 5.0).cos();
            if let Err(e) = client.send_axes(horizontal, vertical) {
                warn!("Input not sent: {}", e);
            }
        }

        frame_count += 1;
        if frame_count % 60 == 0 {
            if let Some(ship) = client.world().local() {
                info!(
                    "Ship at ({:.2}, {:.2}) heading {:.1}, {} other ships in view",
                    ship.position.x,
                    ship.position.y,
                    ship.rotation,
                    client.world().remotes().len()
                );
            }
        }

        if !client.is_open() {
            warn!("Connection lost");
            break;
        }
    }

    client.close();
    info!("Done flying");
    Ok(())
}
