//! Virtual phone controller
//!
//! Streams a synthetic tilt sweep through the input normalizer and turns
//! stdin lines into actions:
//!
//! - `calibrate`: take the current tilt as neutral and re-centre the host
//! - `game <id>`: select a game (`LOBBY`, `game1`, `game2`, `game3`)
//! - `debug`: print the normalizer's debug line
//! - `quit`: leave the room
//! - anything else is sent as a `controller-action` (`start-game`, `fire-start`, ...)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use tilt_arcade::client::{connect, spawn_link};
use tilt_arcade::game::GameId;
use tilt_arcade::init_tracing;
use tilt_arcade::input::{GyroSample, InputNormalizer};
use tilt_arcade::room::Role;
use tilt_arcade::ws::protocol::{ActionPayload, ClientMsg, JoinPayload, ServerMsg};

/// Tilt Arcade virtual controller
#[derive(Parser)]
#[command(name = "tilt-arcade-controller")]
#[command(about = "Drive a Tilt Arcade room with a synthetic tilt stream")]
struct Args {
    /// Relay WebSocket URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Room shown by the host
    #[arg(long)]
    room: String,

    /// Raw sensor rate; the normalizer still emits at most every 50ms
    #[arg(long, default_value_t = 60)]
    sample_hz: u32,

    /// Phase offset for the synthetic sweep
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

    let ws = connect(&args.url)
        .await
        .with_context(|| format!("Failed to connect to {}", args.url))?;
    let mut link = spawn_link(ws, 256);

    link.outbound
        .send(ClientMsg::JoinRoom(JoinPayload::Detailed {
            room_id: args.room.clone(),
            role: Some(Role::Controller),
        }))
        .await
        .context("Relay link closed before join")?;

    let normalizer = Arc::new(Mutex::new(InputNormalizer::new()));

    tokio::spawn(stream_tilt(
        args.room.clone(),
        args.sample_hz,
        args.seed,
        normalizer.clone(),
        link.outbound.clone(),
    ));
    let commands = tokio::spawn(read_commands(args.room.clone(), normalizer, link.outbound.clone()));

    tokio::select! {
        _ = log_relay(&mut link.inbound) => warn!("Relay connection ended"),
        _ = commands => info!("Left room"),
    }

    Ok(())
}

async fn log_relay(inbound: &mut mpsc::Receiver<ServerMsg>) {
    while let Some(msg) = inbound.recv().await {
        match msg {
            ServerMsg::RoomJoined { room_id, role } => {
                info!(room_id = %room_id, role = ?role, "Joined room");
            }
            ServerMsg::GameChanged(game) => info!(game = %game, title = game.title(), "Game changed"),
            ServerMsg::SyncGameStatus(status) => info!(status = ?status, "Host status"),
            other => debug!(event = ?other, "Ignoring relay message"),
        }
    }
}

/// Synthetic device: a slow figure-eight sweep around the default resting angle
fn synthetic_sample(t: f64, phase: f64) -> GyroSample {
    GyroSample::new(
        Some((t * 10.0) % 360.0),
        Some((t * 0.7 + phase).sin() * 15.0),
        Some(-24.0 + (t * 1.3 + phase).sin() * 20.0),
    )
}

async fn stream_tilt(
    room_id: String,
    sample_hz: u32,
    seed: u64,
    normalizer: Arc<Mutex<InputNormalizer>>,
    outbound: mpsc::Sender<ClientMsg>,
) {
    let period = Duration::from_micros(1_000_000 / sample_hz.max(1) as u64);
    let mut samples = interval(period);
    samples.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let start = Instant::now();
    let phase = (seed % 628) as f64 / 100.0;

    loop {
        samples.tick().await;
        let t = start.elapsed().as_secs_f64();

        let due = normalizer.lock().sample(synthetic_sample(t, phase), Instant::now());
        if let Some(data) = due {
            let msg = ClientMsg::GyroData {
                room_id: room_id.clone(),
                data,
            };
            if outbound.send(msg).await.is_err() {
                break;
            }
        }
    }
}

async fn read_commands(
    room_id: String,
    normalizer: Arc<Mutex<InputNormalizer>>,
    outbound: mpsc::Sender<ClientMsg>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        let msg = match line {
            "" => continue,
            "debug" => {
                info!("{}", normalizer.lock().debug_line());
                continue;
            }
            "calibrate" => {
                let offset = normalizer.lock().calibrate();
                info!(beta0 = offset.beta0, gamma0 = offset.gamma0, "Calibrated");
                ClientMsg::ResetPosition {
                    room_id: room_id.clone(),
                }
            }
            "quit" => {
                let _ = outbound.send(ClientMsg::LeaveRoom).await;
                break;
            }
            _ => match line.split_once(' ') {
                Some(("game", id)) => match GameId::parse(id.trim()) {
                    Some(game_id) => ClientMsg::SelectGame {
                        room_id: room_id.clone(),
                        game_id,
                    },
                    None => {
                        warn!(game = %id, "Unknown game id");
                        continue;
                    }
                },
                _ => ClientMsg::ControllerAction(ActionPayload::Scoped {
                    room_id: Some(room_id.clone()),
                    action: line.to_string(),
                }),
            },
        };

        if outbound.send(msg).await.is_err() {
            break;
        }
    }
}
