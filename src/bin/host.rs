//! Headless display host
//!
//! Joins a room as host, runs the session on a fixed tick, and logs status
//! and score as snapshots come in.

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use tilt_arcade::client::{connect, spawn_link};
use tilt_arcade::game::{GameId, GameSnapshot};
use tilt_arcade::init_tracing;
use tilt_arcade::room::{generate_room_id, Role};
use tilt_arcade::session::{HostRunner, Session, DEFAULT_FRAME_HZ};
use tilt_arcade::ws::protocol::{ClientMsg, JoinPayload};

/// Tilt Arcade display host
#[derive(Parser)]
#[command(name = "tilt-arcade-host")]
#[command(about = "Run a headless game host against a Tilt Arcade relay")]
struct Args {
    /// Relay WebSocket URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Room to host; a fresh 6-character id when omitted
    #[arg(long)]
    room: Option<String>,

    /// Game to select on start (LOBBY, game1, game2, game3)
    #[arg(long, value_parser = parse_game)]
    game: Option<GameId>,

    /// Seed for the simulation RNG
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Frame rate of the host loop; physics steps at 60 Hz for any rate of 4 Hz or more
    #[arg(long, default_value_t = DEFAULT_FRAME_HZ)]
    tick_hz: u32,
}

fn parse_game(value: &str) -> Result<GameId, String> {
    GameId::parse(value).ok_or_else(|| format!("unknown game id {value:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

    let room_id = args.room.unwrap_or_else(generate_room_id);
    let ws = connect(&args.url)
        .await
        .with_context(|| format!("Failed to connect to {}", args.url))?;
    let link = spawn_link(ws, 256);

    info!(room_id = %room_id, "Hosting room; controllers join with --room {}", room_id);

    link.outbound
        .send(ClientMsg::JoinRoom(JoinPayload::Detailed {
            room_id: room_id.clone(),
            role: Some(Role::Host),
        }))
        .await
        .context("Relay link closed before join")?;

    if let Some(game) = args.game {
        link.outbound
            .send(ClientMsg::SelectGame {
                room_id: room_id.clone(),
                game_id: game,
            })
            .await
            .context("Relay link closed before game selection")?;
    }

    let session = Session::new(room_id, args.seed);
    let (runner, snapshots) = HostRunner::new(session, link.inbound, link.outbound.clone(), args.tick_hz);
    tokio::spawn(report(snapshots));

    tokio::select! {
        session = runner.run() => {
            warn!(
                game = %session.game(),
                status = ?session.status(),
                score = session.score(),
                "Relay connection ended"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, leaving room");
            let _ = link.outbound.send(ClientMsg::LeaveRoom).await;
        }
    }

    Ok(())
}

/// Log every status change and a score line once a second while playing
async fn report(mut snapshots: watch::Receiver<GameSnapshot>) {
    let mut last = snapshots.borrow().clone();
    let mut last_score_log = tokio::time::Instant::now();

    while snapshots.changed().await.is_ok() {
        let snap = snapshots.borrow_and_update().clone();

        if snap.status != last.status || snap.game != last.game || snap.epoch != last.epoch {
            info!(
                game = %snap.game,
                status = ?snap.status,
                epoch = snap.epoch,
                score = snap.score,
                controller = snap.controller_connected,
                "Status"
            );
        } else if last_score_log.elapsed().as_secs() >= 1 && snap.score != last.score {
            info!(score = snap.score, entities = snap.entities.len(), tick = snap.tick, "Score");
            last_score_log = tokio::time::Instant::now();
        }

        last = snap;
    }
}
