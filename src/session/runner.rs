//! Host tick loop

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::game::{GameSnapshot, SnapshotBuilder};
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::Session;

/// Frame rate of the host loop when none is given
pub const DEFAULT_FRAME_HZ: u32 = 60;
/// Snapshots published per second
pub const SNAPSHOT_HZ: u32 = 20;

/// Drives a [`Session`] from one task: relayed events and frame ticks are
/// handled in turn, so a replaced instance never sees another step.
pub struct HostRunner {
    session: Session,
    events: mpsc::Receiver<ServerMsg>,
    outbound: mpsc::Sender<ClientMsg>,
    snapshot_tx: watch::Sender<GameSnapshot>,
    snapshot_builder: SnapshotBuilder,
    frame: Duration,
}

impl HostRunner {
    pub fn new(
        session: Session,
        events: mpsc::Receiver<ServerMsg>,
        outbound: mpsc::Sender<ClientMsg>,
        frame_hz: u32,
    ) -> (Self, watch::Receiver<GameSnapshot>) {
        let frame_hz = frame_hz.max(1);
        let builder = SnapshotBuilder::new((frame_hz / SNAPSHOT_HZ).max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot(&builder));

        let runner = Self {
            session,
            events,
            outbound,
            snapshot_tx,
            snapshot_builder: builder,
            frame: Duration::from_micros(1_000_000 / frame_hz as u64),
        };
        (runner, snapshot_rx)
    }

    /// Run until the event channel closes or the relay connection is gone
    pub async fn run(mut self) -> Session {
        info!(room_id = %self.session.room_id(), "Host loop started");

        let mut frames = interval(self.frame);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_frame = Instant::now();

        loop {
            let replies = tokio::select! {
                _ = frames.tick() => {
                    let now = Instant::now();
                    let replies = self.session.advance(now - last_frame);
                    last_frame = now;

                    if !replies.is_empty() {
                        self.snapshot_builder.force_next();
                    }
                    if self.snapshot_builder.should_send() {
                        self.snapshot_tx
                            .send_replace(self.session.snapshot(&self.snapshot_builder));
                    }
                    replies
                }
                event = self.events.recv() => match event {
                    Some(event) => {
                        let replies = self.session.handle_event(event);
                        self.snapshot_builder.force_next();
                        replies
                    }
                    None => {
                        debug!("Event channel closed");
                        break;
                    }
                },
            };

            for reply in replies {
                if self.outbound.send(reply).await.is_err() {
                    debug!("Outbound channel closed");
                    return self.session;
                }
            }
        }

        info!(room_id = %self.session.room_id(), "Host loop stopped");
        self.session
    }
}
