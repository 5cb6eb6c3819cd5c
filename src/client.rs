//! WebSocket client plumbing for host and controller peers

use futures::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, warn};

use crate::ws::protocol::{ClientMsg, ServerMsg};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client-side connection errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Connection closed")]
    Closed,
}

/// Open a WebSocket to the relay
pub async fn connect(url: &str) -> Result<WsStream, ClientError> {
    let (ws, _response) = connect_async(url).await?;
    debug!(url = %url, "Connected to relay");
    Ok(ws)
}

/// Send one message
pub async fn send_msg<S>(sink: &mut S, msg: &ClientMsg) -> Result<(), ClientError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json.into())).await?;
    Ok(())
}

/// Next relay message. Control frames and frames that do not parse are skipped.
pub async fn recv_msg(ws: &mut WsStream) -> Result<ServerMsg, ClientError> {
    while let Some(frame) = ws.next().await {
        if let Message::Text(text) = frame? {
            if let Some(msg) = decode(text.as_str()) {
                return Ok(msg);
            }
        }
    }
    Err(ClientError::Closed)
}

fn decode(text: &str) -> Option<ServerMsg> {
    match serde_json::from_str(text) {
        Ok(msg) => Some(msg),
        Err(e) => {
            debug!(error = %e, "Ignoring unparseable relay frame");
            None
        }
    }
}

/// Channel pair bridged onto a relay connection by a background task
pub struct RelayLink {
    pub outbound: mpsc::Sender<ClientMsg>,
    pub inbound: mpsc::Receiver<ServerMsg>,
    pub task: JoinHandle<()>,
}

/// Move `ws` into a pump task. Dropping every outbound sender closes the
/// socket; the inbound channel closes when the relay goes away.
pub fn spawn_link(ws: WsStream, capacity: usize) -> RelayLink {
    let (out_tx, mut out_rx) = mpsc::channel::<ClientMsg>(capacity.max(1));
    let (in_tx, in_rx) = mpsc::channel::<ServerMsg>(capacity.max(1));

    let task = tokio::spawn(async move {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                outgoing = out_rx.recv() => match outgoing {
                    Some(msg) => {
                        if let Err(e) = send_msg(&mut sink, &msg).await {
                            warn!(error = %e, "Relay send failed");
                            break;
                        }
                    }
                    None => {
                        let _ = sink.close().await;
                        break;
                    }
                },
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(msg) = decode(text.as_str()) {
                            if in_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Relay closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Relay read failed");
                        break;
                    }
                },
            }
        }
    });

    RelayLink {
        outbound: out_tx,
        inbound: in_rx,
        task,
    }
}
