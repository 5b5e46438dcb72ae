//! WebSocket stream channel

use crate::error::{SessionError, SessionResult};
use crate::session::events::{ClientEvent, ServerEvent};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Both halves of an open stream channel
pub struct StreamConnection {
    /// Outbound events; usable directly as a [`crate::session::StreamSink`]
    pub sink: mpsc::UnboundedSender<ClientEvent>,
    /// Inbound events in arrival order
    pub events: mpsc::UnboundedReceiver<ServerEvent>,
}

/// Open the stream channel at `url`. Reading and writing run on their own
/// tasks and talk to the caller only through the returned channels.
pub async fn connect(url: &str) -> SessionResult<StreamConnection> {
    let (socket, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| SessionError::Transport(format!("could not connect to {}: {}", url, e)))?;
    tracing::info!(%url, "stream connected");

    let (mut write, mut read) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientEvent>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerEvent>();

    tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let frame = match event.encode() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(event = event.name(), error = %e, "could not encode event");
                    continue;
                }
            };

            tracing::debug!(event = event.name(), "sending");
            if let Err(e) = write.send(Message::Text(frame)).await {
                tracing::warn!(error = %e, "stream write failed");
                break;
            }
        }
        let _ = write.close().await;
    });

    tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match ServerEvent::decode(&text) {
                    Ok(event) => {
                        if in_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "ignoring unrecognised frame"),
                },
                Ok(Message::Close(_)) => {
                    tracing::info!("stream closed by server");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "stream read failed");
                    break;
                }
            }
        }
    });

    Ok(StreamConnection {
        sink: out_tx,
        events: in_rx,
    })
}
