//! User-data-stream WebSocket listener.
//!
//! One task per session: reads the push connection, answers pings, and
//! forwards parsed events into the engine's channel in arrival order.
//! The task exits on close or transport error; reconnecting is the
//! stream-health watchdog's job, not ours.

use super::types::WsEvent;
use crate::domain::UserStreamEvent;
use crate::infrastructure::client::{ExchangeError, ExchangeResult};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connect to the push endpoint for `listen_key` and spawn the reader.
pub(crate) async fn connect_and_listen(
    ws_url: &str,
    listen_key: &str,
    events: UnboundedSender<UserStreamEvent>,
) -> ExchangeResult<JoinHandle<()>> {
    let url = format!("{}/ws/{}", ws_url, listen_key);

    let stream = match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(&url)).await {
        Ok(Ok((stream, _))) => stream,
        Ok(Err(e)) => return Err(ExchangeError::Transport(e.to_string())),
        Err(_) => return Err(ExchangeError::Timeout),
    };

    info!("[ws] connected to user data stream");
    Ok(tokio::spawn(run_listener(stream, events)))
}

async fn run_listener(stream: WsStream, events: UnboundedSender<UserStreamEvent>) {
    let (mut write, mut read) = stream.split();

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<WsEvent>(&text) {
                    Ok(event) => {
                        if let Some(event) = event.into_stream_event() {
                            if events.send(event).is_err() {
                                // Receiver gone; the engine is shutting down.
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("[ws] failed to parse push message: {} ({})", e, text);
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                debug!("[ws] ping received, answering");
                if let Err(e) = write.send(Message::Pong(payload)).await {
                    warn!("[ws] failed to answer ping: {}", e);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("[ws] connection closed by server");
                break;
            }
            Err(e) => {
                warn!("[ws] transport error: {}", e);
                break;
            }
            _ => {}
        }
    }

    info!("[ws] listener exited");
}
