//! Stream Session
//!
//! Lifecycle of the exchange's push-event connection: session token
//! acquisition, periodic keep-alive, staleness tracking, and teardown.
//! A silently-dead push connection is indistinguishable from a quiet
//! market, so the owning watchdog also resets the session when no event
//! has arrived for too long, even while keep-alives keep succeeding.

use crate::domain::UserStreamEvent;
use crate::infrastructure::client::{ExchangeClient, ExchangeResult};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Listening,
}

/// Manages one push-event session against the exchange.
pub struct StreamSession {
    client: Arc<dyn ExchangeClient>,
    events_tx: UnboundedSender<UserStreamEvent>,
    listen_key: RwLock<Option<String>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    state: RwLock<SessionState>,
    last_event: RwLock<DateTime<Utc>>,
}

impl StreamSession {
    pub fn new(client: Arc<dyn ExchangeClient>, events_tx: UnboundedSender<UserStreamEvent>) -> Self {
        Self {
            client,
            events_tx,
            listen_key: RwLock::new(None),
            listener: Mutex::new(None),
            state: RwLock::new(SessionState::Disconnected),
            last_event: RwLock::new(Utc::now()),
        }
    }

    /// Acquire a session token and open the push connection.
    pub async fn start(&self) -> ExchangeResult<()> {
        self.set_state(SessionState::Connecting);

        let key = match self.client.start_user_stream().await {
            Ok(key) => key,
            Err(e) => {
                self.set_state(SessionState::Disconnected);
                return Err(e);
            }
        };

        match self
            .client
            .listen_user_stream(&key, self.events_tx.clone())
            .await
        {
            Ok(handle) => {
                *self.listen_key.write() = Some(key);
                *self.listener.lock() = Some(handle);
                self.touch();
                self.set_state(SessionState::Listening);
                info!("[stream] session started");
                Ok(())
            }
            Err(e) => {
                if let Err(close_err) = self.client.close_user_stream(&key).await {
                    warn!("[stream] failed to release unused token: {}", close_err);
                }
                self.set_state(SessionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Extend the session, falling back to [`start`](Self::start) when
    /// no token is held. Any keep-alive failure tears the session down
    /// and immediately attempts one reconnect; a failed reconnect is
    /// left to the next watchdog tick.
    pub async fn keep_alive(&self) -> ExchangeResult<()> {
        let key = self.listen_key.read().clone();
        let key = match key {
            Some(key) => key,
            None => return self.start().await,
        };

        match self.client.keepalive_user_stream(&key).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("[stream] keep-alive failed, resetting session: {}", e);
                self.stop().await;
                self.start().await
            }
        }
    }

    /// Tear down and immediately reconnect. Used by the idle watchdog.
    pub async fn force_reset(&self) -> ExchangeResult<()> {
        self.stop().await;
        self.start().await
    }

    /// Release the session token and stop the listener. Idempotent.
    pub async fn stop(&self) {
        let handle = self.listener.lock().take();
        if let Some(handle) = handle {
            handle.abort();
        }

        let key = self.listen_key.write().take();
        if let Some(key) = key {
            if let Err(e) = self.client.close_user_stream(&key).await {
                warn!("[stream] failed to close session: {}", e);
            }
        }
        self.set_state(SessionState::Disconnected);
    }

    /// Record that an event arrived. Called by the dispatch loop.
    pub fn touch(&self) {
        *self.last_event.write() = Utc::now();
    }

    /// Time since the last received event (or since start).
    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(*self.last_event.read())
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }
}
