//! Rules Cache
//!
//! Keeps the exchange-published trading rules fresh behind a TTL.
//! Snapshots are replaced atomically; a failed refresh never destroys
//! the previous snapshot.

use crate::domain::{RulesSnapshot, TradingRules};
use crate::infrastructure::client::{ExchangeClient, ExchangeError};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RulesError {
    /// The refresh failed and the cached snapshot (if any) stayed as-is.
    #[error("trading rules unavailable: {0}")]
    Unavailable(#[source] ExchangeError),

    /// No snapshot has ever been loaded.
    #[error("no trading rules snapshot loaded")]
    Empty,

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),
}

/// TTL-guarded cache of the current [`RulesSnapshot`].
pub struct RulesCache {
    client: Arc<dyn ExchangeClient>,
    ttl: chrono::Duration,
    snapshot: RwLock<Option<Arc<RulesSnapshot>>>,
}

impl RulesCache {
    pub fn new(client: Arc<dyn ExchangeClient>, ttl: chrono::Duration) -> Self {
        Self {
            client,
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    /// Return a fresh snapshot, fetching a new one when the cache is
    /// empty or older than the TTL.
    ///
    /// On fetch failure the previous snapshot stays intact and the
    /// caller gets [`RulesError::Unavailable`]; it should skip the
    /// dependent work for this cycle rather than crash. Concurrent
    /// refreshes may race; the last writer wins, which is fine because
    /// every successful snapshot is authoritative.
    pub async fn ensure_fresh(&self) -> Result<Arc<RulesSnapshot>, RulesError> {
        let now = Utc::now();
        if let Some(current) = self.current() {
            if !current.is_stale(self.ttl, now) {
                return Ok(current);
            }
            debug!("[rules] snapshot stale, refreshing");
        }

        let fresh = self
            .client
            .trading_rules()
            .await
            .map_err(RulesError::Unavailable)?;
        let fresh = Arc::new(fresh);
        *self.snapshot.write() = Some(Arc::clone(&fresh));
        info!("[rules] refreshed snapshot ({} symbols)", fresh.len());
        Ok(fresh)
    }

    /// Current snapshot regardless of age.
    pub fn current(&self) -> Option<Arc<RulesSnapshot>> {
        self.snapshot.read().clone()
    }

    /// Trading rules for one symbol from the current snapshot.
    pub fn rules_for(&self, symbol: &str) -> Result<TradingRules, RulesError> {
        let snapshot = self.current().ok_or(RulesError::Empty)?;
        snapshot
            .get(symbol)
            .cloned()
            .ok_or_else(|| RulesError::UnknownSymbol(symbol.to_string()))
    }

    /// Base assets tradable against `quote_asset`, excluding `exclude`.
    pub fn base_assets_for(
        &self,
        quote_asset: &str,
        exclude: &str,
    ) -> Result<Vec<String>, RulesError> {
        let snapshot = self.current().ok_or(RulesError::Empty)?;
        Ok(snapshot.base_assets_for(quote_asset, exclude))
    }
}
