//! Account State
//!
//! Holds the latest balance snapshot behind a single atomically-swapped
//! reference. Writers build a complete new generation and swap it in;
//! readers clone the `Arc` and never observe a half-updated map.

use crate::domain::{AccountSnapshot, Balance};
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("unknown asset {0}")]
    UnknownAsset(String),
}

/// Shared, atomically-replaceable view of per-asset balances.
pub struct AccountState {
    snapshot: RwLock<Arc<AccountSnapshot>>,
}

impl AccountState {
    /// Starts empty; every lookup fails until the first `replace`.
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(AccountSnapshot::empty())),
        }
    }

    /// Wholesale replacement from a full REST refresh.
    pub fn replace(&self, snapshot: AccountSnapshot) {
        let assets = snapshot.len();
        *self.snapshot.write() = Arc::new(snapshot);
        debug!("[account] replaced snapshot ({} assets)", assets);
    }

    /// Upsert only the assets present in `deltas`, leaving the rest of
    /// the snapshot untouched. Used for incremental push updates; may
    /// race with `replace`, in which case the last writer wins (both
    /// are convergent views of exchange-side truth).
    pub fn apply_delta(&self, deltas: &[Balance]) {
        if deltas.is_empty() {
            return;
        }
        let mut guard = self.snapshot.write();
        let mut next = AccountSnapshot::clone(&guard);
        for balance in deltas {
            next.upsert(balance.clone());
        }
        next.captured_at = Utc::now();
        *guard = Arc::new(next);
        debug!("[account] applied delta ({} assets)", deltas.len());
    }

    /// Balance of one asset; fails if the asset has never been seen.
    pub fn balance(&self, asset: &str) -> Result<Balance, AccountError> {
        self.snapshot
            .read()
            .get(asset)
            .cloned()
            .ok_or_else(|| AccountError::UnknownAsset(asset.to_string()))
    }

    /// Free amount of one asset, zero when the asset is unknown. For
    /// callers that treat absence as an empty balance.
    pub fn free(&self, asset: &str) -> Decimal {
        self.snapshot
            .read()
            .get(asset)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO)
    }

    /// Current snapshot generation.
    pub fn snapshot(&self) -> Arc<AccountSnapshot> {
        Arc::clone(&self.snapshot.read())
    }
}

impl Default for AccountState {
    fn default() -> Self {
        Self::new()
    }
}
