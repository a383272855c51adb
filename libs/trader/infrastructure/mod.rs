//! Infrastructure Layer
//!
//! Stateful services and the exchange transport. Depends on the domain
//! layer but not on the application layer.

pub mod account;
pub mod client;
pub mod config;
pub mod logging;
pub mod rules_cache;
pub mod stream;

pub use account::{AccountError, AccountState};
pub use client::{BinanceClient, ExchangeClient, ExchangeError, ExchangeResult};
pub use config::{ConfigError, EngineConfig};
pub use logging::init_tracing;
pub use rules_cache::{RulesCache, RulesError};
pub use stream::{SessionState, StreamSession};
