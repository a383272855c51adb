//! Stream session lifecycle against the scripted exchange.

mod common;

use common::MockExchange;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::unbounded_channel;
use trader::infrastructure::{SessionState, StreamSession};

#[tokio::test]
async fn start_acquires_token_and_listens() {
    let mock = MockExchange::new();
    let (tx, _rx) = unbounded_channel();
    let session = StreamSession::new(mock.clone(), tx);

    assert_eq!(session.state(), SessionState::Disconnected);
    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Listening);
    assert_eq!(mock.streams_started.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn keep_alive_extends_existing_session() {
    let mock = MockExchange::new();
    let (tx, _rx) = unbounded_channel();
    let session = StreamSession::new(mock.clone(), tx);

    session.start().await.unwrap();
    session.keep_alive().await.unwrap();
    session.keep_alive().await.unwrap();

    let keepalives = mock.keepalives.lock().unwrap().clone();
    assert_eq!(keepalives, ["listen-key-1", "listen-key-1"]);
    // No reconnect happened.
    assert_eq!(mock.streams_started.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn keep_alive_without_token_falls_back_to_start() {
    let mock = MockExchange::new();
    let (tx, _rx) = unbounded_channel();
    let session = StreamSession::new(mock.clone(), tx);

    session.keep_alive().await.unwrap();

    assert_eq!(session.state(), SessionState::Listening);
    assert_eq!(mock.streams_started.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn keep_alive_failure_resets_and_reconnects() {
    let mock = MockExchange::new();
    let (tx, _rx) = unbounded_channel();
    let session = StreamSession::new(mock.clone(), tx);

    session.start().await.unwrap();
    mock.fail_keepalive.store(true, Ordering::SeqCst);
    session.keep_alive().await.unwrap();

    // Old key released, a fresh session acquired.
    let closed = mock.closed_keys.lock().unwrap().clone();
    assert_eq!(closed, ["listen-key-1"]);
    assert_eq!(mock.streams_started.load(Ordering::SeqCst), 2);
    assert_eq!(session.state(), SessionState::Listening);
}

#[tokio::test]
async fn force_reset_reacquires_session() {
    let mock = MockExchange::new();
    let (tx, _rx) = unbounded_channel();
    let session = StreamSession::new(mock.clone(), tx);

    session.start().await.unwrap();
    session.force_reset().await.unwrap();

    assert_eq!(mock.streams_started.load(Ordering::SeqCst), 2);
    let closed = mock.closed_keys.lock().unwrap().clone();
    assert_eq!(closed, ["listen-key-1"]);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let mock = MockExchange::new();
    let (tx, _rx) = unbounded_channel();
    let session = StreamSession::new(mock.clone(), tx);

    session.start().await.unwrap();
    session.stop().await;
    session.stop().await;

    assert_eq!(session.state(), SessionState::Disconnected);
    // The token is only released once.
    assert_eq!(mock.closed_keys.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_start_stays_disconnected() {
    let mock = MockExchange::new();
    mock.fail_start_stream.store(true, Ordering::SeqCst);
    let (tx, _rx) = unbounded_channel();
    let session = StreamSession::new(mock.clone(), tx);

    assert!(session.start().await.is_err());
    assert_eq!(session.state(), SessionState::Disconnected);
}
