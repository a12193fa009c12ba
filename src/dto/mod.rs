//! Wire types exchanged over HTTP and WebSocket.

/// Game start, answer and progression payloads.
pub mod game;
/// Healthcheck payload.
pub mod health;
/// Room creation and membership payloads.
pub mod room;
/// Shared validators for request fields.
pub mod validation;
/// Socket envelopes in both directions.
pub mod ws;
