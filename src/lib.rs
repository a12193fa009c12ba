//! Library crate for spotiquiz-back, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Room records and their key-value stores.
pub mod dao;
/// Request, response and socket payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum route trees.
pub mod routes;
/// Business operations.
pub mod services;
/// Shared state, socket hub and quiz state machine.
pub mod state;
