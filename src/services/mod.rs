//! Business operations invoked by the HTTP and WebSocket routes.

/// OpenAPI documentation generation.
pub mod documentation;
/// Game start, answer scoring and scoreboard operations.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Atomic question advance and room finalization.
pub mod progression;
/// Multiple-choice question generation from pooled tracks.
pub mod question_generator;
/// Timer-driven quiz progression task.
pub mod quiz_orchestrator;
/// Room creation and membership.
pub mod room_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
