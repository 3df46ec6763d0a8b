//! Service layer: business logic between the routes and the state/DAO layers.

/// Fan-out of server messages to live connections.
pub mod broadcast;
/// Commentary write and read operations.
pub mod commentary_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Access-control checks applied before connections are accepted.
pub mod gatekeeper;
/// Health check service.
pub mod health_service;
/// Periodic liveness sweep over the connection registry.
pub mod heartbeat;
/// Match write and read operations.
pub mod match_service;
/// Periodic match phase reconciliation.
pub mod status_sync;
/// WebSocket connection and message handling service.
pub mod websocket_service;
