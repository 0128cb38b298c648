//! HTTP server for the trolley backend.
//!
//! Wires the repositories and the auth service into an axum router.
//! [`build_state`] plus [`build_router`] give a full in-process app,
//! which is also how the integration tests drive the API.

pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod query;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::build_router;
pub use state::{AppState, build_state};
