//! HTTP API layer.
//!
//! Hosts the gate in front of internal routes.

mod handlers;
mod routes;
mod types;

pub use routes::build_router;
