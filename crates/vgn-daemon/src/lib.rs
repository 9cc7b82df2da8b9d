//! vgn-daemon library surface.
//!
//! `main.rs` stays thin; everything testable lives here so the scenario
//! tests in `tests/` can compose the router against the in-memory backend
//! without binding a socket.

pub mod api_types;
pub mod config;
pub mod routes;
pub mod state;
