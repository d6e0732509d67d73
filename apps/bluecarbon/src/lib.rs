//! # bluecarbon
//!
//! Library surface of the blue carbon registry binary, exposed so the
//! integration tests can drive the HTTP API and gateways directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod transport;
