//! HTTP client for the Crewline connectivity bridge.
//!
//! The bridge is a single stateless endpoint that runs queries and scripts
//! against the remote relational store on the client's behalf. All calls
//! are one JSON request/response pair POSTed to the configured URL.

mod client;
mod error;
mod types;

pub use client::BridgeClient;
pub use error::{BridgeError, Result};
pub use types::{BridgeAction, BridgeRequest, BridgeResponse, ConnectionTest, RemoteRow};
