//! Async client for the dustbin fleet backend.
//!
//! The backend exposes a small JSON-over-HTTP surface under `/api`:
//! device listings, notifications, aggregate statistics, and two demo
//! controls (reseed and simulate). This crate is a thin transport layer:
//! wire types mirror the backend payloads one-to-one and carry raw strings
//! for enumerated fields. Typed domain models live in `binwatch-core`.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::BinwatchClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{
    ApiStatus, DashboardStats, DemoDataAck, Dustbin, Location, MessageAck, Notification,
    SimulationAck,
};
