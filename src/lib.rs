//! Vodbridge - job tracker for a remote HLS conversion service
//!
//! This library crate exposes the core functionality for integration testing.

pub mod callback;
pub mod config;
pub mod lifecycle;
pub mod remote;
pub mod server;
