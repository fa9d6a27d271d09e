//! # VIP Library
//!
//! This library exposes the VIP server modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;

// Re-export vip_core for convenience
pub use vip_core;
