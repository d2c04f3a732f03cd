//! Trailerio - multi-source trailer resolver
//!
//! This library crate exposes the core functionality for integration testing.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod server;
pub mod trailer;

pub use error::{Error, Result};
