//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the codec crates:
//! - Logging and tracing bootstrap (`tracing-subscriber`)
//! - Runtime error type
//!
//! ## Overview
//!
//! The codec core only emits `tracing` events; nothing is printed unless the
//! host installs a subscriber. Applications that do not have their own
//! subscriber call [`logging::init_logging`] once at startup.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
