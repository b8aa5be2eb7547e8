//! Core utilities for the vantage renderer.
//!
//! This crate provides the foundational pieces shared by every other crate
//! in the workspace:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing
//! - Render configuration

mod config;
mod error;
mod logging;
mod timer;

pub use config::RenderConfig;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::Timer;
