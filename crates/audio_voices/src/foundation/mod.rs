//! Foundation module - Core utilities and types
//!
//! - Time sources for expiry polling
//! - Logging utilities

pub mod logging;
pub mod time;
