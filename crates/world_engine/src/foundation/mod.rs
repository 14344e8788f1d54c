//! Foundation module - Core utilities and types
//!
//! - Math types and helpers
//! - Logging and the bounded log history

pub mod logging;
pub mod math;
