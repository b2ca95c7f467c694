//! # Printer Module
//!
//! Per-model geometry and limits.
//!
//! ## Modules
//!
//! - [`config`]: Model classes and their hardware limits

pub mod config;

pub use config::{CorrectionLevel, Limits, ModelClass, WidthClass, limits_for};
