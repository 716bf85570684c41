//! CLI command implementations.
//!
//! - [`layers`] - List the layers of a drawing
//! - [`convert`] - Convert a drawing to KML
//! - [`transform`] - One-shot coordinate conversions
//! - [`locate`] - Acquire the current position
//! - [`config`] - Configuration management (get, set, list, path)

pub mod common;
pub mod config;
pub mod convert;
pub mod layers;
pub mod locate;
pub mod transform;
