//! Tessera Core - Foundational types for the Tessera component engine
//!
//! This crate provides the types every other Tessera crate depends on:
//! - `EntityId` - Stable entity identifiers
//! - `EntityKind` - The kinds of scene entity a component can live on
//! - `Color`, `ColorSpace` - Color values and sRGB transfer functions
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{ErrorCategory, Result, TesseraError};
pub use id::EntityId;
pub use types::{linear_to_srgb, srgb_to_linear, Color, ColorSpace, EntityKind};
