//! Utility types and functions for layerbridge.
//!
//! This module contains fundamental types used throughout the library:
//! - [`ScalarType`] - Fixed-size numeric types of the binary encodings
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam

mod error;
mod math;
mod scalar;

pub use error::*;
pub use math::*;
pub use scalar::*;
