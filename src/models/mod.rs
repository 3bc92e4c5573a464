//! Core data models for the footprint pipeline.

pub mod footprint;
pub mod mask;

pub use footprint::{Footprint, FootprintCollection, NO_ADDRESS_FOUND};
pub use mask::Mask;
