#![doc = include_str!("../README.md")]

mod bounds;
mod error;
pub mod kdtree;
mod point;
mod r#type;

pub use bounds::{BoundingBox, Corner};
pub use error::{KdTreeError, Result};
pub use point::KdPoint;
pub use r#type::IndexableNum;

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
pub(crate) mod test;
