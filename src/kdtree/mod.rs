//! A balanced k-d tree over points of any dimension.
//!
//! Each node stores one point and splits the space below it along one axis. Bulk construction
//! selects medians so the tree depth stays logarithmic; nearest-neighbor, range and radius
//! queries prune subtrees using split planes and cached bounding boxes.

#![warn(missing_docs)]

mod builder;
mod index;
mod node;
mod query;
mod traversal;

pub use builder::{KDTreeBuilder, SplitPolicy};
pub use index::KDTree;
pub use node::Node;
pub use query::Neighbor;
pub use traversal::Iter;
