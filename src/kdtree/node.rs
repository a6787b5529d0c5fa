use std::fmt;

use crate::bounds::BoundingBox;
use crate::point::KdPoint;

/// A node of a [`KDTree`][crate::kdtree::KDTree]: one stored point and the subtree below it.
///
/// Every node exclusively owns its children. Points in the left subtree have a coordinate along
/// [`axis`][Node::axis] no greater than [`split_value`][Node::split_value], points in the right
/// subtree no smaller.
pub struct Node<P: KdPoint, T> {
    pub(crate) point: P,
    pub(crate) data: T,
    pub(crate) axis: usize,
    pub(crate) bounds: BoundingBox<P::Num>,
    pub(crate) left: Option<Box<Node<P, T>>>,
    pub(crate) right: Option<Box<Node<P, T>>>,
}

impl<P: KdPoint, T> Node<P, T> {
    pub(crate) fn leaf(point: P, data: T, axis: usize) -> Self {
        let bounds = BoundingBox::from_point(&point);
        Self {
            point,
            data,
            axis,
            bounds,
            left: None,
            right: None,
        }
    }

    /// A copy of this node without its children.
    pub(crate) fn detached(&self) -> Self
    where
        P: Clone,
        T: Clone,
    {
        Self {
            point: self.point.clone(),
            data: self.data.clone(),
            axis: self.axis,
            bounds: self.bounds.clone(),
            left: None,
            right: None,
        }
    }

    /// The point stored in this node.
    #[inline]
    pub fn point(&self) -> &P {
        &self.point
    }

    /// The payload stored alongside the point.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// The axis the children of this node are split over.
    #[inline]
    pub fn axis(&self) -> usize {
        self.axis
    }

    /// The coordinate of this node's point along its split axis.
    #[inline]
    pub fn split_value(&self) -> P::Num {
        self.point.coord(self.axis)
    }

    /// The bounding box of every point in this subtree, this node's point included.
    #[inline]
    pub fn bounds(&self) -> &BoundingBox<P::Num> {
        &self.bounds
    }

    /// The child node holding points on the lower side of the split.
    #[inline]
    pub fn left(&self) -> Option<&Node<P, T>> {
        self.left.as_deref()
    }

    /// The child node holding points on the upper side of the split.
    #[inline]
    pub fn right(&self) -> Option<&Node<P, T>> {
        self.right.as_deref()
    }

    /// Returns `true` if this is a leaf node without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Returns `true` if this is an intermediate node with children.
    #[inline]
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }
}

impl<P: KdPoint + fmt::Debug, T: fmt::Debug> fmt::Debug for Node<P, T> {
    // Children are left out: printing them would recurse once per level.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("point", &self.point)
            .field("data", &self.data)
            .field("axis", &self.axis)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}
