//! Utilities to traverse the KDTree structure.

use std::iter::FusedIterator;

use tinyvec::TinyVec;

use crate::bounds::BoundingBox;
use crate::kdtree::{KDTree, Node};
use crate::point::KdPoint;

/// An in-order iterator over the points of a [`KDTree`] and their payloads.
///
/// Created by [`KDTree::iter`].
#[derive(Debug)]
pub struct Iter<'a, P: KdPoint, T> {
    stack: Vec<&'a Node<P, T>>,
    remaining: usize,
}

impl<'a, P: KdPoint, T> Iter<'a, P, T> {
    fn new(root: Option<&'a Node<P, T>>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<&'a Node<P, T>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left();
        }
    }
}

impl<'a, P: KdPoint, T> Iterator for Iter<'a, P, T> {
    type Item = (&'a P, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right());
        self.remaining -= 1;
        Some((&node.point, &node.data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P: KdPoint, T> ExactSizeIterator for Iter<'_, P, T> {}

impl<P: KdPoint, T> FusedIterator for Iter<'_, P, T> {}

impl<'a, P: KdPoint, T> IntoIterator for &'a KDTree<P, T> {
    type Item = (&'a P, &'a T);
    type IntoIter = Iter<'a, P, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<P: KdPoint, T> KDTree<P, T> {
    /// Iterate over every point and payload in in-order sequence.
    pub fn iter(&self) -> Iter<'_, P, T> {
        Iter::new(self.root(), self.num_items)
    }

    /// The number of nodes on the longest root-to-leaf path. Zero for an empty tree.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: TinyVec<[Option<(&Node<P, T>, usize)>; 32]> = TinyVec::new();
        stack.push(self.root().map(|root| (root, 1)));

        while let Some(next) = stack.pop() {
            let Some((node, depth)) = next else {
                continue;
            };
            max_depth = max_depth.max(depth);
            stack.push(node.left().map(|child| (child, depth + 1)));
            stack.push(node.right().map(|child| (child, depth + 1)));
        }
        max_depth
    }

    /// Visit every point whose subtree passes `bounds_test`.
    ///
    /// `bounds_test` receives the bounding box of each subtree before it is entered; returning
    /// `false` skips the subtree entirely. The point stored at the root of every entered subtree
    /// is handed to `visitor`. Subtrees are entered in pre-order, left before right.
    ///
    /// ```
    /// use std::cell::Cell;
    ///
    /// use kd_index::kdtree::KDTree;
    /// use kd_index::KdPoint;
    ///
    /// let points = [[0., 0., 0.], [4., 4., 4.], [9., 9., 9.]];
    /// let tree = KDTree::from_items(3, points.into_iter().zip(0u32..)).unwrap();
    ///
    /// let query = [5., 5., 5.];
    /// let best = Cell::new(f64::INFINITY);
    /// tree.visit(
    ///     |bounds| bounds.sq_exterior_distance(&query) < best.get(),
    ///     |point, _| best.set(best.get().min(point.sq_distance(&query))),
    /// );
    /// assert_eq!(best.get(), 3.0);
    /// ```
    pub fn visit<B, V>(&self, mut bounds_test: B, mut visitor: V)
    where
        B: FnMut(&BoundingBox<P::Num>) -> bool,
        V: FnMut(&P, &T),
    {
        let mut stack: TinyVec<[Option<&Node<P, T>>; 32]> = TinyVec::new();
        stack.push(self.root());

        while let Some(next) = stack.pop() {
            let Some(node) = next else {
                continue;
            };
            if !bounds_test(&node.bounds) {
                continue;
            }
            visitor(&node.point, &node.data);

            // Note: these are pushed in backwards order to what gets popped
            stack.push(node.right());
            stack.push(node.left());
        }
    }
}
