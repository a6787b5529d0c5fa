//! Shared helpers for tests comparing tree queries against linear scans.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::kdtree::{KDTree, KDTreeBuilder, Node, SplitPolicy};
use crate::point::KdPoint;
use crate::BoundingBox;

mod integration;

pub(crate) fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `n` points uniformly spread over `[-1000, 1000)` in `dim` dimensions.
pub(crate) fn random_points(rng: &mut StdRng, n: usize, dim: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1000.0..1000.0)).collect())
        .collect()
}

/// Build a tree whose payloads are the positions of the points in `points`.
pub(crate) fn build<P: KdPoint + Clone>(
    points: &[P],
    dim: usize,
    policy: SplitPolicy,
) -> KDTree<P, u32> {
    let mut builder =
        KDTreeBuilder::<P, u32>::with_capacity(dim, points.len()).split_policy(policy);
    for point in points {
        builder.add(point.clone()).unwrap();
    }
    builder.finish().unwrap()
}

/// The `m` smallest squared distances from `query`, ascending.
pub(crate) fn brute_nearest<P, Q>(points: &[P], query: &Q, m: usize) -> Vec<f64>
where
    P: KdPoint,
    Q: KdPoint<Num = P::Num> + ?Sized,
{
    let mut dists: Vec<f64> = points.iter().map(|p| p.sq_distance(query)).collect();
    dists.sort_by(|a, b| a.total_cmp(b));
    dists.truncate(m);
    dists
}

/// Positions of the points inside `region`, ascending.
pub(crate) fn brute_range<P: KdPoint>(points: &[P], region: &BoundingBox<P::Num>) -> Vec<u32> {
    (0..points.len() as u32)
        .filter(|&i| region.contains(&points[i as usize]))
        .collect()
}

/// Positions of the points within `radius` of `query`, ascending.
pub(crate) fn brute_within<P, Q>(points: &[P], query: &Q, radius: f64) -> Vec<u32>
where
    P: KdPoint,
    Q: KdPoint<Num = P::Num> + ?Sized,
{
    (0..points.len() as u32)
        .filter(|&i| points[i as usize].sq_distance(query) <= radius * radius)
        .collect()
}

/// Walk the whole tree checking the partition invariant and the cached bounding boxes.
///
/// Returns the number of nodes.
pub(crate) fn check_tree<P: KdPoint, T>(tree: &KDTree<P, T>) -> usize {
    let Some(root) = tree.root() else {
        return 0;
    };

    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        count += 1;
        assert!(node.axis() < tree.dim());

        let expected = subtree_bounds(node);
        assert_eq!(node.bounds(), &expected, "cached bounds match subtree");

        let axis = node.axis();
        let value = node.split_value();
        if let Some(left) = node.left() {
            assert!(left.bounds().max()[axis] <= value, "left subtree above split");
            stack.push(left);
        }
        if let Some(right) = node.right() {
            assert!(right.bounds().min()[axis] >= value, "right subtree below split");
            stack.push(right);
        }
    }
    assert_eq!(count, tree.len());
    count
}

fn subtree_bounds<P: KdPoint, T>(node: &Node<P, T>) -> BoundingBox<P::Num> {
    let mut bounds = BoundingBox::from_point(node.point());
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        bounds.extend(node.point());
        stack.extend(node.left());
        stack.extend(node.right());
    }
    bounds
}

/// The smallest depth a binary tree over `n` nodes can have.
pub(crate) fn balanced_depth(n: usize) -> usize {
    (usize::BITS - n.leading_zeros()) as usize
}
