use rand::Rng;

use crate::kdtree::{KDTree, SplitPolicy};
use crate::point::KdPoint;
use crate::test::{
    balanced_depth, brute_nearest, brute_range, brute_within, build, check_tree, random_points,
    rng,
};
use crate::BoundingBox;

const POLICIES: [SplitPolicy; 2] = [SplitPolicy::RoundRobin, SplitPolicy::MaxSpread];

fn sorted_ids<'a>(ids: impl IntoIterator<Item = &'a u32>) -> Vec<u32> {
    let mut ids: Vec<u32> = ids.into_iter().copied().collect();
    ids.sort();
    ids
}

fn random_region(rng: &mut impl Rng, dim: usize) -> BoundingBox<f64> {
    let mut min = Vec::with_capacity(dim);
    let mut max = Vec::with_capacity(dim);
    for _ in 0..dim {
        let a: f64 = rng.gen_range(-1100.0..1100.0);
        let b: f64 = rng.gen_range(-1100.0..1100.0);
        min.push(a.min(b));
        max.push(a.max(b));
    }
    BoundingBox::new(&min, &max).unwrap()
}

#[test]
fn partition_invariant_holds() {
    let mut rng = rng(1);
    for dim in 2..=6 {
        for n in [0, 1, 2, 3, 17, 1000, 10_000] {
            let points = random_points(&mut rng, n, dim);
            for policy in POLICIES {
                let tree = build(&points, dim, policy);
                assert_eq!(check_tree(&tree), n);
                assert_eq!(tree.depth(), balanced_depth(n), "dim {} n {}", dim, n);
            }
        }
    }
}

#[test]
fn nearest_matches_brute_force() {
    let mut rng = rng(2);
    for dim in 2..=6 {
        for n in [1, 5, 100, 2000] {
            let points = random_points(&mut rng, n, dim);
            let queries = random_points(&mut rng, 10, dim);
            for policy in POLICIES {
                let tree = build(&points, dim, policy);
                for m in [1, 3, 10, n, n + 5] {
                    for query in queries.iter().chain(points.iter().take(5)) {
                        let result = tree.nearest(query, m).unwrap();
                        let dists: Vec<f64> = result.iter().map(|c| c.sq_dist).collect();
                        assert_eq!(dists, brute_nearest(&points, query, m));
                        for neighbor in &result {
                            assert_eq!(neighbor.sq_dist, neighbor.point.sq_distance(query));
                            assert_eq!(points[*neighbor.data as usize], *neighbor.point);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn range_matches_brute_force() {
    let mut rng = rng(3);
    for dim in 2..=6 {
        let points = random_points(&mut rng, 3000, dim);
        for policy in POLICIES {
            let tree = build(&points, dim, policy);
            for _ in 0..25 {
                let region = random_region(&mut rng, dim);
                let result = tree.range_box(&region).unwrap();
                let ids = sorted_ids(result.iter().map(|(_, id)| *id));
                assert_eq!(ids, brute_range(&points, &region));
            }
        }
    }
}

#[test]
fn within_matches_brute_force() {
    let mut rng = rng(4);
    for dim in 2..=4 {
        let points = random_points(&mut rng, 3000, dim);
        let tree = build(&points, dim, SplitPolicy::RoundRobin);
        for query in random_points(&mut rng, 20, dim) {
            let radius = rng.gen_range(0.0..600.0);
            let result = tree.within(&query, radius).unwrap();
            let ids = sorted_ids(result.iter().map(|n| n.data));
            assert_eq!(ids, brute_within(&points, &query, radius));
        }
    }
}

#[test]
fn integer_points_with_many_ties() {
    let mut rng = rng(5);
    let points: Vec<[i8; 3]> = (0..2000)
        .map(|_| {
            [
                rng.gen_range(-4..=4),
                rng.gen_range(-4..=4),
                rng.gen_range(-4..=4),
            ]
        })
        .collect();

    for policy in POLICIES {
        let tree = build(&points, 3, policy);
        check_tree(&tree);
        assert_eq!(tree.depth(), balanced_depth(points.len()));

        for query in [[0i8, 0, 0], [4, 4, 4], [-3, 2, 1]] {
            let dists: Vec<f64> = tree
                .nearest(&query, 40)
                .unwrap()
                .iter()
                .map(|n| n.sq_dist)
                .collect();
            assert_eq!(dists, brute_nearest(&points, &query, 40));
        }

        let region = BoundingBox::new(&[-1, 0, 2], &[1, 0, 4]).unwrap();
        let ids = sorted_ids(tree.range_box(&region).unwrap().iter().map(|(_, id)| *id));
        assert_eq!(ids, brute_range(&points, &region));
    }
}

#[test]
fn skewed_points() {
    // Points along a thin diagonal band, where the widest axis changes between subsets
    let mut rng = rng(6);
    let points: Vec<[f32; 2]> = (0..5000)
        .map(|_| {
            let t: f32 = rng.gen_range(0.0..1000.0);
            [t, t * 0.01 + rng.gen_range(0.0..0.5)]
        })
        .collect();

    for policy in POLICIES {
        let tree = build(&points, 2, policy);
        check_tree(&tree);
        for query in [[500f32, 5.], [0., 0.], [999., -3.]] {
            let dists: Vec<f64> = tree
                .nearest(&query, 7)
                .unwrap()
                .iter()
                .map(|n| n.sq_dist)
                .collect();
            assert_eq!(dists, brute_nearest(&points, &query, 7));
        }
    }
}

#[test]
fn rebuild_after_random_inserts_keeps_points() {
    let mut rng = rng(7);
    for dim in [2, 3, 5] {
        let points = random_points(&mut rng, 1500, dim);
        let (initial, inserted) = points.split_at(500);

        let mut tree = build(initial, dim, SplitPolicy::RoundRobin);
        for (offset, point) in inserted.iter().enumerate() {
            tree.insert(point.clone(), (500 + offset) as u32).unwrap();
        }
        assert_eq!(tree.len(), 1500);
        check_tree(&tree);

        let query = &points[42];
        let before: Vec<f64> = tree
            .nearest(query, 25)
            .unwrap()
            .iter()
            .map(|n| n.sq_dist)
            .collect();
        assert_eq!(before, brute_nearest(&points, query, 25));

        tree.rebuild();
        assert_eq!(check_tree(&tree), 1500);
        assert_eq!(tree.depth(), balanced_depth(1500));

        let ids = sorted_ids(tree.iter().map(|(_, id)| id));
        assert_eq!(ids, (0..1500).collect::<Vec<u32>>());
        for (point, id) in tree.iter() {
            assert_eq!(*point, points[*id as usize]);
        }

        let after: Vec<f64> = tree
            .nearest(query, 25)
            .unwrap()
            .iter()
            .map(|n| n.sq_dist)
            .collect();
        assert_eq!(before, after);
    }
}

#[test]
fn growing_from_empty_matches_bulk_build() {
    let mut rng = rng(8);
    let points = random_points(&mut rng, 800, 4);

    let mut grown = KDTree::<Vec<f64>, u32>::new(4).unwrap();
    for (id, point) in points.iter().enumerate() {
        grown.insert(point.clone(), id as u32).unwrap();
    }
    let bulk = build(&points, 4, SplitPolicy::RoundRobin);

    for query in random_points(&mut rng, 10, 4) {
        let region = random_region(&mut rng, 4);
        let a = sorted_ids(grown.range_box(&region).unwrap().iter().map(|(_, id)| *id));
        let b = sorted_ids(bulk.range_box(&region).unwrap().iter().map(|(_, id)| *id));
        assert_eq!(a, b);

        let a: Vec<f64> = grown.nearest(&query, 9).unwrap().iter().map(|n| n.sq_dist).collect();
        let b: Vec<f64> = bulk.nearest(&query, 9).unwrap().iter().map(|n| n.sq_dist).collect();
        assert_eq!(a, b);
    }
}

#[test]
fn repeated_queries_are_identical() {
    let mut rng = rng(9);
    let points = random_points(&mut rng, 5000, 3);
    let tree = build(&points, 3, SplitPolicy::MaxSpread);

    let query = [1.0, -2.0, 3.0];
    let first = tree.nearest(&query, 64).unwrap();
    for _ in 0..10 {
        let again = tree.nearest(&query, 64).unwrap();
        assert_eq!(again.len(), first.len());
        for (a, b) in again.iter().zip(&first) {
            assert!(std::ptr::eq(a.point, b.point));
            assert_eq!(a.sq_dist.to_bits(), b.sq_dist.to_bits());
        }
    }
}

#[test]
fn from_items_accepts_any_point_type() {
    let tuples = vec![((1u16, 2u16), "a"), ((3, 4), "b"), ((0, 9), "c")];
    let tree = KDTree::from_items(2, tuples).unwrap();
    let nearest = tree.nearest_one(&[3u16, 3]).unwrap().unwrap();
    assert_eq!(*nearest.data, "b");
    assert_eq!(nearest.sq_dist, 1.);

    let slice: &[u16] = &[0, 8];
    assert_eq!(*tree.nearest_one(slice).unwrap().unwrap().data, "c");
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_batches_match_sequential_queries() {
    let mut rng = rng(10);
    let points = random_points(&mut rng, 4000, 3);
    let tree = build(&points, 3, SplitPolicy::RoundRobin);

    let queries = random_points(&mut rng, 64, 3);
    let batch = tree.nearest_batch(&queries, 5).unwrap();
    for (query, result) in queries.iter().zip(batch) {
        assert_eq!(result, tree.nearest(query, 5).unwrap());
    }

    let regions: Vec<_> = (0..16).map(|_| random_region(&mut rng, 3)).collect();
    let batch = tree.range_batch(&regions).unwrap();
    for (region, result) in regions.iter().zip(batch) {
        assert_eq!(result, tree.range_box(region).unwrap());
    }

    let bad = vec![vec![0.0, 0.0]];
    assert!(tree.nearest_batch(&bad, 5).is_err());
}
