//! 2D k-d tree over property points
//!
//! Answers the radius queries used to find the neighbors of each point
//! in O(log n + k) instead of scanning the whole dataset.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use coastview_core::PropertyPoint;

/// A 2D k-d tree for radius queries on property points.
#[derive(Debug)]
pub struct PointIndex {
    nodes: Vec<KdNode>,
    points: Vec<PropertyPoint>,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension: 0 = x, 1 = y
    split_dim: u8,
    left: Option<usize>,
    right: Option<usize>,
}

impl PointIndex {
    /// Build the index using median-of-coordinate splitting, O(n log² n).
    ///
    /// Points with a non-finite coordinate are kept in [`points`](Self::points)
    /// but never become tree nodes, so they cannot prune valid subtrees and
    /// no radius query returns them.
    pub fn build(points: Vec<PropertyPoint>) -> Self {
        let mut indices: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].x.is_finite() && points[i].y.is_finite())
            .collect();
        let mut nodes = Vec::with_capacity(indices.len());
        if !indices.is_empty() {
            build_recursive(&points, &mut indices, 0, &mut nodes);
        }
        Self { nodes, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All indexed points, in the order they were given
    pub fn points(&self) -> &[PropertyPoint] {
        &self.points
    }

    /// All points within `radius` of (qx, qy), boundary included.
    ///
    /// Returns results in no particular order.
    pub fn within_radius(&self, qx: f64, qy: f64, radius: f64) -> Vec<&PropertyPoint> {
        let mut results = Vec::new();
        if self.nodes.is_empty() || !(radius >= 0.0) {
            return results;
        }
        self.radius_recursive(0, qx, qy, radius * radius, &mut results);
        results
    }

    fn radius_recursive<'a>(
        &'a self,
        node_idx: usize,
        qx: f64,
        qy: f64,
        radius_sq: f64,
        results: &mut Vec<&'a PropertyPoint>,
    ) {
        let node = &self.nodes[node_idx];
        let p = &self.points[node.point_idx];

        if p.dist_sq(qx, qy) <= radius_sq {
            results.push(p);
        }

        let diff = if node.split_dim == 0 { qx - p.x } else { qy - p.y };
        let near_plane = diff * diff <= radius_sq;

        if let Some(left) = node.left {
            if diff < 0.0 || near_plane {
                self.radius_recursive(left, qx, qy, radius_sq, results);
            }
        }
        if let Some(right) = node.right {
            if diff >= 0.0 || near_plane {
                self.radius_recursive(right, qx, qy, radius_sq, results);
            }
        }
    }
}

fn build_recursive(
    points: &[PropertyPoint],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let n = indices.len();
    let split_dim = (depth % 2) as u8;
    let coord = |i: usize| if split_dim == 0 { points[i].x } else { points[i].y };

    indices.sort_by(|&a, &b| coord(a).total_cmp(&coord(b)));

    let median = n / 2;
    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx: indices[median],
        split_dim,
        left: None,
        right: None,
    });

    let (left, rest) = indices.split_at_mut(median);
    let right = &mut rest[1..];

    if !left.is_empty() {
        let child = build_recursive(points, left, depth + 1, nodes);
        nodes[node_idx].left = Some(child);
    }
    if !right.is_empty() {
        let child = build_recursive(points, right, depth + 1, nodes);
        nodes[node_idx].right = Some(child);
    }

    node_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice() -> Vec<PropertyPoint> {
        let mut points = Vec::new();
        for i in 0..20 {
            for j in 0..15 {
                let id = points.len() as u64;
                // Jitter so coordinates are not all on split planes
                let x = i as f64 * 10.0 + ((i * 7 + j * 3) % 5) as f64;
                let y = j as f64 * 10.0 - ((i * 11 + j) % 4) as f64;
                points.push(PropertyPoint::new(id, x, y));
            }
        }
        points
    }

    #[test]
    fn test_empty_index() {
        let index = PointIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.within_radius(0.0, 0.0, 100.0).is_empty());
    }

    #[test]
    fn test_within_radius_matches_brute_force() {
        let points = lattice();
        let index = PointIndex::build(points.clone());
        assert_eq!(index.len(), points.len());

        for &(qx, qy, r) in &[(50.0, 50.0, 25.0), (0.0, 0.0, 40.0), (195.0, 140.0, 60.0), (97.3, 61.1, 13.0)] {
            let mut found: Vec<u64> = index.within_radius(qx, qy, r).iter().map(|p| p.id).collect();
            let mut expected: Vec<u64> = points
                .iter()
                .filter(|p| p.dist_sq(qx, qy) <= r * r)
                .map(|p| p.id)
                .collect();
            found.sort_unstable();
            expected.sort_unstable();
            assert_eq!(found, expected, "query ({}, {}, {})", qx, qy, r);
        }
    }

    #[test]
    fn test_duplicate_coordinates() {
        let points: Vec<PropertyPoint> = (0..9).map(|id| PropertyPoint::new(id, 5.0, 5.0)).collect();
        let index = PointIndex::build(points);
        assert_eq!(index.within_radius(5.0, 5.0, 0.0).len(), 9);
        assert_eq!(index.within_radius(100.0, 5.0, 1.0).len(), 0);
    }

    #[test]
    fn test_non_finite_points_not_indexed() {
        let index = PointIndex::build(vec![
            PropertyPoint::new(1, 0.0, 0.0),
            PropertyPoint::new(2, f64::NAN, 0.0),
        ]);
        assert_eq!(index.len(), 2);
        let found: Vec<u64> = index.within_radius(0.0, 0.0, 50.0).iter().map(|p| p.id).collect();
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn test_non_finite_points_do_not_hide_neighbors() {
        let mut points = lattice();
        let clean = PointIndex::build(points.clone());
        let next = points.len() as u64;
        points.push(PropertyPoint::new(next, f64::NAN, 0.0));
        points.push(PropertyPoint::new(next + 1, 40.0, f64::INFINITY));
        points.push(PropertyPoint::new(next + 2, f64::NAN, f64::NAN));
        let dirty = PointIndex::build(points);

        for &(qx, qy, r) in &[(50.0, 50.0, 25.0), (0.0, 0.0, 40.0), (195.0, 140.0, 60.0)] {
            let mut a: Vec<u64> = clean.within_radius(qx, qy, r).iter().map(|p| p.id).collect();
            let mut b: Vec<u64> = dirty.within_radius(qx, qy, r).iter().map(|p| p.id).collect();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b, "query ({}, {}, {})", qx, qy, r);
        }
    }

    #[test]
    fn test_boundary_included() {
        let index = PointIndex::build(vec![PropertyPoint::new(1, 3.0, 4.0)]);
        assert_eq!(index.within_radius(0.0, 0.0, 5.0).len(), 1);
    }
}
