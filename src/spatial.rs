//! Spatial bucketing for bounded neighbor queries.
//!
//! Particles are hashed into uniform cells keyed by their truncated
//! coordinates. With the cell size at least the connection distance, every
//! in-range pair is guaranteed to sit within one cell of each other, so
//! candidate search scans only the 3×3 neighborhood instead of all pairs.
//!
//! The grid is ephemeral: rebuilt from scratch before each query frame and
//! never persisted. Its only invariant is that every index appears in
//! exactly the cell matching its position at rebuild time.

use glam::Vec2;
use std::collections::HashMap;

/// An unordered pair of particles within connection range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// Index of the first particle; always greater than `b`.
    pub a: usize,
    /// Index of the second particle.
    pub b: usize,
    /// Euclidean distance between the two at query time.
    pub distance: f32,
}

/// Uniform-cell spatial index over particle positions.
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    /// Create an empty grid. `cell_size` must be at least the largest query
    /// radius for [`pairs_within`](Self::pairs_within) to be exhaustive.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Side length of one cell in pixels.
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell coordinate containing `pos`.
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Rebuild the grid from current positions, replacing all previous
    /// contents. Cell vectors are reused across rebuilds to avoid
    /// reallocating every frame.
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        for (index, &pos) in positions.iter().enumerate() {
            let cell = self.cell_of(pos);
            self.cells.entry(cell).or_default().push(index);
        }
    }

    /// Indices bucketed in the given cell, if any.
    pub fn cell(&self, cell: (i32, i32)) -> &[usize] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Collect every unordered pair within `max_distance`, each emitted
    /// exactly once.
    ///
    /// For each particle only the 3×3 surrounding cells are scanned, and a
    /// candidate is taken only when its index is lower — the pair (a, b)
    /// with a > b is found during a's scan and never during b's.
    /// Requires `max_distance <= cell_size`.
    pub fn pairs_within(&self, positions: &[Vec2], max_distance: f32, out: &mut Vec<Pair>) {
        out.clear();
        let max_sq = max_distance * max_distance;

        for (a, &pos) in positions.iter().enumerate() {
            let (cx, cy) = self.cell_of(pos);
            for nx in (cx - 1)..=(cx + 1) {
                for ny in (cy - 1)..=(cy + 1) {
                    for &b in self.cell((nx, ny)) {
                        if b >= a {
                            continue;
                        }
                        let dist_sq = pos.distance_squared(positions[b]);
                        if dist_sq < max_sq {
                            out.push(Pair {
                                a,
                                b,
                                distance: dist_sq.sqrt(),
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(positions: &[Vec2], max_distance: f32) -> Vec<Pair> {
        let mut grid = SpatialGrid::new(max_distance);
        grid.rebuild(positions);
        let mut out = Vec::new();
        grid.pairs_within(positions, max_distance, &mut out);
        out
    }

    #[test]
    fn test_cell_of_truncates_toward_negative() {
        let grid = SpatialGrid::new(100.0);
        assert_eq!(grid.cell_of(Vec2::new(50.0, 250.0)), (0, 2));
        assert_eq!(grid.cell_of(Vec2::new(-10.0, -0.5)), (-1, -1));
    }

    #[test]
    fn test_rebuild_buckets_every_index_once() {
        let positions = vec![
            Vec2::new(10.0, 10.0),
            Vec2::new(20.0, 15.0),
            Vec2::new(150.0, 10.0),
            Vec2::new(310.0, 420.0),
        ];
        let mut grid = SpatialGrid::new(100.0);
        grid.rebuild(&positions);

        assert_eq!(grid.cell((0, 0)), &[0, 1]);
        assert_eq!(grid.cell((1, 0)), &[2]);
        assert_eq!(grid.cell((3, 4)), &[3]);
        assert!(grid.cell((9, 9)).is_empty());
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let mut grid = SpatialGrid::new(100.0);
        grid.rebuild(&[Vec2::new(10.0, 10.0)]);
        grid.rebuild(&[Vec2::new(250.0, 10.0)]);
        assert!(grid.cell((0, 0)).is_empty());
        assert_eq!(grid.cell((2, 0)), &[0]);
    }

    #[test]
    fn test_pairs_no_double_counting() {
        // A tight cluster: every pair is in range; each must appear once.
        let positions: Vec<Vec2> = (0..8)
            .map(|i| Vec2::new(100.0 + i as f32 * 3.0, 100.0))
            .collect();
        let found = pairs(&positions, 120.0);
        assert_eq!(found.len(), 8 * 7 / 2);

        let mut seen = std::collections::HashSet::new();
        for pair in &found {
            assert!(pair.a > pair.b);
            assert!(seen.insert((pair.a, pair.b)), "duplicate {pair:?}");
        }
    }

    #[test]
    fn test_pairs_match_brute_force() {
        // Deterministic pseudo-random scatter across several cells.
        let positions: Vec<Vec2> = (0u32..60)
            .map(|i| {
                let x = (i.wrapping_mul(2_654_435_761) % 1000) as f32 * 0.8;
                let y = (i.wrapping_mul(40_503) % 700) as f32 * 0.9;
                Vec2::new(x, y)
            })
            .collect();
        let max_distance = 120.0;

        let mut expected = Vec::new();
        for a in 0..positions.len() {
            for b in 0..a {
                let d = positions[a].distance(positions[b]);
                if d < max_distance {
                    expected.push((a, b));
                }
            }
        }

        let mut found: Vec<(usize, usize)> =
            pairs(&positions, max_distance).iter().map(|p| (p.a, p.b)).collect();
        found.sort_unstable();
        expected.sort_unstable();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_pairs_same_x_ties_counted_once() {
        // Two particles sharing an x coordinate; a coordinate tie-break
        // would emit this pair twice or not at all.
        let positions = vec![Vec2::new(100.0, 100.0), Vec2::new(100.0, 140.0)];
        let found = pairs(&positions, 120.0);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].a, found[0].b), (1, 0));
        assert!((found[0].distance - 40.0).abs() < 0.001);
    }

    #[test]
    fn test_pairs_out_of_range_excluded() {
        let positions = vec![Vec2::new(0.0, 0.0), Vec2::new(121.0, 0.0)];
        assert!(pairs(&positions, 120.0).is_empty());
    }

    #[test]
    fn test_empty_positions() {
        let found = pairs(&[], 120.0);
        assert!(found.is_empty());
    }
}
