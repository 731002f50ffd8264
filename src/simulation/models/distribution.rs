//! Distribution models: initial placement of each batch of new nodes.

use crate::common::geometry::{Bounds, Position};
use crate::common::random::SimRng;

use super::DistributionModel;

/// Uniform over the whole bounding box.
#[derive(Debug, Clone, Default)]
pub struct RandomDistribution;

impl DistributionModel for RandomDistribution {
    fn name(&self) -> &str {
        "random"
    }

    fn positions(&mut self, bounds: &Bounds, count: usize, rng: &mut SimRng) -> Vec<Position> {
        (0..count)
            .map(|_| {
                Position::new(
                    rng.random_f64(bounds.x.min, bounds.x.max),
                    rng.random_f64(bounds.y.min, bounds.y.max),
                    rng.random_f64(bounds.z.min, bounds.z.max),
                )
            })
            .collect()
    }
}

/// Row-major lattice over x/y with `ceil(sqrt(count))` columns, cells
/// centered inside the bounds, `z = z.min`.
#[derive(Debug, Clone, Default)]
pub struct GridDistribution;

impl DistributionModel for GridDistribution {
    fn name(&self) -> &str {
        "grid"
    }

    fn positions(&mut self, bounds: &Bounds, count: usize, _rng: &mut SimRng) -> Vec<Position> {
        if count == 0 {
            return Vec::new();
        }
        let columns = (count as f64).sqrt().ceil() as usize;
        let rows = count.div_ceil(columns);
        let dx = bounds.x.span() / columns as f64;
        let dy = bounds.y.span() / rows as f64;
        (0..count)
            .map(|i| {
                let (row, col) = (i / columns, i % columns);
                Position::new(
                    bounds.x.min + dx * (col as f64 + 0.5),
                    bounds.y.min + dy * (row as f64 + 0.5),
                    bounds.z.min,
                )
            })
            .collect()
    }
}

/// Evenly spaced along the segment `from → to`, both ends included. Ends
/// outside the simulation bounds are clamped into them.
#[derive(Debug, Clone)]
pub struct LineDistribution {
    pub from: Position,
    pub to: Position,
}

impl DistributionModel for LineDistribution {
    fn name(&self) -> &str {
        "line"
    }

    fn positions(&mut self, bounds: &Bounds, count: usize, _rng: &mut SimRng) -> Vec<Position> {
        let (from, to) = (bounds.clamp(&self.from), bounds.clamp(&self.to));
        match count {
            0 => Vec::new(),
            1 => vec![from],
            _ => (0..count)
                .map(|i| {
                    let t = i as f64 / (count - 1) as f64;
                    Position::new(
                        from.x + (to.x - from.x) * t,
                        from.y + (to.y - from.y) * t,
                        from.z + (to.z - from.z) * t,
                    )
                })
                .collect(),
        }
    }
}

/// Hands out an explicit list of positions in order. Once exhausted it
/// returns fewer positions than requested.
#[derive(Debug, Clone)]
pub struct FixedPositions {
    pub positions: Vec<Position>,
    cursor: usize,
}

impl FixedPositions {
    pub fn new(positions: Vec<Position>) -> Self {
        FixedPositions { positions, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.positions.len() - self.cursor
    }
}

impl DistributionModel for FixedPositions {
    fn name(&self) -> &str {
        "fixed"
    }

    fn positions(&mut self, _bounds: &Bounds, count: usize, _rng: &mut SimRng) -> Vec<Position> {
        let end = (self.cursor + count).min(self.positions.len());
        let batch = self.positions[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }
}
