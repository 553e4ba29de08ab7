use std::collections::HashSet;

use crate::collision::collision_pair::BodyPair;
use crate::core::BodyId;
use crate::math::Aabb;

/// A uniform spatial hash grid broadphase.
///
/// Covers a fixed world rectangle with square cells. A body is inserted
/// into every cell its AABB covers, clamped to the grid bounds, and
/// pairs are read back cell by cell with a per-query dedup set so bodies
/// spanning multiple cells are not reported twice.
///
/// Cheaper per frame than the tree when bodies are uniformly sized and
/// the domain is bounded.
#[derive(Debug)]
pub struct SpatialGrid {
    /// The world rectangle covered by the grid
    bounds: Aabb,

    /// The edge length of a square cell
    cell_size: f32,

    /// Number of columns
    cols: usize,

    /// Number of rows
    rows: usize,

    /// Body ids per cell, row-major
    cells: Vec<Vec<BodyId>>,

    /// Pair keys already emitted during the current query
    seen_pairs: HashSet<u64>,
}

impl SpatialGrid {
    /// Creates a new grid over the given bounds with the given cell size
    pub fn new(bounds: Aabb, cell_size: f32) -> Self {
        let extents = bounds.extents();
        let cols = (extents.x / cell_size).ceil().max(1.0) as usize;
        let rows = (extents.y / cell_size).ceil().max(1.0) as usize;

        Self {
            bounds,
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            seen_pairs: HashSet::new(),
        }
    }

    /// Returns the number of cells in the grid
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Empties all cells and the dedup set. Called at the start of
    /// every tick before reinsertion.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.seen_pairs.clear();
    }

    /// Returns the cell column/row covering a coordinate, clamped to
    /// the grid bounds
    fn cell_coords(&self, x: f32, y: f32) -> (usize, usize) {
        let col = ((x - self.bounds.min.x) / self.cell_size).floor();
        let row = ((y - self.bounds.min.y) / self.cell_size).floor();

        (
            (col.max(0.0) as usize).min(self.cols - 1),
            (row.max(0.0) as usize).min(self.rows - 1),
        )
    }

    /// Inserts a body into every cell its AABB covers
    pub fn insert(&mut self, body_id: BodyId, aabb: &Aabb) {
        let (min_col, min_row) = self.cell_coords(aabb.min.x, aabb.min.y);
        let (max_col, max_row) = self.cell_coords(aabb.max.x, aabb.max.y);

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.cells[row * self.cols + col].push(body_id);
            }
        }
    }

    /// Emits every unordered pair of bodies sharing a cell, exactly
    /// once. Cells are walked in row-major order so emission order is
    /// deterministic.
    pub fn collect_pairs(&mut self, out: &mut Vec<BodyPair>) {
        for cell in &self.cells {
            for i in 0..cell.len() {
                for j in (i + 1)..cell.len() {
                    let pair = BodyPair::new(cell[i], cell[j]);
                    if self.seen_pairs.insert(pair.key()) {
                        out.push(pair);
                    }
                }
            }
        }
    }
}
