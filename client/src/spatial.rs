use std::sync::Arc;

use countymap_shared::projection::{Bounds, ProjectedShape};
use countymap_shared::{GeometryCollection, Region};

const GRID_COLS: usize = 64;
const GRID_ROWS: usize = 64;

/// Projected region outlines plus a flat grid over their bounds for hit-testing.
/// Rebuilt only when the geometry collection changes.
pub struct RegionIndex {
    collection: Option<Arc<GeometryCollection>>,
    /// One entry per region, `None` when the region has nothing drawable.
    shapes: Vec<Option<ProjectedShape>>,
    cells: Vec<Vec<usize>>,
    bounds: Bounds,
    cell_w: f64,
    cell_h: f64,
}

impl RegionIndex {
    pub fn empty() -> Self {
        Self {
            collection: None,
            shapes: Vec::new(),
            cells: Vec::new(),
            bounds: Bounds::EMPTY,
            cell_w: 1.0,
            cell_h: 1.0,
        }
    }

    pub fn build(collection: Option<&Arc<GeometryCollection>>) -> Self {
        let Some(collection) = collection else {
            return Self::empty();
        };

        let shapes: Vec<Option<ProjectedShape>> = collection
            .regions()
            .iter()
            .map(|region| {
                region
                    .boundary
                    .as_ref()
                    .and_then(ProjectedShape::from_boundary)
            })
            .collect();

        let bounds = shapes
            .iter()
            .flatten()
            .fold(Bounds::EMPTY, |acc, shape| acc.union(&shape.bounds));
        if bounds.is_empty() {
            return Self {
                collection: Some(Arc::clone(collection)),
                shapes,
                ..Self::empty()
            };
        }

        // Avoid zero-sized cells for degenerate extents
        let cell_w = ((bounds.max_x - bounds.min_x) / GRID_COLS as f64).max(f64::EPSILON);
        let cell_h = ((bounds.max_y - bounds.min_y) / GRID_ROWS as f64).max(f64::EPSILON);

        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];
        for (idx, shape) in shapes.iter().enumerate() {
            let Some(shape) = shape else {
                continue;
            };
            let b = &shape.bounds;
            let col_start = cell_of(b.min_x, bounds.min_x, cell_w, GRID_COLS);
            let col_end = cell_of(b.max_x, bounds.min_x, cell_w, GRID_COLS);
            let row_start = cell_of(b.min_y, bounds.min_y, cell_h, GRID_ROWS);
            let row_end = cell_of(b.max_y, bounds.min_y, cell_h, GRID_ROWS);

            for row in row_start..=row_end {
                for col in col_start..=col_end {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self {
            collection: Some(Arc::clone(collection)),
            shapes,
            cells,
            bounds,
            cell_w,
            cell_h,
        }
    }

    pub fn collection(&self) -> Option<&Arc<GeometryCollection>> {
        self.collection.as_ref()
    }

    /// Projected shapes with their index into the collection.
    pub fn shapes(&self) -> impl Iterator<Item = (usize, &ProjectedShape)> {
        self.shapes
            .iter()
            .enumerate()
            .filter_map(|(idx, shape)| shape.as_ref().map(|s| (idx, s)))
    }

    #[cfg(test)]
    pub fn world_bounds(&self) -> Option<Bounds> {
        (!self.bounds.is_empty()).then_some(self.bounds)
    }

    /// Index of the region containing a world point. Later features win where
    /// outlines overlap, matching draw order.
    pub fn find_at(&self, wx: f64, wy: f64) -> Option<usize> {
        if self.cells.is_empty() || !self.bounds.contains(wx, wy) {
            return None;
        }

        let col = cell_of(wx, self.bounds.min_x, self.cell_w, GRID_COLS);
        let row = cell_of(wy, self.bounds.min_y, self.cell_h, GRID_ROWS);

        self.cells[row * GRID_COLS + col]
            .iter()
            .rev()
            .copied()
            .find(|&idx| {
                self.shapes[idx]
                    .as_ref()
                    .is_some_and(|shape| shape.contains(wx, wy))
            })
    }

    pub fn region_at(&self, wx: f64, wy: f64) -> Option<Arc<Region>> {
        let idx = self.find_at(wx, wy)?;
        self.collection.as_ref()?.get(idx).cloned()
    }
}

fn cell_of(value: f64, origin: f64, size: f64, count: usize) -> usize {
    let cell = ((value - origin) / size).floor();
    if cell <= 0.0 {
        0
    } else {
        (cell as usize).min(count - 1)
    }
}
