//! Uniform hash grid for broad-phase neighbor queries
//!
//! Objects are bucketed by the integer cell containing their position. A
//! reverse map remembers each object's cell so moves and removals never
//! scan the grid.
//!
//! Queries over-approximate: callers filter by exact distance themselves.

use std::collections::HashMap;

use thiserror::Error;

use super::state::ObjectId;

/// Integer cell coordinate
pub type CellKey = (i32, i32);

/// Errors emitted while building a grid
#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("invalid cell size {0}: must be positive and finite")]
    InvalidCellSize(f64),
}

/// Uniform spatial hash grid keyed by object id
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<ObjectId>>,
    object_cells: HashMap<ObjectId, CellKey>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Result<Self, GridError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GridError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
            object_cells: HashMap::new(),
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing a world position
    #[inline]
    pub fn cell_key(&self, x: f64, y: f64) -> CellKey {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Track an object. Re-inserting a tracked id moves it instead of
    /// duplicating it.
    pub fn insert(&mut self, id: ObjectId, x: f64, y: f64) {
        if self.object_cells.contains_key(&id) {
            self.move_to(id, x, y);
            return;
        }
        let key = self.cell_key(x, y);
        self.cells.entry(key).or_default().push(id);
        self.object_cells.insert(id, key);
    }

    /// Stop tracking an object. Unknown ids are ignored.
    pub fn remove(&mut self, id: ObjectId) {
        let Some(key) = self.object_cells.remove(&id) else {
            return;
        };
        self.detach(id, key);
    }

    /// Update an object's cell after it moved. No-op when the cell is
    /// unchanged; an untracked id is inserted.
    pub fn move_to(&mut self, id: ObjectId, x: f64, y: f64) {
        let new_key = self.cell_key(x, y);
        match self.object_cells.get(&id).copied() {
            Some(old_key) if old_key == new_key => {}
            Some(old_key) => {
                self.detach(id, old_key);
                self.cells.entry(new_key).or_default().push(id);
                self.object_cells.insert(id, new_key);
            }
            None => {
                self.cells.entry(new_key).or_default().push(id);
                self.object_cells.insert(id, new_key);
            }
        }
    }

    fn detach(&mut self, id: ObjectId, key: CellKey) {
        if let Some(bucket) = self.cells.get_mut(&key) {
            bucket.retain(|&other| other != id);
            if bucket.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Every id in cells within `ceil(radius / cell_size)` of the query
    /// cell on both axes
    pub fn query_radius(&self, x: f64, y: f64, radius: f64) -> Vec<ObjectId> {
        let reach = (radius.max(0.0) / self.cell_size).ceil() as i32;
        let (cx, cy) = self.cell_key(x, y);

        let mut candidates = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    candidates.extend_from_slice(bucket);
                }
            }
        }
        candidates
    }

    /// Ids sharing the query point's cell (diagnostics)
    pub fn cell_contents(&self, x: f64, y: f64) -> &[ObjectId] {
        self.cells
            .get(&self.cell_key(x, y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn cell_of(&self, id: ObjectId) -> Option<CellKey> {
        self.object_cells.get(&id).copied()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.object_cells.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.object_cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_cells.is_empty()
    }

    /// Check forward and reverse maps agree: each tracked id sits in exactly
    /// the cell the reverse map names, and nowhere else.
    pub fn is_consistent(&self) -> bool {
        let forward_total: usize = self.cells.values().map(Vec::len).sum();
        if forward_total != self.object_cells.len() {
            return false;
        }
        self.object_cells.iter().all(|(id, key)| {
            self.cells
                .get(key)
                .is_some_and(|bucket| bucket.iter().filter(|&&other| other == *id).count() == 1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_bad_cell_size() {
        assert_eq!(SpatialGrid::new(0.0).unwrap_err(), GridError::InvalidCellSize(0.0));
        assert!(SpatialGrid::new(-1.0).is_err());
        assert!(SpatialGrid::new(f64::NAN).is_err());
    }

    #[test]
    fn test_negative_coordinates_floor() {
        let grid = SpatialGrid::new(5.0).unwrap();
        assert_eq!(grid.cell_key(-0.1, 4.9), (-1, 0));
        assert_eq!(grid.cell_key(-5.0, -5.1), (-1, -2));
    }

    #[test]
    fn test_insert_move_remove() {
        let mut grid = SpatialGrid::new(5.0).unwrap();
        let id = ObjectId(1);
        grid.insert(id, 1.0, 1.0);
        assert_eq!(grid.cell_of(id), Some((0, 0)));
        assert_eq!(grid.cell_contents(2.0, 2.0), &[id]);

        // Same cell: nothing changes
        grid.move_to(id, 4.0, 4.0);
        assert_eq!(grid.cell_of(id), Some((0, 0)));

        grid.move_to(id, 12.0, -3.0);
        assert_eq!(grid.cell_of(id), Some((2, -1)));
        assert!(grid.cell_contents(1.0, 1.0).is_empty());
        assert!(grid.is_consistent());

        grid.remove(id);
        assert!(grid.is_empty());
        assert!(grid.cell_contents(12.0, -3.0).is_empty());
        // Removing twice is harmless
        grid.remove(id);
        assert!(grid.is_consistent());
    }

    #[test]
    fn test_query_radius_reach() {
        let mut grid = SpatialGrid::new(5.0).unwrap();
        grid.insert(ObjectId(1), 0.0, 0.0);
        grid.insert(ObjectId(2), 9.0, 0.0);
        grid.insert(ObjectId(3), 30.0, 30.0);

        let found = grid.query_radius(1.0, 1.0, 5.0);
        assert!(found.contains(&ObjectId(1)));
        assert!(found.contains(&ObjectId(2)));
        assert!(!found.contains(&ObjectId(3)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u32, f64, f64),
        Move(u32, f64, f64),
        Remove(u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let id = 0u32..12;
        let c = -100.0f64..100.0;
        prop_oneof![
            (id.clone(), c.clone(), c.clone()).prop_map(|(i, x, y)| Op::Insert(i, x, y)),
            (id.clone(), c.clone(), c.clone()).prop_map(|(i, x, y)| Op::Move(i, x, y)),
            id.prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_grid_stays_consistent(ops in prop::collection::vec(op_strategy(), 1..80)) {
            let mut grid = SpatialGrid::new(7.5).unwrap();
            let mut last: HashMap<ObjectId, (f64, f64)> = HashMap::new();

            for op in ops {
                match op {
                    Op::Insert(i, x, y) => {
                        grid.insert(ObjectId(i), x, y);
                        last.insert(ObjectId(i), (x, y));
                    }
                    Op::Move(i, x, y) => {
                        grid.move_to(ObjectId(i), x, y);
                        last.insert(ObjectId(i), (x, y));
                    }
                    Op::Remove(i) => {
                        grid.remove(ObjectId(i));
                        last.remove(&ObjectId(i));
                    }
                }
            }

            prop_assert!(grid.is_consistent());
            prop_assert_eq!(grid.len(), last.len());
            for (id, (x, y)) in &last {
                prop_assert_eq!(grid.cell_of(*id), Some(grid.cell_key(*x, *y)));
            }
        }

        #[test]
        fn prop_query_is_superset(
            points in prop::collection::vec((-60.0f64..60.0, -60.0f64..60.0), 1..40),
            qx in -60.0f64..60.0,
            qy in -60.0f64..60.0,
            r in 0.0f64..40.0,
        ) {
            let mut grid = SpatialGrid::new(5.0).unwrap();
            for (i, (x, y)) in points.iter().enumerate() {
                grid.insert(ObjectId(i as u32), *x, *y);
            }
            let found = grid.query_radius(qx, qy, r);
            for (i, (x, y)) in points.iter().enumerate() {
                let d = ((x - qx).powi(2) + (y - qy).powi(2)).sqrt();
                if d <= r {
                    prop_assert!(found.contains(&ObjectId(i as u32)));
                }
            }
        }
    }
}
