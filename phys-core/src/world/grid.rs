//! Uniform grid broad phase.
//!
//! The world rectangle is split into `columns * rows` equal cells, indexed
//! row-major from the bottom-left:
//!
//! ```text
//!   row 1 │ 2 │ 3 │
//!   row 0 │ 0 │ 1 │
//!          col0 col1
//! ```
//!
//! A body is a member of every cell its collider bounding boxes touch.
//! Bodies outside the world rectangle belong to no cell and are never
//! tested.

use std::collections::BTreeSet;

use crate::body::{Body, BodyHandle};
use crate::collision::ContactEvaluator;
use crate::config::WorldConfig;
use crate::error::PhysError;
use crate::types::{Rect, Vec2};

/// Upper bound on `columns * rows`.
pub const MAX_PARTITIONS: usize = 1 << 16;

#[derive(Debug)]
pub(crate) struct PartitionGrid {
    origin: Vec2,
    cell_size: Vec2,
    columns: usize,
    cells: Vec<BTreeSet<BodyHandle>>,
}

impl PartitionGrid {
    pub fn new(config: &WorldConfig) -> Result<Self, PhysError> {
        let finite = config.origin.x.is_finite()
            && config.origin.y.is_finite()
            && config.size.x.is_finite()
            && config.size.y.is_finite();
        if !(finite && config.size.x > 0.0 && config.size.y > 0.0) {
            return Err(PhysError::InvalidWorldBounds {
                width: config.size.x,
                height: config.size.y,
            });
        }

        let count = config
            .columns
            .checked_mul(config.rows)
            .filter(|count| (1..=MAX_PARTITIONS).contains(count))
            .ok_or(PhysError::InvalidGrid {
                columns: config.columns,
                rows: config.rows,
            })?;

        Ok(Self {
            origin: config.origin,
            cell_size: Vec2::new(
                config.size.x / config.columns as f64,
                config.size.y / config.rows as f64,
            ),
            columns: config.columns,
            cells: vec![BTreeSet::new(); count],
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_rect(&self, index: usize) -> Result<Rect, PhysError> {
        self.check(index)?;
        let column = (index % self.columns) as f64;
        let row = (index / self.columns) as f64;
        Ok(Rect::new(
            self.origin + Vec2::new(column * self.cell_size.x, row * self.cell_size.y),
            self.cell_size,
        ))
    }

    pub fn members(&self, index: usize) -> Result<&BTreeSet<BodyHandle>, PhysError> {
        self.check(index)?;
        Ok(&self.cells[index])
    }

    /// Update the cells `handle` belongs to and return their indices.
    ///
    /// Inactive bodies are taken out of every cell.
    pub fn place(&mut self, handle: BodyHandle, body: &Body) -> Vec<usize> {
        let mut placed = Vec::new();
        for index in 0..self.cells.len() {
            let inside = body.is_active()
                && self
                    .cell_rect(index)
                    .is_ok_and(|rect| ContactEvaluator::overlaps_rect(body, &rect));
            if inside {
                self.cells[index].insert(handle);
                placed.push(index);
            } else {
                self.cells[index].remove(&handle);
            }
        }
        placed
    }

    pub fn remove(&mut self, handle: BodyHandle) {
        for cell in &mut self.cells {
            cell.remove(&handle);
        }
    }

    fn check(&self, index: usize) -> Result<(), PhysError> {
        if index < self.cells.len() {
            Ok(())
        } else {
            Err(PhysError::PartitionOutOfRange {
                index,
                count: self.cells.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::Collider;
    use slotmap::SlotMap;

    fn grid() -> PartitionGrid {
        PartitionGrid::new(&WorldConfig {
            origin: Vec2::ZERO,
            size: Vec2::new(100.0, 100.0),
            columns: 2,
            rows: 2,
        })
        .unwrap()
    }

    fn handle() -> BodyHandle {
        let mut map: SlotMap<BodyHandle, ()> = SlotMap::with_key();
        map.insert(())
    }

    fn circle(x: f64, y: f64, radius: f64) -> Body {
        Body::new(Vec2::new(x, y), 1.0, 1.0)
            .unwrap()
            .with_collider(Collider::circle(radius).unwrap())
    }

    #[test]
    fn test_rejects_bad_config() {
        let bad_size = WorldConfig {
            size: Vec2::new(0.0, 10.0),
            ..WorldConfig::default()
        };
        assert!(matches!(
            PartitionGrid::new(&bad_size),
            Err(PhysError::InvalidWorldBounds { .. })
        ));

        let bad_grid = WorldConfig {
            columns: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            PartitionGrid::new(&bad_grid),
            Err(PhysError::InvalidGrid { columns: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_overflowing_grid() {
        let overflow = WorldConfig {
            columns: 1 << 33,
            rows: 1 << 31,
            ..WorldConfig::default()
        };
        assert!(matches!(
            PartitionGrid::new(&overflow),
            Err(PhysError::InvalidGrid { .. })
        ));

        let huge = WorldConfig {
            columns: 1_000_000,
            rows: 1_000_000,
            ..WorldConfig::default()
        };
        assert!(matches!(
            PartitionGrid::new(&huge),
            Err(PhysError::InvalidGrid { .. })
        ));

        let at_cap = WorldConfig {
            columns: 256,
            rows: MAX_PARTITIONS / 256,
            ..WorldConfig::default()
        };
        assert_eq!(PartitionGrid::new(&at_cap).unwrap().len(), MAX_PARTITIONS);
    }

    #[test]
    fn test_rejects_non_finite_bounds() {
        for (origin, size) in [
            (Vec2::ZERO, Vec2::new(f64::INFINITY, 10.0)),
            (Vec2::ZERO, Vec2::new(10.0, f64::NAN)),
            (Vec2::new(f64::NAN, 0.0), Vec2::new(10.0, 10.0)),
            (Vec2::new(0.0, f64::NEG_INFINITY), Vec2::new(10.0, 10.0)),
        ] {
            let config = WorldConfig {
                origin,
                size,
                ..WorldConfig::default()
            };
            assert!(
                matches!(
                    PartitionGrid::new(&config),
                    Err(PhysError::InvalidWorldBounds { .. })
                ),
                "origin {:?} size {:?}",
                origin,
                size
            );
        }
    }

    #[test]
    fn test_cell_layout_is_row_major() {
        let grid = grid();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.cell_rect(1).unwrap().origin, Vec2::new(50.0, 0.0));
        assert_eq!(grid.cell_rect(2).unwrap().origin, Vec2::new(0.0, 50.0));
        assert_eq!(
            grid.cell_rect(4),
            Err(PhysError::PartitionOutOfRange { index: 4, count: 4 })
        );
    }

    #[test]
    fn test_place_tracks_moves() {
        let mut grid = grid();
        let h = handle();

        assert_eq!(grid.place(h, &circle(25.0, 25.0, 5.0)), vec![0]);
        // Straddles the center: all four cells
        assert_eq!(grid.place(h, &circle(50.0, 50.0, 5.0)), vec![0, 1, 2, 3]);
        assert_eq!(grid.place(h, &circle(75.0, 75.0, 5.0)), vec![3]);
        assert!(grid.members(0).unwrap().is_empty());
        assert!(grid.members(3).unwrap().contains(&h));

        // Outside the world
        assert!(grid.place(h, &circle(500.0, 500.0, 5.0)).is_empty());
        assert!(grid.members(3).unwrap().is_empty());
    }

    #[test]
    fn test_inactive_and_removed_bodies_leave_cells() {
        let mut grid = grid();
        let h = handle();
        grid.place(h, &circle(25.0, 25.0, 5.0));

        let inactive = circle(25.0, 25.0, 5.0).with_active(false);
        assert!(grid.place(h, &inactive).is_empty());

        grid.place(h, &circle(25.0, 25.0, 5.0));
        grid.remove(h);
        assert!((0..grid.len()).all(|i| !grid.members(i).unwrap().contains(&h)));
    }
}
