use std::collections::HashMap;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use super::GridCoord;

/// Bitmask over collision layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PushableId(pub u64);

/// Cell-level occupancy for static walls and pushable objects.
///
/// A pushable in flight holds both its source and destination cell until it
/// arrives, so nothing can enter either cell mid-push.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    walls: HashMap<GridCoord, LayerMask>,
    pushables: HashMap<GridCoord, PushableId>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_wall(&mut self, cell: GridCoord, layers: LayerMask) {
        let entry = self.walls.entry(cell).or_default();
        *entry = *entry | layers;
    }

    pub fn wall_layers(&self, cell: GridCoord) -> LayerMask {
        self.walls.get(&cell).copied().unwrap_or(LayerMask::NONE)
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    pub fn pushable_at(&self, cell: GridCoord) -> Option<PushableId> {
        self.pushables.get(&cell).copied()
    }

    pub fn cells_held_by(&self, id: PushableId) -> Vec<GridCoord> {
        let mut cells: Vec<GridCoord> = self
            .pushables
            .iter()
            .filter(|(_, holder)| **holder == id)
            .map(|(cell, _)| *cell)
            .collect();
        cells.sort();
        cells
    }

    /// Returns the previous holder when the cell was already claimed.
    pub(crate) fn claim(&mut self, cell: GridCoord, id: PushableId) -> Option<PushableId> {
        self.pushables.insert(cell, id).filter(|previous| *previous != id)
    }

    pub(crate) fn release(&mut self, cell: GridCoord, id: PushableId) -> bool {
        if self.pushables.get(&cell) == Some(&id) {
            self.pushables.remove(&cell);
            true
        } else {
            false
        }
    }

    pub(crate) fn release_all(&mut self, id: PushableId) -> usize {
        let before = self.pushables.len();
        self.pushables.retain(|_, holder| *holder != id);
        before - self.pushables.len()
    }
}
