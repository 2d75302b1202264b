use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::app::Vec2;

use super::{
    CellGeometry, CollisionResolver, Direction, GridCoord, LayerMask, MovementConfig,
    OccupancyIndex, PushableBody, PushableId,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridWorldError {
    #[error("cell {cell} already holds a wall")]
    WallInCell { cell: GridCoord },
    #[error("cell {cell} already holds pushable {holder:?}")]
    PushableInCell { cell: GridCoord, holder: PushableId },
}

/// Static walls plus the pushable objects that live on the grid.
#[derive(Debug, Clone)]
pub struct GridWorld {
    geometry: CellGeometry,
    arrival_epsilon: f32,
    pushable_move_speed: f32,
    occupancy: OccupancyIndex,
    pushables: BTreeMap<PushableId, PushableBody>,
    next_pushable_id: u64,
}

impl GridWorld {
    pub fn new(config: &MovementConfig, origin: Vec2) -> Self {
        Self {
            geometry: CellGeometry::new(origin, config.cell_size),
            arrival_epsilon: config.arrival_epsilon,
            pushable_move_speed: config.pushable_move_speed,
            occupancy: OccupancyIndex::new(),
            pushables: BTreeMap::new(),
            next_pushable_id: 1,
        }
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    #[cfg(test)]
    pub(crate) fn occupancy_mut(&mut self) -> &mut OccupancyIndex {
        &mut self.occupancy
    }

    pub fn collision(&self) -> CollisionResolver<'_> {
        CollisionResolver::new(self)
    }

    pub fn spawn_wall(&mut self, cell: GridCoord, layers: LayerMask) {
        self.occupancy.add_wall(cell, layers);
    }

    pub fn spawn_pushable(
        &mut self,
        cell: GridCoord,
        layer: LayerMask,
    ) -> Result<PushableId, GridWorldError> {
        if !self.occupancy.wall_layers(cell).is_empty() {
            return Err(GridWorldError::WallInCell { cell });
        }
        if let Some(holder) = self.occupancy.pushable_at(cell) {
            return Err(GridWorldError::PushableInCell { cell, holder });
        }

        let id = PushableId(self.next_pushable_id);
        self.next_pushable_id += 1;
        let body = PushableBody::new(id, cell, layer, self.pushable_move_speed, &self.geometry);
        self.occupancy.claim(cell, id);
        self.pushables.insert(id, body);
        debug!(pushable = id.0, %cell, "pushable_spawned");
        Ok(id)
    }

    /// Removes the body and frees every cell it held.
    pub fn remove_pushable(&mut self, id: PushableId) -> bool {
        let Some(body) = self.pushables.remove(&id) else {
            return false;
        };
        let released = self.occupancy.release_all(id);
        info!(
            pushable = id.0,
            cell = %body.cell(),
            was_moving = body.is_moving(),
            released_cells = released,
            "pushable_removed"
        );
        true
    }

    pub fn pushable(&self, id: PushableId) -> Option<&PushableBody> {
        self.pushables.get(&id)
    }

    pub fn pushables(&self) -> impl Iterator<Item = &PushableBody> {
        self.pushables.values()
    }

    pub fn pushable_count(&self) -> usize {
        self.pushables.len()
    }

    pub fn any_pushable_moving(&self) -> bool {
        self.pushables.values().any(PushableBody::is_moving)
    }

    /// Starts a one-cell move and claims the destination. Returns `false` when
    /// the body is unknown or already moving.
    pub(crate) fn begin_push(&mut self, id: PushableId, direction: Direction) -> bool {
        let Some(body) = self.pushables.get_mut(&id) else {
            return false;
        };
        let Some((from, to)) = body.begin_push(direction) else {
            return false;
        };
        self.occupancy.claim(to, id);
        debug!(pushable = id.0, %from, %to, "pushable_push_started");
        true
    }

    /// Advances every moving pushable. Returns how many arrived this tick.
    pub fn tick_pushables(&mut self, fixed_dt_seconds: f32) -> usize {
        let geometry = self.geometry;
        let mut arrivals = 0;
        for body in self.pushables.values_mut() {
            if let Some(vacated) = body.advance(fixed_dt_seconds, &geometry, self.arrival_epsilon) {
                self.occupancy.release(vacated, body.id());
                arrivals += 1;
                debug!(pushable = body.id().0, cell = %body.cell(), "pushable_arrived");
            }
        }
        arrivals
    }
}
