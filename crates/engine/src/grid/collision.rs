use super::{Direction, GridCoord, GridWorld, LayerMask, PushableId};

/// What a single cell holds from the mover's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellQuery {
    Free,
    BlockedByWall,
    OccupiedByPushable(PushableId),
}

/// Read-only occupancy queries. Cells outside any authored content are free.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver<'a> {
    world: &'a GridWorld,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(world: &'a GridWorld) -> Self {
        Self { world }
    }

    pub fn is_blocked(&self, cell: GridCoord, wall_mask: LayerMask) -> bool {
        self.world
            .occupancy()
            .wall_layers(cell)
            .intersects(wall_mask)
    }

    /// Finds the pushable recorded at `cell`.
    ///
    /// An occupancy record whose body no longer exists is still reported so
    /// the caller can reject the push instead of walking into the cell.
    pub fn find_pushable(&self, cell: GridCoord, pushable_mask: LayerMask) -> Option<PushableId> {
        let id = self.world.occupancy().pushable_at(cell)?;
        match self.world.pushable(id) {
            Some(body) if !body.layer().intersects(pushable_mask) => None,
            _ => Some(id),
        }
    }

    /// Whether a pushable resting at `pushable_cell` may move one cell in `direction`.
    pub fn can_push(
        &self,
        pushable_cell: GridCoord,
        direction: Direction,
        wall_mask: LayerMask,
        pushable_mask: LayerMask,
    ) -> bool {
        let destination = pushable_cell.step(direction);
        !self.is_blocked(destination, wall_mask)
            && self.find_pushable(destination, pushable_mask).is_none()
    }

    /// Walls take priority over pushables in the same cell.
    pub fn query(
        &self,
        cell: GridCoord,
        wall_mask: LayerMask,
        pushable_mask: LayerMask,
    ) -> CellQuery {
        if self.is_blocked(cell, wall_mask) {
            return CellQuery::BlockedByWall;
        }
        match self.find_pushable(cell, pushable_mask) {
            Some(id) => CellQuery::OccupiedByPushable(id),
            None => CellQuery::Free,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Vec2;
    use crate::grid::MovementConfig;

    const WALLS: LayerMask = LayerMask(0b01);
    const BOXES: LayerMask = LayerMask(0b10);

    fn world() -> GridWorld {
        GridWorld::new(&MovementConfig::default(), Vec2::ZERO)
    }

    #[test]
    fn walls_block_only_matching_layers() {
        let mut world = world();
        world.spawn_wall(GridCoord::new(1, 0), WALLS);
        world.spawn_wall(GridCoord::new(2, 0), LayerMask(0b100));
        let resolver = world.collision();

        assert!(resolver.is_blocked(GridCoord::new(1, 0), WALLS));
        assert!(!resolver.is_blocked(GridCoord::new(2, 0), WALLS));
        assert!(!resolver.is_blocked(GridCoord::new(50, -50), WALLS));
    }

    #[test]
    fn find_pushable_filters_by_layer() {
        let mut world = world();
        let id = world
            .spawn_pushable(GridCoord::new(0, 1), BOXES)
            .expect("spawn");
        let resolver = world.collision();

        assert_eq!(resolver.find_pushable(GridCoord::new(0, 1), BOXES), Some(id));
        assert_eq!(resolver.find_pushable(GridCoord::new(0, 1), WALLS), None);
        assert_eq!(resolver.find_pushable(GridCoord::new(0, 2), BOXES), None);
    }

    #[test]
    fn stale_occupancy_record_is_still_reported() {
        let mut world = world();
        world
            .occupancy_mut()
            .claim(GridCoord::new(3, 3), PushableId(77));

        assert_eq!(
            world.collision().find_pushable(GridCoord::new(3, 3), BOXES),
            Some(PushableId(77))
        );
    }

    #[test]
    fn can_push_checks_destination_for_walls_and_pushables() {
        let mut world = world();
        world
            .spawn_pushable(GridCoord::new(1, 0), BOXES)
            .expect("spawn");
        world
            .spawn_pushable(GridCoord::new(0, 1), BOXES)
            .expect("spawn");
        world.spawn_wall(GridCoord::new(1, -1), WALLS);
        let resolver = world.collision();

        assert!(resolver.can_push(GridCoord::new(1, 0), Direction::Right, WALLS, BOXES));
        assert!(!resolver.can_push(GridCoord::new(1, 0), Direction::Down, WALLS, BOXES));
        assert!(!resolver.can_push(GridCoord::new(0, 0), Direction::Up, WALLS, BOXES));
    }

    #[test]
    fn query_prefers_wall_over_pushable() {
        let mut world = world();
        let id = world
            .spawn_pushable(GridCoord::new(4, 0), BOXES)
            .expect("spawn");
        world.spawn_wall(GridCoord::new(4, 0), WALLS);
        let resolver = world.collision();

        assert_eq!(
            resolver.query(GridCoord::new(4, 0), WALLS, BOXES),
            CellQuery::BlockedByWall
        );
        assert_eq!(
            resolver.query(GridCoord::new(4, 0), LayerMask(0b1000), BOXES),
            CellQuery::OccupiedByPushable(id)
        );
        assert_eq!(
            resolver.query(GridCoord::new(5, 0), WALLS, BOXES),
            CellQuery::Free
        );
    }
}
