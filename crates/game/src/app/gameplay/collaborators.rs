use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use engine::{
    CellGeometry, Collaborators, FootprintSink, GridCoord, GridMapper, MoveCompletionListener,
    MoveSoundPlayer, Vec2,
};
use tracing::{debug, info};

const FOOTPRINT_TRAIL_CAPACITY: usize = 64;

/// What the actor's collaborators have observed during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionLedger {
    pub(crate) footprints: VecDeque<GridCoord>,
    pub(crate) move_sounds: u32,
    pub(crate) moves_finished: u32,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
}

impl SessionLedger {
    pub(crate) fn new(max_health: u32) -> Self {
        Self {
            footprints: VecDeque::with_capacity(FOOTPRINT_TRAIL_CAPACITY),
            move_sounds: 0,
            moves_finished: 0,
            health: max_health,
            max_health,
        }
    }

    pub(crate) fn is_out_of_health(&self) -> bool {
        self.health == 0
    }
}

pub(crate) type SharedLedger = Rc<RefCell<SessionLedger>>;

/// Keeps the most recent footprints, oldest dropped first.
pub(crate) struct FootprintTrail {
    ledger: SharedLedger,
}

impl FootprintSink for FootprintTrail {
    fn spawn_footprint(&mut self, cell: GridCoord, world_position: Vec2) {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.footprints.len() == FOOTPRINT_TRAIL_CAPACITY {
            ledger.footprints.pop_front();
        }
        ledger.footprints.push_back(cell);
        debug!(%cell, x = world_position.x, y = world_position.y, "footprint_spawned");
    }
}

pub(crate) struct MoveSoundLog {
    ledger: SharedLedger,
}

impl MoveSoundPlayer for MoveSoundLog {
    fn play_move_sound(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.move_sounds += 1;
        debug!(plays = ledger.move_sounds, "move_sound_played");
    }
}

/// Every finished move costs one point of health.
pub(crate) struct PlayerHealth {
    ledger: SharedLedger,
}

impl MoveCompletionListener for PlayerHealth {
    fn on_move_finished(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.moves_finished += 1;
        if ledger.health == 0 {
            return;
        }
        ledger.health -= 1;
        debug!(health = ledger.health, "player_damaged");
        if ledger.health == 0 {
            info!(moves = ledger.moves_finished, "player_out_of_health");
        }
    }
}

pub(crate) struct UniformGridMapper {
    geometry: CellGeometry,
}

impl UniformGridMapper {
    pub(crate) fn new(geometry: CellGeometry) -> Self {
        Self { geometry }
    }
}

impl GridMapper for UniformGridMapper {
    fn world_to_grid(&self, world_position: Vec2) -> GridCoord {
        self.geometry.nearest_cell(world_position)
    }
}

pub(crate) fn session_collaborators(
    ledger: &SharedLedger,
    geometry: CellGeometry,
) -> Collaborators {
    Collaborators::default()
        .with_footprints(Box::new(FootprintTrail {
            ledger: Rc::clone(ledger),
        }))
        .with_move_sound(Box::new(MoveSoundLog {
            ledger: Rc::clone(ledger),
        }))
        .with_move_finished(Box::new(PlayerHealth {
            ledger: Rc::clone(ledger),
        }))
        .with_grid_mapper(Box::new(UniformGridMapper::new(geometry)))
}
