use std::fmt;

use crate::app::Vec2;

use super::GridCoord;

pub trait FootprintSink {
    /// Called on arrival with the cell the actor just left.
    fn spawn_footprint(&mut self, cell: GridCoord, world_position: Vec2);
}

pub trait MoveSoundPlayer {
    fn play_move_sound(&mut self);
}

pub trait MoveCompletionListener {
    fn on_move_finished(&mut self);
}

pub trait GridMapper {
    fn world_to_grid(&self, world_position: Vec2) -> GridCoord;
}

/// Optional hooks notified by the movement controller. Any of them may be
/// absent; movement proceeds regardless.
#[derive(Default)]
pub struct Collaborators {
    pub footprints: Option<Box<dyn FootprintSink>>,
    pub move_sound: Option<Box<dyn MoveSoundPlayer>>,
    pub move_finished: Option<Box<dyn MoveCompletionListener>>,
    pub grid_mapper: Option<Box<dyn GridMapper>>,
}

impl Collaborators {
    pub fn with_footprints(mut self, sink: Box<dyn FootprintSink>) -> Self {
        self.footprints = Some(sink);
        self
    }

    pub fn with_move_sound(mut self, player: Box<dyn MoveSoundPlayer>) -> Self {
        self.move_sound = Some(player);
        self
    }

    pub fn with_move_finished(mut self, listener: Box<dyn MoveCompletionListener>) -> Self {
        self.move_finished = Some(listener);
        self
    }

    pub fn with_grid_mapper(mut self, mapper: Box<dyn GridMapper>) -> Self {
        self.grid_mapper = Some(mapper);
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("footprints", &self.footprints.is_some())
            .field("move_sound", &self.move_sound.is_some())
            .field("move_finished", &self.move_finished.is_some())
            .field("grid_mapper", &self.grid_mapper.is_some())
            .finish()
    }
}

/// Gate state sampled by the caller when a command is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandContext {
    pub zooming: bool,
    pub input_disabled: bool,
}
