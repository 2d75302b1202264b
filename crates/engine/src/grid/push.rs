use super::{Direction, GridWorld, PushableId};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PushStage {
    #[default]
    Inactive,
    /// The pushable is already moving; the actor waits out the delay.
    Delay {
        pushable: PushableId,
        direction: Direction,
        elapsed_seconds: f32,
    },
    /// The actor is stepping into the vacated cell.
    ActorMove {
        pushable: PushableId,
        direction: Direction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PushProgress {
    Inactive,
    Waiting,
    /// The delay elapsed this tick; the actor steps now.
    ActorReleased(Direction),
    ActorMoving,
    /// The pushable vanished before the actor was released.
    Aborted(PushableId),
}

/// Sequences a push: pushable first, a short delay, then the actor.
#[derive(Debug, Clone, Default)]
pub struct PushCoordinator {
    stage: PushStage,
    push_delay_seconds: f32,
}

impl PushCoordinator {
    pub fn new(push_delay_seconds: f32) -> Self {
        Self {
            stage: PushStage::Inactive,
            push_delay_seconds,
        }
    }

    pub fn stage(&self) -> PushStage {
        self.stage
    }

    pub fn is_active(&self) -> bool {
        self.stage != PushStage::Inactive
    }

    pub fn pushable(&self) -> Option<PushableId> {
        match self.stage {
            PushStage::Inactive => None,
            PushStage::Delay { pushable, .. } | PushStage::ActorMove { pushable, .. } => {
                Some(pushable)
            }
        }
    }

    pub(crate) fn begin(&mut self, pushable: PushableId, direction: Direction) {
        self.stage = PushStage::Delay {
            pushable,
            direction,
            elapsed_seconds: 0.0,
        };
    }

    pub(crate) fn advance(&mut self, fixed_dt_seconds: f32, world: &GridWorld) -> PushProgress {
        match self.stage {
            PushStage::Inactive => PushProgress::Inactive,
            PushStage::Delay {
                pushable,
                direction,
                elapsed_seconds,
            } => {
                if world.pushable(pushable).is_none() {
                    self.stage = PushStage::Inactive;
                    return PushProgress::Aborted(pushable);
                }
                let elapsed_seconds = elapsed_seconds + fixed_dt_seconds;
                if elapsed_seconds >= self.push_delay_seconds {
                    self.stage = PushStage::ActorMove {
                        pushable,
                        direction,
                    };
                    PushProgress::ActorReleased(direction)
                } else {
                    self.stage = PushStage::Delay {
                        pushable,
                        direction,
                        elapsed_seconds,
                    };
                    PushProgress::Waiting
                }
            }
            PushStage::ActorMove { .. } => PushProgress::ActorMoving,
        }
    }

    pub(crate) fn finish(&mut self) {
        self.stage = PushStage::Inactive;
    }
}
