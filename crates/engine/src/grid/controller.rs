use tracing::{debug, warn};

use crate::app::Vec2;

use super::motion::step_toward;
use super::push::{PushCoordinator, PushProgress, PushStage};
use super::{
    CellGeometry, CellQuery, Collaborators, CommandContext, Direction, Facing, GridCoord,
    GridWorld, MovementConfig, PushableId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Moving,
    PushSequencing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    pub world_position: Vec2,
    pub target_cell: GridCoord,
    /// Cell the actor last rested on; footprints are left here on arrival.
    pub previous_cell: GridCoord,
    pub facing: Facing,
    pub is_moving: bool,
    pub move_speed: f32,
    pub cell_size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Busy,
    Zooming,
    InputDisabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Wall,
    PushableMoving,
    PushBlocked,
    MissingPushable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Step,
    Push { pushable: PushableId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Ignored(IgnoreReason),
    Rejected(RejectReason),
    Started(MoveKind),
}

impl CommandOutcome {
    pub fn is_started(self) -> bool {
        matches!(self, CommandOutcome::Started(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    pub from: GridCoord,
    pub to: GridCoord,
    pub kind: MoveKind,
}

/// Grid-locked actor movement with push sequencing.
///
/// Commands are accepted only while idle. A step moves the actor one cell;
/// a push moves the pushable first and releases the actor after the
/// configured delay. Arrival side effects fire in a fixed order: footprint
/// at the departed cell, move sound, then the move-finished notification.
pub struct GridMovementController {
    config: MovementConfig,
    geometry: CellGeometry,
    state: ControllerState,
    actor: ActorState,
    push: PushCoordinator,
    collaborators: Collaborators,
}

impl GridMovementController {
    pub fn new(
        spawn_cell: GridCoord,
        config: MovementConfig,
        collaborators: Collaborators,
        world: &GridWorld,
    ) -> Self {
        let geometry = *world.geometry();
        if collaborators.grid_mapper.is_none() {
            warn!("grid_mapper_missing");
        }
        debug!(%spawn_cell, ?collaborators, "controller_created");
        Self {
            geometry,
            state: ControllerState::Idle,
            actor: ActorState {
                world_position: geometry.cell_center(spawn_cell),
                target_cell: spawn_cell,
                previous_cell: spawn_cell,
                facing: Facing::default(),
                is_moving: false,
                move_speed: config.move_speed,
                cell_size: geometry.cell_size(),
            },
            push: PushCoordinator::new(config.push_delay_seconds),
            config,
            collaborators,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn actor(&self) -> &ActorState {
        &self.actor
    }

    pub fn facing(&self) -> Facing {
        self.actor.facing
    }

    pub fn is_moving(&self) -> bool {
        self.actor.is_moving
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn push_stage(&self) -> PushStage {
        self.push.stage()
    }

    /// Where the mapper places the actor right now. `None` without a mapper.
    pub fn grid_position(&self) -> Option<GridCoord> {
        self.collaborators
            .grid_mapper
            .as_ref()
            .map(|mapper| mapper.world_to_grid(self.actor.world_position))
    }

    pub fn handle_command(
        &mut self,
        direction: Direction,
        context: CommandContext,
        world: &mut GridWorld,
    ) -> CommandOutcome {
        if let Some(reason) = self.gate(context) {
            debug!(direction = direction.label(), ?reason, "command_ignored");
            return CommandOutcome::Ignored(reason);
        }

        if let Some(facing) = direction.facing() {
            self.actor.facing = facing;
        }

        let candidate = self.actor.target_cell.step(direction);
        let query = world.collision().query(
            candidate,
            self.config.wall_layer,
            self.config.pushable_layer,
        );
        match query {
            CellQuery::BlockedByWall => self.reject(direction, candidate, RejectReason::Wall),
            CellQuery::OccupiedByPushable(pushable) => {
                self.try_begin_push(pushable, direction, candidate, world)
            }
            CellQuery::Free => {
                self.actor.target_cell = candidate;
                self.actor.is_moving = true;
                self.state = ControllerState::Moving;
                debug!(
                    direction = direction.label(),
                    from = %self.actor.previous_cell,
                    to = %candidate,
                    "move_started"
                );
                CommandOutcome::Started(MoveKind::Step)
            }
        }
    }

    pub fn tick(&mut self, fixed_dt_seconds: f32, world: &mut GridWorld) -> Option<Arrival> {
        match self.state {
            ControllerState::Idle => None,
            ControllerState::Moving => {
                if self.advance_actor(fixed_dt_seconds) {
                    Some(self.complete_arrival(MoveKind::Step))
                } else {
                    None
                }
            }
            ControllerState::PushSequencing => self.tick_push(fixed_dt_seconds, world),
        }
    }

    fn gate(&self, context: CommandContext) -> Option<IgnoreReason> {
        if self.state != ControllerState::Idle || self.actor.is_moving {
            Some(IgnoreReason::Busy)
        } else if context.zooming {
            Some(IgnoreReason::Zooming)
        } else if context.input_disabled {
            Some(IgnoreReason::InputDisabled)
        } else {
            None
        }
    }

    fn reject(
        &self,
        direction: Direction,
        candidate: GridCoord,
        reason: RejectReason,
    ) -> CommandOutcome {
        debug!(
            direction = direction.label(),
            cell = %candidate,
            ?reason,
            "move_rejected"
        );
        CommandOutcome::Rejected(reason)
    }

    fn try_begin_push(
        &mut self,
        pushable: PushableId,
        direction: Direction,
        candidate: GridCoord,
        world: &mut GridWorld,
    ) -> CommandOutcome {
        let Some(body) = world.pushable(pushable) else {
            return self.reject(direction, candidate, RejectReason::MissingPushable);
        };
        if body.is_moving() {
            return self.reject(direction, candidate, RejectReason::PushableMoving);
        }
        let legal = world.collision().can_push(
            body.cell(),
            direction,
            self.config.wall_layer,
            self.config.pushable_layer,
        );
        if !legal {
            return self.reject(direction, candidate, RejectReason::PushBlocked);
        }
        if !world.begin_push(pushable, direction) {
            return self.reject(direction, candidate, RejectReason::PushableMoving);
        }

        self.push.begin(pushable, direction);
        self.actor.is_moving = true;
        self.state = ControllerState::PushSequencing;
        debug!(
            direction = direction.label(),
            pushable = pushable.0,
            actor_cell = %self.actor.target_cell,
            "push_started"
        );
        CommandOutcome::Started(MoveKind::Push { pushable })
    }

    fn tick_push(&mut self, fixed_dt_seconds: f32, world: &GridWorld) -> Option<Arrival> {
        let pushable = self.push.pushable()?;
        match self.push.advance(fixed_dt_seconds, world) {
            PushProgress::Inactive | PushProgress::Waiting => None,
            PushProgress::Aborted(missing) => {
                self.actor.is_moving = false;
                self.state = ControllerState::Idle;
                warn!(
                    pushable = missing.0,
                    actor_cell = %self.actor.target_cell,
                    "push_aborted_pushable_missing"
                );
                None
            }
            PushProgress::ActorReleased(direction) => {
                self.actor.target_cell = self.actor.target_cell.step(direction);
                debug!(to = %self.actor.target_cell, "push_actor_released");
                self.advance_push_actor(fixed_dt_seconds, pushable)
            }
            PushProgress::ActorMoving => self.advance_push_actor(fixed_dt_seconds, pushable),
        }
    }

    fn advance_push_actor(
        &mut self,
        fixed_dt_seconds: f32,
        pushable: PushableId,
    ) -> Option<Arrival> {
        if !self.advance_actor(fixed_dt_seconds) {
            return None;
        }
        self.push.finish();
        Some(self.complete_arrival(MoveKind::Push { pushable }))
    }

    fn advance_actor(&mut self, fixed_dt_seconds: f32) -> bool {
        let target = self.geometry.cell_center(self.actor.target_cell);
        let (next, arrived) = step_toward(
            self.actor.world_position,
            target,
            self.actor.move_speed,
            fixed_dt_seconds,
            self.config.arrival_epsilon,
        );
        self.actor.world_position = next;
        arrived
    }

    fn complete_arrival(&mut self, kind: MoveKind) -> Arrival {
        let departed = self.actor.previous_cell;
        let arrived = self.actor.target_cell;

        if let Some(footprints) = self.collaborators.footprints.as_mut() {
            footprints.spawn_footprint(departed, self.geometry.cell_center(departed));
        }
        if let Some(sound) = self.collaborators.move_sound.as_mut() {
            sound.play_move_sound();
        }
        self.actor.previous_cell = arrived;
        self.actor.is_moving = false;
        self.state = ControllerState::Idle;
        if let Some(listener) = self.collaborators.move_finished.as_mut() {
            listener.on_move_finished();
        }

        debug!(from = %departed, to = %arrived, ?kind, "move_arrived");
        Arrival {
            from: departed,
            to: arrived,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::grid::{
        FootprintSink, GridMapper, LayerMask, MoveCompletionListener, MoveSoundPlayer,
    };

    const DT: f32 = 1.0 / 60.0;
    const WALLS: LayerMask = LayerMask(0b01);
    const BOXES: LayerMask = LayerMask(0b10);

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Footprint(GridCoord),
        Sound,
        Finished,
    }

    type EventLog = Rc<RefCell<Vec<Event>>>;

    struct RecordingFootprints(EventLog);

    impl FootprintSink for RecordingFootprints {
        fn spawn_footprint(&mut self, cell: GridCoord, _world_position: Vec2) {
            self.0.borrow_mut().push(Event::Footprint(cell));
        }
    }

    struct RecordingSound(EventLog);

    impl MoveSoundPlayer for RecordingSound {
        fn play_move_sound(&mut self) {
            self.0.borrow_mut().push(Event::Sound);
        }
    }

    struct RecordingFinish(EventLog);

    impl MoveCompletionListener for RecordingFinish {
        fn on_move_finished(&mut self) {
            self.0.borrow_mut().push(Event::Finished);
        }
    }

    struct RoundingMapper(CellGeometry);

    impl GridMapper for RoundingMapper {
        fn world_to_grid(&self, world_position: Vec2) -> GridCoord {
            self.0.nearest_cell(world_position)
        }
    }

    fn recording(log: &EventLog) -> Collaborators {
        Collaborators::default()
            .with_footprints(Box::new(RecordingFootprints(Rc::clone(log))))
            .with_move_sound(Box::new(RecordingSound(Rc::clone(log))))
            .with_move_finished(Box::new(RecordingFinish(Rc::clone(log))))
    }

    fn open_world() -> GridWorld {
        GridWorld::new(&MovementConfig::default(), Vec2::ZERO)
    }

    fn controller_at(cell: GridCoord, world: &GridWorld, log: &EventLog) -> GridMovementController {
        GridMovementController::new(cell, MovementConfig::default(), recording(log), world)
    }

    fn issue(
        controller: &mut GridMovementController,
        world: &mut GridWorld,
        direction: Direction,
    ) -> CommandOutcome {
        controller.handle_command(direction, CommandContext::default(), world)
    }

    fn new_log() -> EventLog {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn run_until_idle(controller: &mut GridMovementController, world: &mut GridWorld) -> u32 {
        let mut ticks = 0;
        while controller.is_moving() || world.any_pushable_moving() {
            world.tick_pushables(DT);
            controller.tick(DT, world);
            ticks += 1;
            assert!(ticks < 600, "movement never settled");
        }
        ticks
    }

    fn assert_resting_on_target(controller: &GridMovementController, world: &GridWorld) {
        let actor = controller.actor();
        assert!(!actor.is_moving);
        assert_eq!(
            actor.world_position,
            world.geometry().cell_center(actor.target_cell)
        );
    }

    #[test]
    fn step_right_arrives_with_ordered_side_effects() {
        let mut world = open_world();
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let outcome = issue(&mut controller, &mut world, Direction::Right);
        assert_eq!(outcome, CommandOutcome::Started(MoveKind::Step));
        assert_eq!(controller.state(), ControllerState::Moving);

        run_until_idle(&mut controller, &mut world);

        let actor = controller.actor();
        assert_eq!(actor.target_cell, GridCoord::new(1, 0));
        assert_eq!(actor.previous_cell, GridCoord::new(1, 0));
        assert_eq!(actor.world_position, Vec2::new(1.0, 0.0));
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Footprint(GridCoord::new(0, 0)),
                Event::Sound,
                Event::Finished
            ]
        );
    }

    #[test]
    fn arrival_reports_departed_and_reached_cells() {
        let mut world = open_world();
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(2, 2), &world, &log);
        issue(&mut controller, &mut world, Direction::Down);

        let mut arrival = None;
        for _ in 0..600 {
            if let Some(found) = controller.tick(DT, &mut world) {
                arrival = Some(found);
                break;
            }
        }

        assert_eq!(
            arrival,
            Some(Arrival {
                from: GridCoord::new(2, 2),
                to: GridCoord::new(2, 1),
                kind: MoveKind::Step,
            })
        );
    }

    #[test]
    fn idle_actor_always_rests_on_cell_center() {
        let mut world = GridWorld::new(
            &MovementConfig {
                cell_size: 0.7,
                ..MovementConfig::default()
            },
            Vec2::new(0.3, -1.1),
        );
        let log = new_log();
        let config = MovementConfig {
            cell_size: 0.7,
            move_speed: 3.3,
            ..MovementConfig::default()
        };
        let mut controller =
            GridMovementController::new(GridCoord::new(0, 0), config, recording(&log), &world);
        assert_resting_on_target(&controller, &world);

        let path = [
            Direction::Right,
            Direction::Up,
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Right,
        ];
        for direction in path {
            controller.handle_command(direction, CommandContext::default(), &mut world);
            while controller.is_moving() {
                controller.tick(DT, &mut world);
                if !controller.is_moving() {
                    assert_resting_on_target(&controller, &world);
                }
            }
        }

        assert_eq!(controller.actor().target_cell, GridCoord::new(1, 1));
        assert_resting_on_target(&controller, &world);
    }

    #[test]
    fn command_while_moving_never_changes_target() {
        let mut world = open_world();
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);
        issue(&mut controller, &mut world, Direction::Up);

        for _ in 0..3 {
            controller.tick(DT, &mut world);
            let outcome =
                issue(&mut controller, &mut world, Direction::Right);
            assert_eq!(outcome, CommandOutcome::Ignored(IgnoreReason::Busy));
            assert_eq!(controller.actor().target_cell, GridCoord::new(0, 1));
        }
        assert_eq!(controller.facing(), Facing::Right);
    }

    #[test]
    fn double_command_in_one_tick_keeps_first_result() {
        let mut world = open_world();
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let first = issue(&mut controller, &mut world, Direction::Left);
        let second = issue(&mut controller, &mut world, Direction::Up);
        assert!(first.is_started());
        assert_eq!(second, CommandOutcome::Ignored(IgnoreReason::Busy));

        run_until_idle(&mut controller, &mut world);
        assert_eq!(controller.actor().target_cell, GridCoord::new(-1, 0));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn wall_rejects_silently() {
        let mut world = open_world();
        world.spawn_wall(GridCoord::new(0, 1), WALLS);
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let outcome = issue(&mut controller, &mut world, Direction::Up);

        assert_eq!(outcome, CommandOutcome::Rejected(RejectReason::Wall));
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.tick(DT, &mut world), None);
        assert_resting_on_target(&controller, &world);
        assert_eq!(controller.actor().target_cell, GridCoord::new(0, 0));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn wall_on_unrelated_layer_does_not_block() {
        let mut world = open_world();
        world.spawn_wall(GridCoord::new(1, 0), LayerMask(0b100));
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let outcome = issue(&mut controller, &mut world, Direction::Right);
        assert_eq!(outcome, CommandOutcome::Started(MoveKind::Step));
    }

    #[test]
    fn push_moves_pushable_then_actor() {
        let mut world = open_world();
        let pushable = world
            .spawn_pushable(GridCoord::new(1, 0), BOXES)
            .expect("spawn");
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let outcome = issue(&mut controller, &mut world, Direction::Right);
        assert_eq!(outcome, CommandOutcome::Started(MoveKind::Push { pushable }));
        assert_eq!(controller.state(), ControllerState::PushSequencing);
        assert!(controller.is_moving());
        assert_eq!(controller.actor().target_cell, GridCoord::new(0, 0));

        world.tick_pushables(DT);
        controller.tick(DT, &mut world);
        let body = world.pushable(pushable).expect("pushable");
        assert!(body.is_moving());
        assert!(body.world_position().x > 1.0);
        assert_eq!(controller.actor().world_position, Vec2::new(0.0, 0.0));

        run_until_idle(&mut controller, &mut world);

        let body = world.pushable(pushable).expect("pushable");
        assert_eq!(body.cell(), GridCoord::new(2, 0));
        assert_eq!(body.world_position(), Vec2::new(2.0, 0.0));
        assert!(!body.is_moving());
        assert_eq!(controller.actor().target_cell, GridCoord::new(1, 0));
        assert_eq!(controller.actor().previous_cell, GridCoord::new(1, 0));
        assert_resting_on_target(&controller, &world);
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.push_stage(), PushStage::Inactive);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Footprint(GridCoord::new(0, 0)),
                Event::Sound,
                Event::Finished
            ]
        );
        assert_eq!(world.occupancy().pushable_at(GridCoord::new(1, 0)), None);
        assert_eq!(
            world.occupancy().pushable_at(GridCoord::new(2, 0)),
            Some(pushable)
        );
    }

    #[test]
    fn actor_waits_out_push_delay() {
        let mut world = open_world();
        world
            .spawn_pushable(GridCoord::new(0, 1), BOXES)
            .expect("spawn");
        let log = new_log();
        let config = MovementConfig {
            push_delay_seconds: 0.1,
            ..MovementConfig::default()
        };
        let mut controller =
            GridMovementController::new(GridCoord::new(0, 0), config, recording(&log), &world);

        issue(&mut controller, &mut world, Direction::Up);
        for _ in 0..4 {
            world.tick_pushables(DT);
            controller.tick(DT, &mut world);
            assert_eq!(controller.actor().target_cell, GridCoord::new(0, 0));
            assert_eq!(controller.actor().world_position, Vec2::ZERO);
            assert!(matches!(controller.push_stage(), PushStage::Delay { .. }));
        }

        run_until_idle(&mut controller, &mut world);
        assert_eq!(controller.actor().target_cell, GridCoord::new(0, 1));
    }

    #[test]
    fn push_into_wall_is_rejected_and_nothing_moves() {
        let mut world = open_world();
        let pushable = world
            .spawn_pushable(GridCoord::new(1, 0), BOXES)
            .expect("spawn");
        world.spawn_wall(GridCoord::new(2, 0), WALLS);
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let outcome = issue(&mut controller, &mut world, Direction::Right);

        assert_eq!(outcome, CommandOutcome::Rejected(RejectReason::PushBlocked));
        let body = world.pushable(pushable).expect("pushable");
        assert_eq!(body.cell(), GridCoord::new(1, 0));
        assert!(!body.is_moving());
        assert_resting_on_target(&controller, &world);
        assert_eq!(controller.actor().target_cell, GridCoord::new(0, 0));
    }

    #[test]
    fn push_into_second_pushable_is_rejected() {
        let mut world = open_world();
        let first = world
            .spawn_pushable(GridCoord::new(0, -1), BOXES)
            .expect("spawn first");
        let second = world
            .spawn_pushable(GridCoord::new(0, -2), BOXES)
            .expect("spawn second");
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let outcome = issue(&mut controller, &mut world, Direction::Down);

        assert_eq!(outcome, CommandOutcome::Rejected(RejectReason::PushBlocked));
        assert_eq!(
            world.pushable(first).expect("first").cell(),
            GridCoord::new(0, -1)
        );
        assert_eq!(
            world.pushable(second).expect("second").cell(),
            GridCoord::new(0, -2)
        );
        assert!(!world.any_pushable_moving());
        assert_eq!(controller.actor().target_cell, GridCoord::new(0, 0));
    }

    #[test]
    fn moving_pushable_cannot_be_pushed() {
        let mut world = open_world();
        let pushable = world
            .spawn_pushable(GridCoord::new(1, 0), BOXES)
            .expect("spawn");
        assert!(world.begin_push(pushable, Direction::Up));
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let outcome = issue(&mut controller, &mut world, Direction::Right);

        assert_eq!(outcome, CommandOutcome::Rejected(RejectReason::PushableMoving));
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn stale_occupancy_record_rejects_push() {
        let mut world = open_world();
        world
            .occupancy_mut()
            .claim(GridCoord::new(1, 0), PushableId(99));
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let outcome = issue(&mut controller, &mut world, Direction::Right);

        assert_eq!(outcome, CommandOutcome::Rejected(RejectReason::MissingPushable));
        assert!(!controller.is_moving());
    }

    #[test]
    fn facing_flips_even_when_move_is_rejected() {
        let mut world = open_world();
        world.spawn_wall(GridCoord::new(-1, 0), WALLS);
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);
        assert_eq!(controller.facing(), Facing::Right);

        let outcome = issue(&mut controller, &mut world, Direction::Left);

        assert_eq!(outcome, CommandOutcome::Rejected(RejectReason::Wall));
        assert_eq!(controller.facing(), Facing::Left);
        assert_eq!(controller.facing().mirror_x(), -1.0);
    }

    #[test]
    fn vertical_commands_keep_facing() {
        let mut world = open_world();
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);
        issue(&mut controller, &mut world, Direction::Left);
        run_until_idle(&mut controller, &mut world);

        issue(&mut controller, &mut world, Direction::Up);
        assert_eq!(controller.facing(), Facing::Left);
    }

    #[test]
    fn gated_commands_are_dropped_without_side_effects() {
        let mut world = open_world();
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);

        let zooming = CommandContext {
            zooming: true,
            input_disabled: false,
        };
        let locked = CommandContext {
            zooming: false,
            input_disabled: true,
        };

        assert_eq!(
            controller.handle_command(Direction::Left, zooming, &mut world),
            CommandOutcome::Ignored(IgnoreReason::Zooming)
        );
        assert_eq!(
            controller.handle_command(Direction::Left, locked, &mut world),
            CommandOutcome::Ignored(IgnoreReason::InputDisabled)
        );
        assert_eq!(controller.facing(), Facing::Right);
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.actor().target_cell, GridCoord::new(0, 0));
    }

    #[test]
    fn removing_pushable_during_delay_aborts_push() {
        let mut world = open_world();
        let pushable = world
            .spawn_pushable(GridCoord::new(1, 0), BOXES)
            .expect("spawn");
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);
        issue(&mut controller, &mut world, Direction::Right);

        assert!(world.remove_pushable(pushable));
        assert_eq!(controller.tick(DT, &mut world), None);

        assert_eq!(controller.state(), ControllerState::Idle);
        assert_resting_on_target(&controller, &world);
        assert_eq!(controller.actor().target_cell, GridCoord::new(0, 0));
        assert!(log.borrow().is_empty());

        let retry = issue(&mut controller, &mut world, Direction::Right);
        assert_eq!(retry, CommandOutcome::Started(MoveKind::Step));
    }

    #[test]
    fn removing_pushable_after_release_lets_actor_finish() {
        let mut world = open_world();
        let pushable = world
            .spawn_pushable(GridCoord::new(1, 0), BOXES)
            .expect("spawn");
        let log = new_log();
        let config = MovementConfig {
            push_delay_seconds: 0.0,
            ..MovementConfig::default()
        };
        let mut controller =
            GridMovementController::new(GridCoord::new(0, 0), config, recording(&log), &world);
        issue(&mut controller, &mut world, Direction::Right);
        controller.tick(DT, &mut world);
        assert!(matches!(controller.push_stage(), PushStage::ActorMove { .. }));

        world.remove_pushable(pushable);
        run_until_idle(&mut controller, &mut world);

        assert_eq!(controller.actor().target_cell, GridCoord::new(1, 0));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn missing_collaborators_do_not_block_arrival() {
        let mut world = open_world();
        let mut controller = GridMovementController::new(
            GridCoord::new(0, 0),
            MovementConfig::default(),
            Collaborators::default(),
            &world,
        );

        issue(&mut controller, &mut world, Direction::Right);
        run_until_idle(&mut controller, &mut world);

        assert_eq!(controller.actor().target_cell, GridCoord::new(1, 0));
        assert_eq!(controller.grid_position(), None);
    }

    #[test]
    fn controller_without_mapper_steps_and_pushes() {
        let mut world = open_world();
        let pushable = world
            .spawn_pushable(GridCoord::new(2, 0), BOXES)
            .expect("spawn");
        let mut controller = GridMovementController::new(
            GridCoord::new(0, 0),
            MovementConfig::default(),
            Collaborators::default(),
            &world,
        );
        let mut arrivals = Vec::new();

        for expected in [MoveKind::Step, MoveKind::Push { pushable }] {
            assert_eq!(
                issue(&mut controller, &mut world, Direction::Right),
                CommandOutcome::Started(expected)
            );
            for _ in 0..600 {
                world.tick_pushables(DT);
                if let Some(arrival) = controller.tick(DT, &mut world) {
                    arrivals.push(arrival);
                    break;
                }
            }
            run_until_idle(&mut controller, &mut world);
            assert_eq!(controller.grid_position(), None);
        }

        assert_eq!(
            arrivals,
            vec![
                Arrival {
                    from: GridCoord::new(0, 0),
                    to: GridCoord::new(1, 0),
                    kind: MoveKind::Step,
                },
                Arrival {
                    from: GridCoord::new(1, 0),
                    to: GridCoord::new(2, 0),
                    kind: MoveKind::Push { pushable },
                },
            ]
        );
        assert_resting_on_target(&controller, &world);
        assert_eq!(
            world.pushable(pushable).expect("pushable").cell(),
            GridCoord::new(3, 0)
        );
    }

    #[test]
    fn grid_position_reads_through_mapper() {
        let mut world = open_world();
        let collaborators = Collaborators::default()
            .with_grid_mapper(Box::new(RoundingMapper(*world.geometry())));
        let mut controller = GridMovementController::new(
            GridCoord::new(3, -1),
            MovementConfig::default(),
            collaborators,
            &world,
        );
        assert_eq!(controller.grid_position(), Some(GridCoord::new(3, -1)));

        issue(&mut controller, &mut world, Direction::Up);
        run_until_idle(&mut controller, &mut world);
        assert_eq!(controller.grid_position(), Some(GridCoord::new(3, 0)));
    }

    #[test]
    fn one_cell_step_takes_expected_ticks() {
        let mut world = open_world();
        let log = new_log();
        let mut controller = controller_at(GridCoord::new(0, 0), &world, &log);
        issue(&mut controller, &mut world, Direction::Right);

        let ticks = run_until_idle(&mut controller, &mut world);
        assert_eq!(ticks, 12);
    }
}
