mod collaborators;

use std::cell::RefCell;
use std::rc::Rc;

use engine::{
    Arrival, Camera2D, CommandContext, CommandOutcome, Direction, GridMovementController,
    GridWorld, InputAction, InputSnapshot, Scene, SceneCommand, Vec2,
};
use tracing::{debug, info, warn};

use super::level::{Level, TriggerZone};
use super::report::{ActorReport, CommandStats, PushableReport, ReportHandle, StateReport};
use collaborators::{session_collaborators, SessionLedger, SharedLedger};

struct PuzzleSession {
    world: GridWorld,
    controller: GridMovementController,
}

/// Drives one level: zoom and input-lock gates, the movement controller,
/// pushables, and trigger zones.
pub(crate) struct GridPuzzleScene {
    level: Level,
    session: Option<PuzzleSession>,
    camera: Camera2D,
    input_lock_seconds: f32,
    ledger: SharedLedger,
    commands: CommandStats,
    ticks: u64,
    report: ReportHandle,
}

impl GridPuzzleScene {
    pub(crate) fn new(level: Level, report: ReportHandle) -> Self {
        let ledger = Rc::new(RefCell::new(SessionLedger::new(level.max_health)));
        Self {
            level,
            session: None,
            camera: Camera2D::default(),
            input_lock_seconds: 0.0,
            ledger,
            commands: CommandStats::default(),
            ticks: 0,
            report,
        }
    }

    fn build_session(&self) -> PuzzleSession {
        let movement = self.level.movement;
        let mut world = GridWorld::new(&movement, Vec2::ZERO);
        for &cell in &self.level.walls {
            world.spawn_wall(cell, movement.wall_layer);
        }
        for &cell in &self.level.pushables {
            if let Err(error) = world.spawn_pushable(cell, movement.pushable_layer) {
                warn!(error = %error, "pushable_spawn_skipped");
            }
        }
        let collaborators = session_collaborators(&self.ledger, *world.geometry());
        let controller =
            GridMovementController::new(self.level.spawn, movement, collaborators, &world);
        PuzzleSession { world, controller }
    }

    fn record_outcome(&mut self, direction: Direction, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::Started(_) => self.commands.started += 1,
            CommandOutcome::Rejected(_) => self.commands.rejected += 1,
            CommandOutcome::Ignored(_) => self.commands.ignored += 1,
        }
        debug!(direction = direction.label(), ?outcome, tick = self.ticks, "command_handled");
    }

    fn apply_triggers(&mut self, arrival: Arrival) {
        let hit = self
            .level
            .triggers
            .iter()
            .find(|trigger| trigger.cell == arrival.to)
            .copied();
        if let Some(TriggerZone { cell, lock_seconds }) = hit {
            self.input_lock_seconds = self.input_lock_seconds.max(lock_seconds);
            info!(%cell, lock_seconds, "input_locked_by_trigger");
        }
    }

    fn build_report(&self) -> Option<StateReport> {
        let session = self.session.as_ref()?;
        let actor = session.controller.actor();
        let ledger = self.ledger.borrow();
        Some(StateReport {
            level: self.level.name.clone(),
            ticks: self.ticks,
            stop_reason: None,
            actor: ActorReport {
                cell: actor.target_cell,
                grid_position: session.controller.grid_position(),
                world_position: actor.world_position,
                facing: actor.facing,
                is_moving: actor.is_moving,
            },
            pushables: session
                .world
                .pushables()
                .map(|body| PushableReport {
                    id: body.id().0,
                    cell: body.cell(),
                    is_moving: body.is_moving(),
                })
                .collect(),
            footprints: ledger.footprints.iter().copied().collect(),
            move_sounds: ledger.move_sounds,
            moves_finished: ledger.moves_finished,
            health: ledger.health,
            max_health: ledger.max_health,
            commands: self.commands,
            camera_zoom: self.camera.zoom(),
        })
    }
}

fn move_action(direction: Direction) -> InputAction {
    match direction {
        Direction::Up => InputAction::MoveUp,
        Direction::Down => InputAction::MoveDown,
        Direction::Left => InputAction::MoveLeft,
        Direction::Right => InputAction::MoveRight,
    }
}

fn pressed_direction(input: &InputSnapshot) -> Option<Direction> {
    Direction::PRIORITY
        .into_iter()
        .find(|direction| input.is_pressed(move_action(*direction)))
}

fn zoom_steps(input: &InputSnapshot) -> i32 {
    let mut steps = 0;
    if input.is_pressed(InputAction::ZoomIn) {
        steps += 1;
    }
    if input.is_pressed(InputAction::ZoomOut) {
        steps -= 1;
    }
    steps
}

impl Scene for GridPuzzleScene {
    fn load(&mut self) {
        let session = self.build_session();
        info!(
            level = %self.level.name,
            spawn = %self.level.spawn,
            walls = session.world.occupancy().wall_count(),
            pushables = session.world.pushable_count(),
            triggers = self.level.triggers.len(),
            "level_built"
        );
        self.session = Some(session);
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if self.session.is_none() {
            return SceneCommand::None;
        }
        self.ticks += 1;
        if input.quit_requested() {
            return SceneCommand::Quit {
                reason: "quit_requested",
            };
        }

        self.camera.tick(fixed_dt_seconds);
        self.camera.apply_zoom_steps(zoom_steps(input));
        self.input_lock_seconds = (self.input_lock_seconds - fixed_dt_seconds).max(0.0);

        let context = CommandContext {
            zooming: self.camera.is_zooming(),
            input_disabled: self.input_lock_seconds > 0.0,
        };
        let direction = pressed_direction(input);

        let Some(session) = self.session.as_mut() else {
            return SceneCommand::None;
        };
        let outcome = direction.map(|direction| {
            let outcome = session
                .controller
                .handle_command(direction, context, &mut session.world);
            (direction, outcome)
        });
        session.world.tick_pushables(fixed_dt_seconds);
        let arrival = session.controller.tick(fixed_dt_seconds, &mut session.world);

        if let Some((direction, outcome)) = outcome {
            self.record_outcome(direction, outcome);
        }
        if let Some(arrival) = arrival {
            self.apply_triggers(arrival);
        }

        if self.ledger.borrow().is_out_of_health() {
            return SceneCommand::Quit {
                reason: "out_of_health",
            };
        }
        SceneCommand::None
    }

    fn unload(&mut self) {
        if let Some(report) = self.build_report() {
            self.report.publish(report);
        }
        self.session = None;
        info!(level = %self.level.name, ticks = self.ticks, "level_unloaded");
    }

    fn is_settled(&self) -> bool {
        let Some(session) = self.session.as_ref() else {
            return true;
        };
        !session.controller.is_moving()
            && !session.world.any_pushable_moving()
            && !self.camera.is_zooming()
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!("gridpush: {}", self.level.name))
    }
}
