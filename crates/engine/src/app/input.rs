use super::InputSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ZoomIn,
    ZoomOut,
    Quit,
}

const ACTION_COUNT: usize = 7;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::ZoomIn,
        InputAction::ZoomOut,
        InputAction::Quit,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::ZoomIn => 4,
            InputAction::ZoomOut => 5,
            InputAction::Quit => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    flags: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, value: bool) {
        self.flags[action.index()] = value;
    }

    pub(crate) fn get(&self, action: InputAction) -> bool {
        self.flags[action.index()]
    }

    fn clear(&mut self) {
        self.flags = [false; ACTION_COUNT];
    }
}

/// Turns held key state into press edges that last exactly one tick.
#[derive(Debug, Default)]
pub struct InputEdgeTracker {
    held: ActionStates,
    pressed_edges: ActionStates,
}

impl InputEdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_action_down(&mut self, action: InputAction, is_down: bool) {
        if is_down && !self.held.get(action) {
            self.pressed_edges.set(action, true);
        }
        self.held.set(action, is_down);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::from_pressed(self.pressed_edges);
        self.pressed_edges.clear();
        snapshot
    }
}
