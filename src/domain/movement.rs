/// Stepping rules for the character: single source of truth.
///
/// ## Architecture
///
/// One move attempt in a horizontal direction looks at three vertically
/// stacked cells in the adjacent column:
///
/// ```text
///          col x±1
///   top    (y - 1)     step up
///   near   (y)         step level
///   bottom (y + 1)     step down
/// ```
///
/// Two layers, computed fresh per attempt and never stored:
///   1. SCAN:     `scan()` builds the three `Candidate`s (coordinates +
///                 availability). Undefined coordinates are `None`.
///   2. SELECT:   `select()` applies the priority policy and returns the
///                 target cell, if any.
/// `classify()` then names the transition for the animation layer.
///
/// ## Row `-1`
///
/// `y == -1` is the open-air row just above the board. A candidate on that
/// row is always available (nothing is ever stored there), and a character
/// standing on it has no `top` candidate.
///
/// ## Availability Truth Table
/// ┌────────────────────────────────────┬───────────┐
/// │ Candidate                           │ Available │
/// ├────────────────────────────────────┼───────────┤
/// │ x undefined (board edge)            │ NO        │
/// │ y undefined (top of row -1 / floor) │ NO        │
/// │ y == -1                             │ YES       │
/// │ board cell Empty                    │ YES       │
/// │ board cell Filled / Player / void   │ NO        │
/// └────────────────────────────────────┴───────────┘
///
/// ## Selection Policy (priority order)
/// ┌─────────────────────────────────────────────────────────┬────────────┐
/// │ Condition                                                │ Target     │
/// ├─────────────────────────────────────────────────────────┼────────────┤
/// │ bottom available AND near empty AND cell under bottom   │ bottom     │
/// │ is not Empty (floor row counts as footing)               │ (down)     │
/// │ bottom NOT available AND near available                  │ near       │
/// │ near NOT available AND top available                     │ top (up)   │
/// │ otherwise                                                │ no move    │
/// └─────────────────────────────────────────────────────────┴────────────┘
/// A bottom cell with nothing under it would be a multi-row fall, which is
/// not modelled: that case falls through every rule and is a no-move.

use super::board::Board;
use super::detail::{CellAddr, Facing};

/// The row above the board.
pub const SKY_ROW: i32 = -1;

/// One of the three cells considered for a step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Candidate {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub available: bool,
}

impl Candidate {
    fn new(board: &Board, x: Option<i32>, y: Option<i32>) -> Self {
        Candidate { x, y, available: is_open(board, x, y) }
    }

    /// Both coordinates, if defined.
    pub fn cell(&self) -> Option<CellAddr> {
        Some(CellAddr::new(self.x?, self.y?))
    }
}

/// Top / near / bottom candidates in one direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Candidates {
    pub top: Candidate,
    pub near: Candidate,
    pub bottom: Candidate,
}

impl Candidates {
    /// Movement in this direction is possible at all.
    pub fn any_available(&self) -> bool {
        self.bottom.available || self.near.available || self.top.available
    }
}

/// Which of the three rules fired.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepKind {
    Down,
    Level,
    Up,
}

/// Jump sub-direction, named by *row index* change: `Up` means the row index
/// grew (the character went visually down the screen).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpKind {
    Up,
    Down,
}

/// Animation category of a completed step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transition {
    Run(Facing),
    Jump(Facing, JumpKind),
}

impl Transition {
    pub fn facing(self) -> Facing {
        match self {
            Transition::Run(f) | Transition::Jump(f, _) => f,
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Transition::Jump(..))
    }
}

/// Availability of `(x, y)`. See truth table above.
#[inline]
pub fn is_open(board: &Board, x: Option<i32>, y: Option<i32>) -> bool {
    match (x, y) {
        (Some(_), Some(SKY_ROW)) => true,
        (Some(x), Some(y)) => board.is_empty_at(x, y),
        _ => false,
    }
}

/// Adjacent column in `dir`, or `None` at the board edge.
pub fn adjacent_x(board: &Board, x: i32, dir: Facing) -> Option<i32> {
    match dir {
        Facing::Left => (x != 0).then(|| x - 1),
        Facing::Right => (x != board.max_x()).then(|| x + 1),
    }
}

/// Build the three candidates for a move from `pos` in `dir`.
pub fn scan(board: &Board, pos: CellAddr, dir: Facing) -> Candidates {
    let x = adjacent_x(board, pos.x, dir);
    let y_top = (pos.y != SKY_ROW).then(|| pos.y - 1);
    let y_near = Some(pos.y);
    let y_bottom = (pos.y != board.max_y()).then(|| pos.y + 1);

    Candidates {
        top: Candidate::new(board, x, y_top),
        near: Candidate::new(board, x, y_near),
        bottom: Candidate::new(board, x, y_bottom),
    }
}

/// Does the cell under `bottom` give footing? The floor row always does.
fn has_footing_under(board: &Board, bottom: &Candidate) -> bool {
    let (Some(x), Some(y)) = (bottom.x, bottom.y) else { return true };
    if y == board.max_y() {
        return true;
    }
    match board.get(x, y + 1) {
        Ok(status) => status.is_support(),
        Err(_) => true,
    }
}

/// Apply the selection policy. See truth table above.
pub fn select(board: &Board, c: &Candidates) -> Option<(CellAddr, StepKind)> {
    let near_empty = is_open(board, c.near.x, c.near.y);

    if c.bottom.available && near_empty && has_footing_under(board, &c.bottom) {
        return c.bottom.cell().map(|cell| (cell, StepKind::Down));
    }
    if !c.bottom.available && c.near.available {
        return c.near.cell().map(|cell| (cell, StepKind::Level));
    }
    if !c.near.available && c.top.available {
        return c.top.cell().map(|cell| (cell, StepKind::Up));
    }
    None
}

/// Name the transition from `old` to `new`.
pub fn classify(old: CellAddr, new: CellAddr) -> Transition {
    let facing = if new.x > old.x { Facing::Right } else { Facing::Left };
    if old.y == new.y {
        Transition::Run(facing)
    } else if new.y > old.y {
        Transition::Jump(facing, JumpKind::Up)
    } else {
        Transition::Jump(facing, JumpKind::Down)
    }
}

/// Full decision for one attempt: target and transition, or `None`.
pub fn plan_step(board: &Board, pos: CellAddr, dir: Facing) -> Option<(CellAddr, Transition)> {
    let candidates = scan(board, pos, dir);
    if !candidates.any_available() {
        return None;
    }
    let (target, _) = select(board, &candidates)?;
    Some((target, classify(pos, target)))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
