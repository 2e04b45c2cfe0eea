/// Events emitted by the placement and movement engines.
/// The presentation layer consumes these for sound and messages.

use crate::domain::detail::{CellAddr, DetailId};
use crate::domain::movement::Transition;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    DragStarted { id: DetailId },
    DetailPlaced { id: DetailId, anchor: CellAddr },
    DetailReturned { id: DetailId },
    DetailPickedUp { id: DetailId },
    DetailRotated { id: DetailId },
    BoardCompleted,
    PlayerMoved { from: CellAddr, to: CellAddr, transition: Transition },
}
