/// Cell statuses of the board state matrix.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellStatus {
    Empty,   // Free to fill / free to walk into
    Filled,  // Covered by a committed detail
    Player,  // Occupied by the character
}

impl CellStatus {
    /// Can a detail sub-cell or the character enter this cell?
    pub fn is_empty(self) -> bool {
        matches!(self, CellStatus::Empty)
    }

    /// Does this cell count toward the win condition?
    pub fn is_filled(self) -> bool {
        matches!(self, CellStatus::Filled)
    }

    /// Is this cell marked as the character's position?
    pub fn is_player(self) -> bool {
        matches!(self, CellStatus::Player)
    }

    /// Can a character standing one row above use this cell as footing?
    pub fn is_support(self) -> bool {
        !self.is_empty()
    }
}

impl Default for CellStatus {
    fn default() -> Self {
        CellStatus::Empty
    }
}
