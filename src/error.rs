use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatingError {
    #[error("{student} is already seated at {seat}")]
    AlreadySeated { student: String, seat: String },
    #[error("seat {seat} is occupied by {occupant}")]
    SeatOccupied { seat: String, occupant: String },
    #[error("there are no empty seats left")]
    NoEmptySeats,
    #[error("import a roster first")]
    EmptyRoster,
    #[error("there is no seating arrangement to export")]
    EmptyAssignment,
    #[error("invalid seat: {0}")]
    InvalidSeat(String),
    #[error("layout must be 1-10 rows by 1-10 columns (got {rows}x{cols})")]
    InvalidLayout { rows: u8, cols: u8 },
}

impl SeatingError {
    /// Stable code surfaced over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            SeatingError::AlreadySeated { .. } => "already_seated",
            SeatingError::SeatOccupied { .. } => "seat_occupied",
            SeatingError::NoEmptySeats => "no_empty_seats",
            SeatingError::EmptyRoster => "empty_roster",
            SeatingError::EmptyAssignment => "empty_assignment",
            SeatingError::InvalidSeat(_) => "bad_seat",
            SeatingError::InvalidLayout { .. } => "bad_layout",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            SeatingError::AlreadySeated { student, seat } => {
                Some(serde_json::json!({ "student": student, "seat": seat }))
            }
            SeatingError::SeatOccupied { seat, occupant } => {
                Some(serde_json::json!({ "seat": seat, "occupant": occupant }))
            }
            SeatingError::InvalidLayout { rows, cols } => {
                Some(serde_json::json!({ "rows": rows, "cols": cols }))
            }
            _ => None,
        }
    }
}
