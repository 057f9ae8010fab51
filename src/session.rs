use crate::error::SeatingError;
use crate::roster::RosterStore;
use crate::seat::{Layout, SeatId};
use crate::seatmap::{OccupiedSeatPolicy, Placement, SeatMap};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingSummary {
    pub total_seats: usize,
    pub occupied_seats: usize,
    pub empty_seats: usize,
    pub total_students: usize,
    pub unassigned_students: usize,
}

/// One classroom being arranged: roster, grid and who sits where.
#[derive(Debug, Clone)]
pub struct Session {
    pub roster: RosterStore,
    pub seats: SeatMap,
    layout: Layout,
}

impl Session {
    pub fn new(layout: Layout, policy: OccupiedSeatPolicy) -> Self {
        Self {
            roster: RosterStore::new(),
            seats: SeatMap::new(policy),
            layout,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    // Existing assignments are left alone, even if they now fall outside the grid.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn assign(&mut self, student: &str, seat: SeatId) -> Result<Placement, SeatingError> {
        self.seats.assign(student, seat)
    }

    pub fn randomize_all<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, SeatingError> {
        if self.roster.is_empty() {
            return Err(SeatingError::EmptyRoster);
        }
        Ok(self.seats.randomize_all(self.roster.list(), self.layout, rng))
    }

    pub fn randomize_one<R: Rng + ?Sized>(
        &mut self,
        student: &str,
        rng: &mut R,
    ) -> Result<SeatId, SeatingError> {
        if self.roster.is_empty() {
            return Err(SeatingError::EmptyRoster);
        }
        self.seats.randomize_one(student, self.layout, rng)
    }

    pub fn unassigned_students(&self) -> Vec<&str> {
        self.roster
            .list()
            .iter()
            .filter(|name| self.seats.seat_of(name).is_none())
            .map(|s| s.as_str())
            .collect()
    }

    /// Occupants of the current grid, one inner vec per row.
    pub fn seating_grid(&self) -> Vec<Vec<Option<&str>>> {
        (0..self.layout.rows)
            .map(|row| {
                (1..=self.layout.cols)
                    .map(|col| {
                        SeatId::new(row, col)
                            .ok()
                            .and_then(|seat| self.seats.occupant(seat))
                    })
                    .collect()
            })
            .collect()
    }

    pub fn orphaned_seats(&self) -> Vec<(SeatId, &str)> {
        self.seats
            .iter()
            .filter(|(seat, _)| !seat.in_layout(self.layout))
            .collect()
    }

    pub fn summary(&self) -> SeatingSummary {
        let total_seats = self.layout.seat_count();
        let occupied_seats = self
            .seats
            .iter()
            .filter(|(seat, _)| seat.in_layout(self.layout))
            .count();
        SeatingSummary {
            total_seats,
            occupied_seats,
            empty_seats: total_seats - occupied_seats,
            total_students: self.roster.len(),
            unassigned_students: self.unassigned_students().len(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Layout::default(), OccupiedSeatPolicy::default())
    }
}
