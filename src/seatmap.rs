use crate::error::SeatingError;
use crate::seat::{Layout, SeatId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::str::FromStr;

/// What `assign` does when the target seat already has someone in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OccupiedSeatPolicy {
    /// Replace the occupant; they drop back to unassigned.
    #[default]
    Overwrite,
    Reject,
}

impl OccupiedSeatPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccupiedSeatPolicy::Overwrite => "overwrite",
            OccupiedSeatPolicy::Reject => "reject",
        }
    }
}

impl FromStr for OccupiedSeatPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(OccupiedSeatPolicy::Overwrite),
            "reject" => Ok(OccupiedSeatPolicy::Reject),
            other => Err(format!("unknown occupied seat policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub seat: SeatId,
    pub displaced: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SeatMap {
    seats: BTreeMap<SeatId, String>,
    policy: OccupiedSeatPolicy,
}

impl SeatMap {
    pub fn new(policy: OccupiedSeatPolicy) -> Self {
        Self {
            seats: BTreeMap::new(),
            policy,
        }
    }

    pub fn assign(&mut self, student: &str, seat: SeatId) -> Result<Placement, SeatingError> {
        if let Some(existing) = self.seat_of(student) {
            return Err(SeatingError::AlreadySeated {
                student: student.to_string(),
                seat: existing.to_string(),
            });
        }
        let displaced = self.vacate_for(seat)?;
        self.seats.insert(seat, student.to_string());
        Ok(Placement { seat, displaced })
    }

    // Single decision point for assigning into an occupied seat.
    fn vacate_for(&self, seat: SeatId) -> Result<Option<String>, SeatingError> {
        let Some(occupant) = self.seats.get(&seat) else {
            return Ok(None);
        };
        match self.policy {
            OccupiedSeatPolicy::Overwrite => Ok(Some(occupant.clone())),
            OccupiedSeatPolicy::Reject => Err(SeatingError::SeatOccupied {
                seat: seat.to_string(),
                occupant: occupant.clone(),
            }),
        }
    }

    /// Drops every seat held by `student`, returning how many were cleared.
    pub fn remove(&mut self, student: &str) -> usize {
        let before = self.seats.len();
        self.seats.retain(|_, occupant| occupant != student);
        before - self.seats.len()
    }

    /// Replaces the whole map with a random arrangement of `roster` over the grid.
    pub fn randomize_all<R: Rng + ?Sized>(
        &mut self,
        roster: &[String],
        layout: Layout,
        rng: &mut R,
    ) -> usize {
        let mut students: Vec<&String> = roster.iter().collect();
        let mut seats = layout.seats();
        students.shuffle(rng);
        seats.shuffle(rng);

        self.seats = seats
            .into_iter()
            .zip(students)
            .map(|(seat, student)| (seat, student.clone()))
            .collect();
        self.seats.len()
    }

    pub fn randomize_one<R: Rng + ?Sized>(
        &mut self,
        student: &str,
        layout: Layout,
        rng: &mut R,
    ) -> Result<SeatId, SeatingError> {
        if let Some(existing) = self.seat_of(student) {
            return Err(SeatingError::AlreadySeated {
                student: student.to_string(),
                seat: existing.to_string(),
            });
        }
        let empty: Vec<SeatId> = layout
            .seats()
            .into_iter()
            .filter(|s| !self.seats.contains_key(s))
            .collect();
        let seat = *empty.choose(rng).ok_or(SeatingError::NoEmptySeats)?;
        self.assign(student, seat)?;
        Ok(seat)
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }

    /// First seat holding `student`, in seat order.
    pub fn seat_of(&self, student: &str) -> Option<SeatId> {
        self.seats
            .iter()
            .find(|(_, occupant)| occupant.as_str() == student)
            .map(|(seat, _)| *seat)
    }

    pub fn occupant(&self, seat: SeatId) -> Option<&str> {
        self.seats.get(&seat).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeatId, &str)> {
        self.seats.iter().map(|(seat, name)| (*seat, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Installs a mapping wholesale, e.g. one read back from an exported chart.
    pub fn replace_all(&mut self, seats: BTreeMap<SeatId, String>) {
        self.seats = seats;
    }
}
