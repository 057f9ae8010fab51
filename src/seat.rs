use crate::error::SeatingError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ROW_LETTERS: [char; 10] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];
pub const MAX_ROWS: u8 = 10;
pub const MAX_COLS: u8 = 10;

/// A seat identifier such as `B3`: row letter A-J, 1-based column.
///
/// Ordering is row-major, so a sorted map of seats reads A1, A2, ..., B1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatId {
    row: u8,
    col: u8,
}

impl SeatId {
    /// `row` is 0-based, `col` is 1-based.
    pub fn new(row: u8, col: u8) -> Result<Self, SeatingError> {
        if row >= MAX_ROWS || col == 0 || col > MAX_COLS {
            return Err(SeatingError::InvalidSeat(format!(
                "row {} / column {} is outside A1..{}{}",
                row,
                col,
                ROW_LETTERS[(MAX_ROWS - 1) as usize],
                MAX_COLS
            )));
        }
        Ok(Self { row, col })
    }

    pub fn row_letter(&self) -> char {
        ROW_LETTERS[self.row as usize]
    }

    pub fn in_layout(&self, layout: Layout) -> bool {
        self.row < layout.rows && self.col <= layout.cols
    }
}

impl FromStr for SeatId {
    type Err = SeatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let bad = || SeatingError::InvalidSeat(format!("'{}' is not a seat like A1", t));
        let mut chars = t.chars();
        let letter = chars.next().ok_or_else(bad)?.to_ascii_uppercase();
        let digits = chars.as_str();
        if digits.is_empty() || digits.starts_with('0') || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(bad());
        }
        let row = ROW_LETTERS
            .iter()
            .position(|c| *c == letter)
            .ok_or_else(bad)?;
        let col = digits.parse::<u8>().map_err(|_| bad())?;
        SeatId::new(row as u8, col)
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.col)
    }
}

impl Serialize for SeatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeatId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub rows: u8,
    pub cols: u8,
}

impl Default for Layout {
    fn default() -> Self {
        Self { rows: 4, cols: 6 }
    }
}

impl Layout {
    pub fn new(rows: u8, cols: u8) -> Result<Self, SeatingError> {
        if !(1..=MAX_ROWS).contains(&rows) || !(1..=MAX_COLS).contains(&cols) {
            return Err(SeatingError::InvalidLayout { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    pub fn seat_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Every seat of the grid, row-major.
    pub fn seats(&self) -> Vec<SeatId> {
        let mut out = Vec::with_capacity(self.seat_count());
        for row in 0..self.rows {
            for col in 1..=self.cols {
                out.push(SeatId { row, col });
            }
        }
        out
    }
}
