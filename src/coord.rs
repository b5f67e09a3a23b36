use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};


pub const NUM_ROWS: u8 = 8;
pub const NUM_COLS: u8 = 8;
pub const NUM_SQUARES: u8 = NUM_ROWS * NUM_COLS;


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CoordError {
    SquareNumberOutOfRange(u64),
    InvalidNotation(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::SquareNumberOutOfRange(n) => write!(f, "square number {n} is off the board"),
            CoordError::InvalidNotation(s) => write!(f, "'{s}' is not a square"),
        }
    }
}

impl std::error::Error for CoordError {}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Row {
    idx: u8, // 0-based
}

impl Row {
    pub const fn from_zero_based(idx: u8) -> Self {
        assert!(idx < NUM_ROWS);
        Self { idx }
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        let idx = (ch as u32).checked_sub('1' as u32)?;
        (idx < NUM_ROWS as u32).then(|| Self::from_zero_based(idx as u8))
    }
    pub const fn to_zero_based(self) -> u8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx + b'1') as char }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_ROWS).map(Self::from_zero_based)
    }
}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Col {
    idx: u8, // 0-based
}

impl Col {
    pub const fn from_zero_based(idx: u8) -> Self {
        assert!(idx < NUM_COLS);
        Self { idx }
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        let idx = (ch as u32).checked_sub('a' as u32)?;
        (idx < NUM_COLS as u32).then(|| Self::from_zero_based(idx as u8))
    }
    pub const fn to_zero_based(self) -> u8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx + b'a') as char }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_COLS).map(Self::from_zero_based)
    }
}


// A square on the board. On the wire squares are identified by their number: a1 = 0, b1 = 1, ...,
// h1 = 7, a2 = 8, ..., h8 = 63.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Coord {
    pub row: Row,
    pub col: Col,
}

impl Coord {
    pub const fn new(row: Row, col: Col) -> Self { Self { row, col } }

    pub fn from_square_number(n: u64) -> Result<Self, CoordError> {
        if n >= NUM_SQUARES as u64 {
            return Err(CoordError::SquareNumberOutOfRange(n));
        }
        let n = n as u8;
        Ok(Coord::new(Row::from_zero_based(n / NUM_COLS), Col::from_zero_based(n % NUM_COLS)))
    }
    pub fn to_square_number(self) -> u8 {
        self.row.to_zero_based() * NUM_COLS + self.col.to_zero_based()
    }

    pub fn from_algebraic(s: &str) -> Result<Self, CoordError> {
        let invalid = || CoordError::InvalidNotation(s.to_owned());
        let (col_ch, row_ch) = s.chars().collect_tuple().ok_or_else(invalid)?;
        let col = Col::from_algebraic(col_ch).ok_or_else(invalid)?;
        let row = Row::from_algebraic(row_ch).ok_or_else(invalid)?;
        Ok(Coord::new(row, col))
    }
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.col.to_algebraic(), self.row.to_algebraic())
    }

    pub fn all() -> impl Iterator<Item = Coord> {
        Row::all().cartesian_product(Col::all()).map(|(row, col)| Coord::new(row, col))
    }
}

impl TryFrom<u8> for Coord {
    type Error = CoordError;
    fn try_from(n: u8) -> Result<Self, CoordError> { Coord::from_square_number(n.into()) }
}

impl From<Coord> for u8 {
    fn from(coord: Coord) -> Self { coord.to_square_number() }
}

impl From<Coord> for chess::Square {
    fn from(coord: Coord) -> Self {
        chess::Square::make_square(
            chess::Rank::from_index(coord.row.to_zero_based().into()),
            chess::File::from_index(coord.col.to_zero_based().into()),
        )
    }
}

impl From<chess::Square> for Coord {
    fn from(square: chess::Square) -> Self {
        Coord::new(
            Row::from_zero_based(square.get_rank().to_index() as u8),
            Col::from_zero_based(square.get_file().to_index() as u8),
        )
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.col.to_algebraic(), self.row.to_algebraic())
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({self})")
    }
}
