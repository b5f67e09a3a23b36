use enum_map::Enum;
use serde::{Deserialize, Serialize};
use strum::EnumIter;


#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Enum, EnumIter, Serialize, Deserialize,
)]
pub enum Force {
    White,
    Black,
}

impl Force {
    pub fn opponent(self) -> Force {
        match self {
            Force::White => Force::Black,
            Force::Black => Force::White,
        }
    }
}

impl From<chess::Color> for Force {
    fn from(color: chess::Color) -> Self {
        match color {
            chess::Color::White => Force::White,
            chess::Color::Black => Force::Black,
        }
    }
}

impl From<Force> for chess::Color {
    fn from(force: Force) -> Self {
        match force {
            Force::White => chess::Color::White,
            Force::Black => chess::Color::Black,
        }
    }
}
