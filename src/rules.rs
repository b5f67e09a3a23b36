// Chess rules as seen by the synchronization core. The core never inspects the board itself:
// it hands a `Position` and a `CandidateMove` to a `PositionOracle` and trusts the answer.

use std::fmt;
use std::str::FromStr;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::coord::{Coord, CoordError};
use crate::force::Force;
use crate::piece::{PieceKind, PieceOnBoard, PromotionPiece};


#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PositionError(pub String);

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid position: {}", self.0)
    }
}

impl std::error::Error for PositionError {}


// Board state plus side to move. Immutable: a new position is produced by the oracle for every
// move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position(chess::Board);

impl Position {
    pub fn starting() -> Self { Position(chess::Board::default()) }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        chess::Board::from_str(fen)
            .map(Position)
            .map_err(|err| PositionError(format!("{fen:?}: {err:?}")))
    }
    pub fn to_fen(&self) -> String { self.0.to_string() }

    pub fn side_to_move(&self) -> Force { self.0.side_to_move().into() }

    pub fn piece_at(&self, coord: Coord) -> Option<PieceOnBoard> {
        let square = coord.into();
        Some(PieceOnBoard {
            kind: self.0.piece_on(square)?.into(),
            force: self.0.color_on(square)?.into(),
        })
    }

    fn board(&self) -> &chess::Board { &self.0 }
}

impl Default for Position {
    fn default() -> Self { Position::starting() }
}


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, new, Serialize, Deserialize)]
pub struct CandidateMove {
    pub from: Coord,
    pub to: Coord,
    pub promote_to: Option<PromotionPiece>,
}

impl CandidateMove {
    // Parses moves like "e2e4" or "e7e8q".
    pub fn from_uci(s: &str) -> Result<Self, CoordError> {
        let invalid = || CoordError::InvalidNotation(s.to_owned());
        let from = Coord::from_algebraic(s.get(0..2).ok_or_else(invalid)?)?;
        let to = Coord::from_algebraic(s.get(2..4).ok_or_else(invalid)?)?;
        let promote_to = match s.get(4..).ok_or_else(invalid)? {
            "" => None,
            p => Some(
                PieceKind::from_algebraic(p).and_then(PromotionPiece::new).ok_or_else(invalid)?,
            ),
        };
        Ok(CandidateMove { from, to, promote_to })
    }

    pub fn with_promotion(self, promote_to: PromotionPiece) -> Self {
        CandidateMove { promote_to: Some(promote_to), ..self }
    }
}

impl fmt::Display for CandidateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promote_to) = self.promote_to {
            write!(f, "{}", promote_to.code().to_ascii_lowercase())?;
        }
        Ok(())
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MoveEvaluation {
    // Whether the move is a pawn reaching the last rank. Reported even if the candidate move does
    // not specify a promotion piece.
    pub is_promotion: bool,
    // `None` iff the move is illegal.
    pub resulting_position: Option<Position>,
}

impl MoveEvaluation {
    pub fn illegal() -> Self {
        MoveEvaluation { is_promotion: false, resulting_position: None }
    }
    pub fn is_legal(&self) -> bool { self.resulting_position.is_some() }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PositionStatus {
    Ongoing,
    Checkmate { winner: Force },
    Stalemate,
}

impl PositionStatus {
    pub fn is_terminal(self) -> bool { self != PositionStatus::Ongoing }
}

pub trait PositionOracle {
    // If the move is a promotion and `promote_to` is missing, legality is judged as if the pawn
    // was promoted to a queen. A promotion piece is ignored for moves that are not promotions.
    fn evaluate_move(&self, position: &Position, mv: &CandidateMove) -> MoveEvaluation;

    fn status(&self, position: &Position) -> PositionStatus;
}


// Orthodox chess rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardChessOracle;

impl PositionOracle for StandardChessOracle {
    fn evaluate_move(&self, position: &Position, mv: &CandidateMove) -> MoveEvaluation {
        let board = position.board();
        let from = chess::Square::from(mv.from);
        let to = chess::Square::from(mv.to);
        let side = board.side_to_move();
        let last_rank = match side {
            chess::Color::White => chess::Rank::Eighth,
            chess::Color::Black => chess::Rank::First,
        };
        let is_promotion = board.piece_on(from) == Some(chess::Piece::Pawn)
            && board.color_on(from) == Some(side)
            && to.get_rank() == last_rank;
        let promotion = is_promotion.then(|| {
            chess::Piece::from(mv.promote_to.unwrap_or(PromotionPiece::QUEEN).kind())
        });
        let chess_move = chess::ChessMove::new(from, to, promotion);
        if !board.legal(chess_move) {
            return MoveEvaluation::illegal();
        }
        MoveEvaluation {
            is_promotion,
            resulting_position: Some(Position(board.make_move_new(chess_move))),
        }
    }

    fn status(&self, position: &Position) -> PositionStatus {
        match position.board().status() {
            chess::BoardStatus::Ongoing => PositionStatus::Ongoing,
            chess::BoardStatus::Stalemate => PositionStatus::Stalemate,
            chess::BoardStatus::Checkmate => PositionStatus::Checkmate {
                winner: position.side_to_move().opponent(),
            },
        }
    }
}
