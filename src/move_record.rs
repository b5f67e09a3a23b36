use instant::Instant;

use crate::clock::MillisDuration;
use crate::force::Force;
use crate::rules::{CandidateMove, Position};


// Zero-based ply number. Equals the position of the move in the game history.
pub type TurnIndex = usize;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOrigin {
    // Made by the local user and sent to the server. Not echoed back yet.
    Local,
    // Known to the server: either received from it or echoed back after a local submission.
    Server,
}

// An entry in the game history. Everything except `elapsed` and `origin` is fixed at creation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveRecord {
    pub index: TurnIndex,
    pub force: Force,
    pub mv: CandidateMove,
    pub position_after: Position,
    // Thinking time as measured by the server. Arrives together with the server copy of the move,
    // which for local moves means later than the move itself.
    pub elapsed: Option<MillisDuration>,
    // Local time when the record was added to the history. Baseline for the running clock.
    pub applied_at: Instant,
    pub origin: MoveOrigin,
}

impl MoveRecord {
    pub fn is_confirmed(&self) -> bool { self.origin == MoveOrigin::Server }

    // Whether the server copy of a move describes the same move as this record. The server may
    // omit the promotion piece, so only two explicit and different pieces count as a mismatch.
    pub fn matches(&self, mv: &CandidateMove) -> bool {
        let same_promotion = match (self.mv.promote_to, mv.promote_to) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => true,
        };
        self.mv.from == mv.from && self.mv.to == mv.to && same_promotion
    }
}
