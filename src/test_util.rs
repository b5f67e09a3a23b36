// Test utilities shared by unit tests and the "tests" folder.

use std::cell::RefCell;

use instant::Instant;
use rand::{Rng, SeedableRng};

use crate::clock::MillisDuration;
use crate::event::{GameDetails, GameId, GameOptions, HistoryEntry, MoveNotification, Topic};
use crate::force::Force;
use crate::move_record::{MoveOrigin, MoveRecord, TurnIndex};
use crate::player::PlayerInfo;
use crate::rules::{CandidateMove, Position};
use crate::transport::{OutgoingMessage, Transport};


// Permutation tests shuffle notifications. Let's fix the seed to keep failures reproducible.
pub fn deterministic_rng() -> impl Rng { rand::rngs::StdRng::from_seed([0; 32]) }

// Parses a move like "e2e4" or "e7e8q".
pub fn mv(uci: &str) -> CandidateMove {
    CandidateMove::from_uci(uci).unwrap_or_else(|err| panic!("Bad test move {uci:?}: {err}"))
}

pub fn notification(index: TurnIndex, uci: &str, time_ms: Option<u64>) -> MoveNotification {
    let m = mv(uci);
    MoveNotification {
        index,
        from: m.from,
        to: m.to,
        promote_to: m.promote_to,
        time: time_ms.map(MillisDuration::from_millis),
    }
}

// A confirmed record for clock tests. The position is a placeholder: the clock never looks at it.
pub fn record_at(
    index: TurnIndex, force: Force, mv: CandidateMove, applied_at: Instant,
    elapsed: Option<MillisDuration>,
) -> MoveRecord {
    MoveRecord {
        index,
        force,
        mv,
        position_after: Position::starting(),
        elapsed,
        applied_at,
        origin: MoveOrigin::Server,
    }
}

// A 5+0 game between Alice (white) and Bob (black).
pub fn sample_game_details(id: &str, history: &[&str]) -> GameDetails {
    GameDetails {
        id: GameId::new(id),
        white: PlayerInfo::new("Alice"),
        black: PlayerInfo::new("Bob"),
        options: GameOptions { initial_time_minutes: 5, time_increment_seconds: 0 },
        history: history
            .iter()
            .map(|uci| {
                let m = mv(uci);
                HistoryEntry { from: m.from, to: m.to, promote_to: m.promote_to, time: None }
            })
            .collect(),
        start_time: None,
    }
}


// Keeps everything that was sent, in order.
#[derive(Default, Debug)]
pub struct RecordingTransport {
    messages: RefCell<Vec<OutgoingMessage>>,
}

impl RecordingTransport {
    pub fn subscriptions(&self) -> Vec<Topic> {
        self.messages
            .borrow()
            .iter()
            .filter_map(|m| match m {
                OutgoingMessage::Subscribe { topic } => Some(topic.clone()),
                OutgoingMessage::Publish { .. } => None,
            })
            .collect()
    }

    pub fn published_to(&self, topic: &Topic) -> Vec<serde_json::Value> {
        self.messages
            .borrow()
            .iter()
            .filter_map(|m| match m {
                OutgoingMessage::Publish { topic: t, payload } if t == topic => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn subscribe(&self, topic: &Topic) {
        self.messages.borrow_mut().push(OutgoingMessage::Subscribe { topic: topic.clone() });
    }
    fn send(&self, topic: &Topic, payload: serde_json::Value) {
        self.messages.borrow_mut().push(OutgoingMessage::Publish { topic: topic.clone(), payload });
    }
}
