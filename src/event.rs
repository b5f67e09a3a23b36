// Wire format of the publish/subscribe channel: topic names and payloads.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::MillisDuration;
use crate::coord::Coord;
use crate::move_record::TurnIndex;
use crate::piece::PromotionPiece;
use crate::player::PlayerInfo;
use crate::rules::CandidateMove;


#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self { GameId(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}


#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Topic {
    // "game/<id>/move". Inbound: `MoveNotification`. Outbound: `OutgoingMove`.
    GameMove(GameId),
    // "game/<id>/request/moves". Outbound: `MovesRequest`.
    GameMovesRequest(GameId),
    // "request/game". Outbound: `GameId`.
    GameRequest,
    // "game". Inbound: `GameDetails`, the answer to `GameRequest`.
    Game,
    // "game/not_found". Inbound: `GameId`.
    GameNotFound,
    // "request/games". Outbound, no payload: asks for all games of the current user.
    GamesRequest,
    // "games". Inbound: `Vec<GameDetails>`, the answer to `GamesRequest`.
    Games,
    // "seek/matched". Inbound: `GameDetails` of a game the server has just paired the user into.
    SeekMatched,
}

impl Topic {
    pub fn parse(s: &str) -> Option<Topic> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            ["request", "game"] => Some(Topic::GameRequest),
            ["game"] => Some(Topic::Game),
            ["game", "not_found"] => Some(Topic::GameNotFound),
            ["request", "games"] => Some(Topic::GamesRequest),
            ["games"] => Some(Topic::Games),
            ["seek", "matched"] => Some(Topic::SeekMatched),
            ["game", id, "move"] if !id.is_empty() => Some(Topic::GameMove(GameId::new(*id))),
            ["game", id, "request", "moves"] if !id.is_empty() => {
                Some(Topic::GameMovesRequest(GameId::new(*id)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::GameMove(id) => write!(f, "game/{id}/move"),
            Topic::GameMovesRequest(id) => write!(f, "game/{id}/request/moves"),
            Topic::GameRequest => write!(f, "request/game"),
            Topic::Game => write!(f, "game"),
            Topic::GameNotFound => write!(f, "game/not_found"),
            Topic::GamesRequest => write!(f, "request/games"),
            Topic::Games => write!(f, "games"),
            Topic::SeekMatched => write!(f, "seek/matched"),
        }
    }
}


// The server's broadcast of a move. The server assigns both the index and the timing.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveNotification {
    pub index: TurnIndex,
    pub from: Coord,
    pub to: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_to: Option<PromotionPiece>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<MillisDuration>,
}

impl MoveNotification {
    pub fn candidate_move(&self) -> CandidateMove {
        CandidateMove::new(self.from, self.to, self.promote_to)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMove {
    pub from: Coord,
    pub to: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_to: Option<PromotionPiece>,
}

impl From<CandidateMove> for OutgoingMove {
    fn from(mv: CandidateMove) -> Self {
        OutgoingMove { from: mv.from, to: mv.to, promote_to: mv.promote_to }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovesRequest {
    pub starting_index: TurnIndex,
}

// A move from the history prefix of `GameDetails`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub from: Coord,
    pub to: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_to: Option<PromotionPiece>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<MillisDuration>,
}

impl HistoryEntry {
    pub fn candidate_move(&self) -> CandidateMove {
        CandidateMove::new(self.from, self.to, self.promote_to)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOptions {
    pub initial_time_minutes: u64,
    pub time_increment_seconds: u64,
}

// Snapshot of a game as sent by the server when the client asks for it or joins it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDetails {
    pub id: GameId,
    pub white: PlayerInfo,
    pub black: PlayerInfo,
    pub options: GameOptions,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    // Milliseconds since Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
}


// Envelope used when the channel is a plain text stream (e.g. a WebSocket).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WireFrame {
    pub topic: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}


#[derive(Debug)]
pub enum MessageError {
    UnknownTopic(String),
    BadPayload { topic: String, error: serde_json::Error },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::UnknownTopic(topic) => write!(f, "unknown topic '{topic}'"),
            MessageError::BadPayload { topic, error } => {
                write!(f, "cannot decode payload for '{topic}': {error}")
            }
        }
    }
}

impl std::error::Error for MessageError {}

pub fn decode_payload<T: DeserializeOwned>(
    topic: &Topic, payload: serde_json::Value,
) -> Result<T, MessageError> {
    serde_json::from_value(payload).map_err(|error| MessageError::BadPayload {
        topic: topic.to_string(),
        error,
    })
}
