// One game as seen by the client: the move history, the clock and the link to the server.
//
// The session is the only thing that mutates its history. It is driven from two directions:
//   - the UI calls `submit_move`;
//   - the owner of the transport calls `process_message` for every inbound message.
// Both are synchronous. The UI learns about changes through observers.

use std::fmt;
use std::rc::Rc;

use enum_map::{enum_map, EnumMap};
use instant::Instant;
use log::{debug, info, log, Level};

use crate::clock::{ClockShowing, GameClock, MillisDuration, TimingStyle};
use crate::config::ClientConfig;
use crate::event::{
    decode_payload, GameDetails, GameId, MoveNotification, MovesRequest, OutgoingMove, Topic,
};
use crate::force::Force;
use crate::move_buffer::{BufferEvent, MoveSequenceBuffer};
use crate::move_record::{MoveRecord, TurnIndex};
use crate::player::{PlayerInfo, UserIdentity};
use crate::rules::{CandidateMove, Position, PositionOracle};
use crate::transport::{publish, Transport};
use crate::utc_time::UtcDateTime;


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SessionEvent {
    MoveApplied(MoveRecord),
    TimingUpdated { index: TurnIndex },
    MovesRetracted { from_index: TurnIndex },
    // The move is a promotion: the caller should ask the user for a piece and submit again.
    PromotionPieceNeeded(CandidateMove),
    GameOver,
}

impl From<BufferEvent> for SessionEvent {
    fn from(event: BufferEvent) -> Self {
        match event {
            BufferEvent::MoveApplied(record) => SessionEvent::MoveApplied(record),
            BufferEvent::TimingUpdated { index } => SessionEvent::TimingUpdated { index },
            BufferEvent::MovesRetracted { from_index } => SessionEvent::MovesRetracted { from_index },
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubmitOutcome {
    Applied(TurnIndex),
    PromotionPieceNeeded,
    Illegal,
    GameNotInProgress,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SessionSetupError {
    IllegalHistory { index: TurnIndex },
}

impl fmt::Display for SessionSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionSetupError::IllegalHistory { index } => {
                write!(f, "game history contains an illegal move at index {index}")
            }
        }
    }
}

impl std::error::Error for SessionSetupError {}

type Observer = Box<dyn FnMut(&SessionEvent)>;


pub struct GameSession {
    id: GameId,
    players: EnumMap<Force, PlayerInfo>,
    start_time: Option<UtcDateTime>,
    is_in_progress: bool,
    buffer: MoveSequenceBuffer,
    clock: GameClock,
    transport: Rc<dyn Transport>,
    oracle: Rc<dyn PositionOracle>,
    observers: Vec<Observer>,
    anomaly_level: Level,
}

impl GameSession {
    // Replays the history prefix from `details`, then subscribes to the game's moves and asks the
    // server for everything after the prefix.
    pub fn new(
        details: GameDetails, transport: Rc<dyn Transport>, oracle: Rc<dyn PositionOracle>,
        config: &ClientConfig, now: Instant,
    ) -> Result<Self, SessionSetupError> {
        let players = enum_map! {
            Force::White => details.white.clone(),
            Force::Black => details.black.clone(),
        };
        let mut buffer = MoveSequenceBuffer::new(Position::starting());
        buffer.set_anomaly_level(config.anomaly_level());
        for (index, entry) in details.history.iter().enumerate() {
            let notification = MoveNotification {
                index,
                from: entry.from,
                to: entry.to,
                promote_to: entry.promote_to,
                time: entry.time,
            };
            buffer.apply_notification(notification, oracle.as_ref(), now);
            if buffer.len() != index + 1 {
                return Err(SessionSetupError::IllegalHistory { index });
            }
        }

        let timing_style = TimingStyle::from_minutes_and_seconds(
            details.options.initial_time_minutes,
            details.options.time_increment_seconds,
        );
        let start_time = details.start_time.and_then(UtcDateTime::from_unix_millis);
        // Without a history the current turn began when the game did. Otherwise the replayed
        // records carry no local timestamps worth comparing to, so the count starts now.
        let clock_start = match start_time {
            Some(start_time) if buffer.is_empty() => UtcDateTime::now()
                .duration_since(start_time)
                .and_then(|since_start| now.checked_sub(since_start))
                .unwrap_or(now),
            _ => now,
        };
        let mut clock = GameClock::new(timing_style, clock_start);
        let is_in_progress = !oracle.status(&buffer.position()).is_terminal();
        if !is_in_progress {
            clock.stop(now);
        }
        let session = GameSession {
            id: details.id,
            players,
            start_time,
            is_in_progress,
            buffer,
            clock,
            transport,
            oracle,
            observers: vec![],
            anomaly_level: config.anomaly_level(),
        };
        session.transport.subscribe(&session.move_topic());
        session.resync();
        Ok(session)
    }

    pub fn id(&self) -> &GameId { &self.id }
    pub fn player(&self, force: Force) -> &PlayerInfo { &self.players[force] }
    pub fn start_time(&self) -> Option<UtcDateTime> { self.start_time }
    pub fn timing_style(&self) -> TimingStyle { self.clock.timing_style() }
    pub fn is_in_progress(&self) -> bool { self.is_in_progress }
    pub fn position(&self) -> Position { self.buffer.position() }
    pub fn history(&self) -> &[MoveRecord] { self.buffer.history() }
    pub fn pending_indices(&self) -> impl Iterator<Item = TurnIndex> + '_ {
        self.buffer.pending_indices()
    }
    pub fn clock(&self) -> &GameClock { &self.clock }

    // `None` if the user is only watching.
    pub fn force_of_user(&self, user: &UserIdentity) -> Option<Force> {
        self.players.iter().find(|(_, p)| user.is(p)).map(|(force, _)| force)
    }

    pub fn add_observer(&mut self, observer: impl FnMut(&SessionEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // For UI hints. `submit_move` performs the same check itself.
    pub fn is_legal_move(&self, mv: &CandidateMove) -> bool {
        self.is_in_progress && self.oracle.evaluate_move(&self.position(), mv).is_legal()
    }

    pub fn time_left(&self, force: Force, now: Instant) -> MillisDuration {
        self.clock.time_left(force, self.history(), self.position().side_to_move(), now)
    }

    pub fn showing_for(&self, force: Force, now: Instant) -> ClockShowing {
        self.clock.showing_for(force, self.history(), self.position().side_to_move(), now)
    }

    pub fn submit_move(&mut self, mv: CandidateMove, now: Instant) -> SubmitOutcome {
        if !self.is_in_progress {
            return SubmitOutcome::GameNotInProgress;
        }
        let evaluation = self.oracle.evaluate_move(&self.position(), &mv);
        let Some(position_after) = evaluation.resulting_position else {
            debug!("Ignoring illegal move {mv} in game {}", self.id);
            return SubmitOutcome::Illegal;
        };
        if evaluation.is_promotion && mv.promote_to.is_none() {
            self.notify(&SessionEvent::PromotionPieceNeeded(mv));
            return SubmitOutcome::PromotionPieceNeeded;
        }
        let mv = if evaluation.is_promotion { mv } else { CandidateMove { promote_to: None, ..mv } };
        let index = self.buffer.len();
        let events = self.buffer.push_local(mv, position_after, self.oracle.as_ref(), now);
        publish(self.transport.as_ref(), &self.move_topic(), &OutgoingMove::from(mv));
        self.dispatch(events, now);
        SubmitOutcome::Applied(index)
    }

    // Handles a raw inbound message. Messages for other topics are ignored.
    pub fn process_message(&mut self, topic: &Topic, payload: serde_json::Value, now: Instant) {
        if *topic != self.move_topic() {
            debug!("Game {} ignores message on {topic}", self.id);
            return;
        }
        match decode_payload::<MoveNotification>(topic, payload) {
            Ok(notification) => self.apply_notification(notification, now),
            Err(err) => log!(self.anomaly_level, "Dropping message: {err}"),
        }
    }

    // Still applied after the game is over: the server may finish replaying the history.
    pub fn apply_notification(&mut self, notification: MoveNotification, now: Instant) {
        let events = self.buffer.apply_notification(notification, self.oracle.as_ref(), now);
        self.dispatch(events, now);
    }

    // Asks the server to replay everything after the last known move. Used on construction and
    // whenever the transport reconnects.
    pub fn resync(&self) {
        let request = MovesRequest { starting_index: self.buffer.len() };
        publish(self.transport.as_ref(), &Topic::GameMovesRequest(self.id.clone()), &request);
    }

    // Terminal signal from outside the move history (resignation, flag fall, agreed draw). Only
    // the first call has an effect.
    pub fn end_game(&mut self, now: Instant) {
        if !self.is_in_progress {
            return;
        }
        info!("Game {} is over after {} moves", self.id, self.buffer.len());
        self.is_in_progress = false;
        self.clock.stop(now);
        self.notify(&SessionEvent::GameOver);
    }

    fn move_topic(&self) -> Topic { Topic::GameMove(self.id.clone()) }

    fn dispatch(&mut self, events: Vec<BufferEvent>, now: Instant) {
        let mut position_changed = false;
        for event in events {
            position_changed |= !matches!(event, BufferEvent::TimingUpdated { .. });
            self.notify(&SessionEvent::from(event));
        }
        if position_changed && self.oracle.status(&self.position()).is_terminal() {
            self.end_game(now);
        }
    }

    fn notify(&mut self, event: &SessionEvent) {
        for observer in self.observers.iter_mut() {
            observer(event);
        }
    }
}
