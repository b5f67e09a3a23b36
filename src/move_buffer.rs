// Reconciles locally made moves and server notifications into one gapless history.
//
// There are two ways for a move to get into the history:
//   - `push_local`: the local user made a move. The caller has already checked it with the
//     oracle. The move always takes the next index.
//   - `apply_notification`: the server broadcast a move. It is checked with the oracle again
//     because a server message must never corrupt local state. Notifications may come in any
//     order and may be repeated.
// Notifications that arrive ahead of their predecessors wait in the pending buffer. Whenever the
// history grows, the buffer is drained, so the final history never depends on arrival order.

use std::collections::BTreeMap;

use instant::Instant;
use log::{debug, log, Level};

use crate::event::MoveNotification;
use crate::move_record::{MoveOrigin, MoveRecord, TurnIndex};
use crate::piece::PromotionPiece;
use crate::rules::{CandidateMove, Position, PositionOracle};


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BufferEvent {
    MoveApplied(MoveRecord),
    TimingUpdated { index: TurnIndex },
    // Unconfirmed local moves starting from this index were replaced by the server's version.
    MovesRetracted { from_index: TurnIndex },
}

#[derive(Clone, Debug)]
pub struct MoveSequenceBuffer {
    starting_position: Position,
    history: Vec<MoveRecord>,
    // Invariant: all keys are greater than `history.len()`.
    pending: BTreeMap<TurnIndex, MoveNotification>,
    anomaly_level: Level,
}

impl MoveSequenceBuffer {
    pub fn new(starting_position: Position) -> Self {
        MoveSequenceBuffer {
            starting_position,
            history: Vec::new(),
            pending: BTreeMap::new(),
            anomaly_level: Level::Warn,
        }
    }

    // Level used to log dropped server notifications.
    pub fn set_anomaly_level(&mut self, level: Level) { self.anomaly_level = level; }

    pub fn starting_position(&self) -> Position { self.starting_position }
    pub fn history(&self) -> &[MoveRecord] { &self.history }
    pub fn len(&self) -> usize { self.history.len() }
    pub fn is_empty(&self) -> bool { self.history.is_empty() }
    pub fn pending_indices(&self) -> impl Iterator<Item = TurnIndex> + '_ {
        self.pending.keys().copied()
    }

    // Position after the last applied move.
    pub fn position(&self) -> Position { self.position_before(self.history.len()) }

    pub fn position_before(&self, index: TurnIndex) -> Position {
        match index.checked_sub(1) {
            None => self.starting_position,
            Some(prev) => self.history[prev].position_after,
        }
    }

    // Appends a move made by the local user. The record stays unconfirmed until the server
    // echoes it back.
    pub fn push_local(
        &mut self, mv: CandidateMove, position_after: Position, oracle: &dyn PositionOracle,
        now: Instant,
    ) -> Vec<BufferEvent> {
        let record = MoveRecord {
            index: self.history.len(),
            force: self.position().side_to_move(),
            mv,
            position_after,
            elapsed: None,
            applied_at: now,
            origin: MoveOrigin::Local,
        };
        self.history.push(record.clone());
        let mut events = vec![BufferEvent::MoveApplied(record)];
        self.drain(oracle, now, &mut events);
        events
    }

    // Returns events in index order. Returns no events if the notification was dropped, stashed
    // or repeated information that was already known.
    pub fn apply_notification(
        &mut self, notification: MoveNotification, oracle: &dyn PositionOracle, now: Instant,
    ) -> Vec<BufferEvent> {
        let mut events = vec![];
        let index = notification.index;
        if let Some(record) = self.history.get(index) {
            let mv = notification.candidate_move();
            if record.matches(&mv) {
                self.confirm(notification, &mut events);
                return events;
            }
            if record.is_confirmed() {
                log!(
                    self.anomaly_level,
                    "Dropping move {mv} at index {index}: conflicts with confirmed move {}",
                    record.mv
                );
                return events;
            }
            if !oracle.evaluate_move(&self.position_before(index), &mv).is_legal() {
                log!(
                    self.anomaly_level,
                    "Dropping illegal move {mv} at index {index} (local move {} kept)",
                    record.mv
                );
                return events;
            }
            self.retract_from(index, &mut events);
        }
        if index > self.history.len() {
            debug!("Stashing move at index {index}, history length is {}", self.history.len());
            self.pending.insert(index, notification);
            return events;
        }
        if self.append_from_server(notification, oracle, now, &mut events) {
            self.drain(oracle, now, &mut events);
        }
        events
    }

    fn confirm(&mut self, notification: MoveNotification, events: &mut Vec<BufferEvent>) {
        let record = &mut self.history[notification.index];
        record.origin = MoveOrigin::Server;
        if let Some(elapsed) = notification.time {
            if record.elapsed != Some(elapsed) {
                record.elapsed = Some(elapsed);
                events.push(BufferEvent::TimingUpdated { index: notification.index });
            }
        }
    }

    // Removes all records starting from `index`. Confirmed records among them go back to the
    // pending buffer: they were checked against a position that no longer exists, so they are
    // checked again once their predecessors are in place.
    fn retract_from(&mut self, index: TurnIndex, events: &mut Vec<BufferEvent>) {
        debug!("Retracting moves starting from index {index}");
        for record in self.history.drain(index..) {
            if record.is_confirmed() {
                self.pending.insert(record.index, MoveNotification {
                    index: record.index,
                    from: record.mv.from,
                    to: record.mv.to,
                    promote_to: record.mv.promote_to,
                    time: record.elapsed,
                });
            }
        }
        events.push(BufferEvent::MovesRetracted { from_index: index });
    }

    fn drain(&mut self, oracle: &dyn PositionOracle, now: Instant, events: &mut Vec<BufferEvent>) {
        // An illegal entry is dropped, after which there is no entry for the current length.
        while let Some(notification) = self.pending.remove(&self.history.len()) {
            debug!("Applying stashed move at index {}", notification.index);
            self.append_from_server(notification, oracle, now, events);
        }
    }

    fn append_from_server(
        &mut self, notification: MoveNotification, oracle: &dyn PositionOracle, now: Instant,
        events: &mut Vec<BufferEvent>,
    ) -> bool {
        assert_eq!(notification.index, self.history.len());
        let position = self.position();
        let mv = notification.candidate_move();
        let evaluation = oracle.evaluate_move(&position, &mv);
        let Some(position_after) = evaluation.resulting_position else {
            log!(self.anomaly_level, "Dropping illegal move {mv} at index {}", notification.index);
            return false;
        };
        let promote_to = if evaluation.is_promotion {
            Some(mv.promote_to.unwrap_or(PromotionPiece::QUEEN))
        } else {
            None
        };
        let record = MoveRecord {
            index: notification.index,
            force: position.side_to_move(),
            mv: CandidateMove { promote_to, ..mv },
            position_after,
            elapsed: notification.time,
            applied_at: now,
            origin: MoveOrigin::Server,
        };
        self.history.push(record.clone());
        events.push(BufferEvent::MoveApplied(record));
        true
    }
}
