// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use instant::Instant;
use live_chess::config::ClientConfig;
use live_chess::event::{GameDetails, GameId, Topic};
use live_chess::rules::StandardChessOracle;
use live_chess::session::{GameSession, SessionEvent};
use live_chess::test_util::{mv, RecordingTransport};
use serde_json::json;


// Inbound move payload exactly as the server sends it.
#[allow(dead_code)]
pub fn move_payload(index: usize, uci: &str, time_ms: Option<u64>) -> serde_json::Value {
    let m = mv(uci);
    let mut payload = json!({
        "index": index,
        "from": m.from.to_square_number(),
        "to": m.to.to_square_number(),
    });
    if let Some(p) = m.promote_to {
        payload["promoteTo"] = json!(p.code().to_string());
    }
    if let Some(t) = time_ms {
        payload["time"] = json!(t);
    }
    payload
}

// A session wired to a recording transport, with a synthetic clock: `at(ms)` is `ms`
// milliseconds after the session was created.
#[allow(dead_code)]
pub struct TestSession {
    pub session: GameSession,
    pub transport: Rc<RecordingTransport>,
    events: Rc<RefCell<Vec<SessionEvent>>>,
    t0: Instant,
}

impl TestSession {
    #[allow(dead_code)]
    pub fn new(details: GameDetails) -> Self {
        let t0 = Instant::now();
        let transport = Rc::new(RecordingTransport::default());
        let mut session = GameSession::new(
            details,
            transport.clone(),
            Rc::new(StandardChessOracle),
            &ClientConfig::default(),
            t0,
        )
        .unwrap();
        let events = Rc::new(RefCell::new(vec![]));
        let sink = Rc::clone(&events);
        session.add_observer(move |e| sink.borrow_mut().push(e.clone()));
        TestSession { session, transport, events, t0 }
    }

    #[allow(dead_code)]
    pub fn at(&self, ms: u64) -> Instant { self.t0 + Duration::from_millis(ms) }

    #[allow(dead_code)]
    pub fn take_events(&self) -> Vec<SessionEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    #[allow(dead_code)]
    pub fn moves(&self) -> Vec<String> {
        self.session.history().iter().map(|r| r.mv.to_string()).collect()
    }

    #[allow(dead_code)]
    pub fn move_topic(&self) -> Topic { Topic::GameMove(self.session.id().clone()) }

    #[allow(dead_code)]
    pub fn deliver(&mut self, index: usize, uci: &str, time_ms: Option<u64>, at_ms: u64) {
        self.deliver_raw(move_payload(index, uci, time_ms), at_ms);
    }

    #[allow(dead_code)]
    pub fn deliver_raw(&mut self, payload: serde_json::Value, at_ms: u64) {
        let topic = self.move_topic();
        let now = self.at(at_ms);
        self.session.process_message(&topic, payload, now);
    }

    // Moves the session has sent to the server.
    #[allow(dead_code)]
    pub fn sent_moves(&self) -> Vec<serde_json::Value> {
        self.transport.published_to(&self.move_topic())
    }

    #[allow(dead_code)]
    pub fn replay_requests(&self) -> Vec<serde_json::Value> {
        self.transport.published_to(&Topic::GameMovesRequest(self.session.id().clone()))
    }
}

#[allow(dead_code)]
pub fn game_id(id: &str) -> GameId { GameId::new(id) }
