// All games the client knows about, plus requests for games it does not know yet.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use instant::Instant;
use itertools::Itertools;
use log::{debug, info, log};

use crate::config::ClientConfig;
use crate::event::{decode_payload, GameDetails, GameId, Topic};
use crate::player::UserIdentity;
use crate::rules::PositionOracle;
use crate::session::{GameSession, SessionSetupError};
use crate::transport::{publish, Transport};


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameLookup {
    Ready,
    // The server has been asked. The answer will come as `DirectoryEvent::LookupResolved` or
    // `DirectoryEvent::LookupFailed`.
    Pending,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameLookupError {
    NotFound,
    // The server did not answer in time. The game may still exist.
    Timeout,
    InvalidGame(SessionSetupError),
}

impl fmt::Display for GameLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameLookupError::NotFound => write!(f, "game not found"),
            GameLookupError::Timeout => write!(f, "server did not answer in time"),
            GameLookupError::InvalidGame(err) => write!(f, "invalid game: {err}"),
        }
    }
}

impl std::error::Error for GameLookupError {}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DirectoryEvent {
    // A game arrived without being requested (e.g. a seek was matched).
    GameAdded(GameId),
    LookupResolved(GameId),
    LookupFailed { id: GameId, error: GameLookupError },
    // Answer to `request_games`: every game in the user's list that the directory now knows.
    GameListResolved(Vec<GameId>),
    GameListTimedOut,
}


pub struct GameDirectory {
    transport: Rc<dyn Transport>,
    oracle: Rc<dyn PositionOracle>,
    config: ClientConfig,
    sessions: BTreeMap<GameId, GameSession>,
    // Value: when the request was sent.
    pending_lookups: BTreeMap<GameId, Instant>,
    game_list_requested_at: Option<Instant>,
    // Once the server has sent the list, new games reach the client one by one.
    is_game_list_known: bool,
}

impl GameDirectory {
    pub fn new(
        transport: Rc<dyn Transport>, oracle: Rc<dyn PositionOracle>, config: ClientConfig,
    ) -> Self {
        GameDirectory {
            transport,
            oracle,
            config,
            sessions: BTreeMap::new(),
            pending_lookups: BTreeMap::new(),
            game_list_requested_at: None,
            is_game_list_known: false,
        }
    }

    pub fn config(&self) -> &ClientConfig { &self.config }
    pub fn session(&self, id: &GameId) -> Option<&GameSession> { self.sessions.get(id) }
    pub fn session_mut(&mut self, id: &GameId) -> Option<&mut GameSession> {
        self.sessions.get_mut(id)
    }
    pub fn sessions(&self) -> impl Iterator<Item = &GameSession> { self.sessions.values() }
    pub fn is_lookup_pending(&self, id: &GameId) -> bool { self.pending_lookups.contains_key(id) }

    pub fn has_games_in_progress(&self, user: &UserIdentity) -> bool {
        self.sessions.values().any(|s| s.is_in_progress() && s.force_of_user(user).is_some())
    }

    pub fn request_game(&mut self, id: &GameId, now: Instant) -> GameLookup {
        if self.sessions.contains_key(id) {
            return GameLookup::Ready;
        }
        if !self.pending_lookups.contains_key(id) {
            debug!("Requesting game {id}");
            publish(self.transport.as_ref(), &Topic::GameRequest, id);
            self.pending_lookups.insert(id.clone(), now);
        }
        GameLookup::Pending
    }

    // Asks for all games of the current user. `Ready` means the list has already been received;
    // the games are then available via `sessions`.
    pub fn request_games(&mut self, now: Instant) -> GameLookup {
        if self.is_game_list_known {
            return GameLookup::Ready;
        }
        if self.game_list_requested_at.is_none() {
            debug!("Requesting game list");
            publish(self.transport.as_ref(), &Topic::GamesRequest, &());
            self.game_list_requested_at = Some(now);
        }
        GameLookup::Pending
    }

    pub fn is_game_list_pending(&self) -> bool { self.game_list_requested_at.is_some() }

    // Fails lookups that have been waiting for too long.
    pub fn tick(&mut self, now: Instant) -> Vec<DirectoryEvent> {
        let timeout = self.config.game_request_timeout;
        let is_expired =
            |requested_at: Instant| now.saturating_duration_since(requested_at) >= timeout;
        let expired: Vec<GameId> = self
            .pending_lookups
            .iter()
            .filter(|(_, requested_at)| is_expired(**requested_at))
            .map(|(id, _)| id.clone())
            .collect();
        let mut events = expired
            .into_iter()
            .map(|id| {
                info!("Request for game {id} timed out");
                self.pending_lookups.remove(&id);
                DirectoryEvent::LookupFailed { id, error: GameLookupError::Timeout }
            })
            .collect_vec();
        if self.game_list_requested_at.is_some_and(is_expired) {
            info!("Request for game list timed out");
            self.game_list_requested_at = None;
            events.push(DirectoryEvent::GameListTimedOut);
        }
        events
    }

    // Forgets everything. To be called when the transport starts a fresh connection.
    pub fn reset(&mut self) {
        self.sessions.clear();
        self.pending_lookups.clear();
        self.game_list_requested_at = None;
        self.is_game_list_known = false;
    }

    pub fn process_message(
        &mut self, topic: &str, payload: serde_json::Value, now: Instant,
    ) -> Vec<DirectoryEvent> {
        let anomaly_level = self.config.anomaly_level();
        let Some(topic) = Topic::parse(topic) else {
            log!(anomaly_level, "Dropping message on unknown topic '{topic}'");
            return vec![];
        };
        match &topic {
            Topic::GameMove(id) => {
                match self.sessions.get_mut(id) {
                    Some(session) => session.process_message(&topic, payload, now),
                    None => debug!("Ignoring move for unknown game {id}"),
                }
                vec![]
            }
            Topic::Game | Topic::SeekMatched => {
                match decode_payload::<GameDetails>(&topic, payload) {
                    Ok(details) => self.add_game(details, now),
                    Err(err) => {
                        log!(anomaly_level, "Dropping message: {err}");
                        vec![]
                    }
                }
            }
            Topic::Games => match decode_payload::<Vec<GameDetails>>(&topic, payload) {
                Ok(games) => self.add_game_list(games, now),
                Err(err) => {
                    log!(anomaly_level, "Dropping message: {err}");
                    vec![]
                }
            },
            Topic::GameNotFound => match decode_payload::<GameId>(&topic, payload) {
                Ok(id) => {
                    if self.pending_lookups.remove(&id).is_some() {
                        info!("Game {id} not found");
                        vec![DirectoryEvent::LookupFailed { id, error: GameLookupError::NotFound }]
                    } else {
                        debug!("Ignoring not-found for game {id} that was not requested");
                        vec![]
                    }
                }
                Err(err) => {
                    log!(anomaly_level, "Dropping message: {err}");
                    vec![]
                }
            },
            Topic::GameRequest | Topic::GamesRequest | Topic::GameMovesRequest(_) => {
                debug!("Ignoring client-to-server message on {topic}");
                vec![]
            }
        }
    }

    fn add_game(&mut self, details: GameDetails, now: Instant) -> Vec<DirectoryEvent> {
        let id = details.id.clone();
        let was_requested = self.pending_lookups.remove(&id).is_some();
        let is_new = !self.sessions.contains_key(&id);
        if is_new {
            let session = GameSession::new(
                details,
                Rc::clone(&self.transport),
                Rc::clone(&self.oracle),
                &self.config,
                now,
            );
            match session {
                Ok(session) => {
                    info!("Added game {id}");
                    self.sessions.insert(id.clone(), session);
                }
                Err(err) => {
                    log!(self.config.anomaly_level(), "Cannot set up game {id}: {err}");
                    if !was_requested {
                        return vec![];
                    }
                    let error = GameLookupError::InvalidGame(err);
                    return vec![DirectoryEvent::LookupFailed { id, error }];
                }
            }
        }
        if was_requested {
            vec![DirectoryEvent::LookupResolved(id)]
        } else if is_new {
            vec![DirectoryEvent::GameAdded(id)]
        } else {
            vec![]
        }
    }

    // Games from the list are added the same way as individual games. Games that cannot be set
    // up are left out of the resolved list.
    fn add_game_list(&mut self, games: Vec<GameDetails>, now: Instant) -> Vec<DirectoryEvent> {
        let was_requested = self.game_list_requested_at.take().is_some();
        self.is_game_list_known = true;
        let mut events = vec![];
        let mut ids = vec![];
        for details in games {
            let id = details.id.clone();
            events.extend(self.add_game(details, now));
            if self.sessions.contains_key(&id) {
                ids.push(id);
            }
        }
        info!("Received game list with {} games", ids.len());
        if was_requested {
            events.push(DirectoryEvent::GameListResolved(ids));
        }
        events
    }
}
