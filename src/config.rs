use std::time::Duration;

use log::Level;
use serde::{Deserialize, Serialize};


#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    // WebSocket URL of the game server, e.g. "ws://localhost:14361".
    pub server_address: String,

    // How long to wait for the server to answer a game request before giving up.
    #[serde(with = "humantime_serde")]
    pub game_request_timeout: Duration,

    // Whether dropped server messages are logged as warnings. They are always logged at debug
    // level.
    pub log_anomalies: bool,
}

impl ClientConfig {
    pub fn anomaly_level(&self) -> Level {
        if self.log_anomalies { Level::Warn } else { Level::Debug }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_address: "ws://localhost:14361".to_owned(),
            game_request_timeout: Duration::from_secs(1),
            log_anomalies: true,
        }
    }
}
