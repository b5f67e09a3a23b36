use serde::{Deserialize, Serialize};


#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PlayerInfo {
    // Server-assigned. Guests have an id but their name is not reserved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl PlayerInfo {
    pub fn new(name: impl Into<String>) -> Self { PlayerInfo { id: None, name: name.into() } }
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        PlayerInfo { id: Some(id.into()), name: name.into() }
    }
}

// The user of this client, as known to the server.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UserIdentity {
    pub player_id: Option<String>,
    // `None` for guests: anybody can pick a guest name, so it proves nothing.
    pub registered_name: Option<String>,
}

impl UserIdentity {
    pub fn registered(name: impl Into<String>) -> Self {
        UserIdentity { player_id: None, registered_name: Some(name.into()) }
    }
    pub fn guest(player_id: impl Into<String>) -> Self {
        UserIdentity { player_id: Some(player_id.into()), registered_name: None }
    }

    pub fn is(&self, player: &PlayerInfo) -> bool {
        let same_name = self.registered_name.as_ref().is_some_and(|name| *name == player.name);
        let same_id = self.player_id.is_some() && self.player_id == player.id;
        same_name || same_id
    }
}
