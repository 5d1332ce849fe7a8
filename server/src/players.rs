//! Authoritative player roster and name reservations

use log::info;
use shared::{Player, MAX_NAME_LEN};
use std::collections::HashMap;

/// Why a join was refused. Either way the caller gets kicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    NameTaken,
    NameTooLong,
}

impl JoinError {
    pub fn reason(&self) -> &'static str {
        match self {
            JoinError::NameTaken => "Name already taken",
            JoinError::NameTooLong => "Name too long",
        }
    }
}

/// Owns the authoritative set of players, keyed by connection id.
///
/// Name reservations are tracked separately from the players themselves:
/// a reservation lives for the whole connection, so a dead player keeps
/// its name until it disconnects and can respawn under the same session.
pub struct PlayerRegistry {
    players: HashMap<u32, Player>,
    /// Connection id -> reserved name, case-sensitive.
    reservations: HashMap<u32, String>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            reservations: HashMap::new(),
        }
    }

    /// True if `name` passes the length limit and is not reserved.
    pub fn name_available(&self, name: &str) -> bool {
        name.chars().count() <= MAX_NAME_LEN && !self.reservations.values().any(|n| n == name)
    }

    /// Reserves `name` for the connection and creates its player at (x, y).
    pub fn join(&mut self, id: u32, name: &str, x: f32, y: f32) -> Result<&Player, JoinError> {
        if name.chars().count() > MAX_NAME_LEN {
            return Err(JoinError::NameTooLong);
        }
        if self.reservations.values().any(|n| n == name) {
            return Err(JoinError::NameTaken);
        }

        self.reservations.insert(id, name.to_string());
        let player = Player::new(id, name.to_string(), x, y);
        info!("Player {} ({}) joined at ({:.0}, {:.0})", id, name, x, y);
        Ok(self.players.entry(id).or_insert(player))
    }

    /// Recreates the connection's player at level-1 defaults, keeping the
    /// reserved name. Returns the fresh player, or None if the connection
    /// never joined.
    pub fn respawn(&mut self, id: u32, x: f32, y: f32) -> Option<Player> {
        let name = self.reservations.get(&id)?.clone();
        let player = Player::new(id, name, x, y);
        self.players.insert(id, player.clone());
        info!("Player {} respawned at ({:.0}, {:.0})", id, x, y);
        Some(player)
    }

    /// Removes the player on death. The name stays reserved so the same
    /// connection can respawn under it.
    pub fn kill(&mut self, id: u32) -> Option<Player> {
        let dead = self.players.remove(&id);
        if dead.is_some() {
            info!("Player {} died", id);
        }
        dead
    }

    /// Removes the player and releases its name reservation. Returns true
    /// if a live player was removed.
    pub fn remove(&mut self, id: u32) -> bool {
        self.reservations.remove(&id);
        if self.players.remove(&id).is_some() {
            info!("Player {} removed", id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// True if the connection holds a name reservation (alive or dead).
    pub fn has_reservation(&self, id: u32) -> bool {
        self.reservations.contains_key(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
