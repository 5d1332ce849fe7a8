//! Validation and application of inbound player actions
//!
//! Every handler takes the connection id of the caller, runs against the
//! registries as they are at handling time, and returns the outbound
//! events the transport layer should deliver. Unknown ids are silently
//! ignored; nothing here panics or blocks.

use crate::game::GameState;
use log::debug;
use shared::{
    level_from_xp, max_health_for_level, size_for_level, Packet, ATTACK_COOLDOWN_MS,
    ATTACK_DAMAGE, PUSH_SUPPRESSION_MS, SWIM_RECOVERY_MS,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// An outbound event produced by an action handler.
#[derive(Debug, Clone)]
pub enum Event {
    /// Deliver to a single client.
    Unicast { client_id: u32, packet: Packet },
    /// Deliver to every connected client.
    Broadcast { packet: Packet },
    /// Deliver to every connected client except one.
    BroadcastExcept { client_id: u32, packet: Packet },
    /// Force-disconnect a client after telling it why.
    Kick { client_id: u32, reason: String },
}

/// Applies player actions against the shared game state.
///
/// Owns all per-connection timing bookkeeping: attack cooldowns keyed by
/// target id, swim-recovery deadlines, and push-suppression timestamps.
/// Everything here is dropped synchronously when the connection goes away,
/// so an expired deadline can never act on a removed player.
pub struct ActionResolver {
    /// Connection id -> (target id -> last landed hit).
    attack_log: HashMap<u32, HashMap<u32, Instant>>,
    /// Player id -> when swimming ends.
    swim_until: HashMap<u32, Instant>,
    /// Player id -> when it was last pushed in.
    last_push: HashMap<u32, Instant>,
}

impl ActionResolver {
    pub fn new() -> Self {
        Self {
            attack_log: HashMap::new(),
            swim_until: HashMap::new(),
            last_push: HashMap::new(),
        }
    }

    /// `checkName`: availability probe, no mutation.
    pub fn handle_check_name(&self, state: &GameState, client_id: u32, name: &str) -> Vec<Event> {
        vec![Event::Unicast {
            client_id,
            packet: Packet::NameAvailable {
                name: name.to_string(),
                available: state.registry.name_available(name),
            },
        }]
    }

    /// `newPlayer`: join, or kick the caller on an invalid/taken name.
    pub fn handle_new_player(
        &mut self,
        state: &mut GameState,
        client_id: u32,
        name: &str,
    ) -> Vec<Event> {
        if state.registry.has_reservation(client_id) {
            debug!("Client {} sent newPlayer twice, ignoring", client_id);
            return Vec::new();
        }

        let pad = state.choose_join_pad();
        match state.registry.join(client_id, name, pad.x, pad.y) {
            Ok(player) => {
                let player = player.clone();
                vec![
                    Event::Unicast {
                        client_id,
                        packet: state.snapshot(),
                    },
                    Event::BroadcastExcept {
                        client_id,
                        packet: Packet::PlayerJoined { player },
                    },
                ]
            }
            Err(error) => vec![Event::Kick {
                client_id,
                reason: error.reason().to_string(),
            }],
        }
    }

    /// `respawn`: always succeeds for a connection that ever joined.
    pub fn handle_respawn(&mut self, state: &mut GameState, client_id: u32) -> Vec<Event> {
        let pad = state.choose_respawn_pad();
        let Some(player) = state.registry.respawn(client_id, pad.x, pad.y) else {
            return Vec::new();
        };

        // A fresh body carries no stale timers.
        self.swim_until.remove(&client_id);
        self.last_push.remove(&client_id);

        vec![Event::Broadcast {
            packet: Packet::PlayerJoined { player },
        }]
    }

    /// `moveToLilyPad`: teleport onto a pad, shoving any smaller occupant
    /// into the water.
    pub fn handle_move(
        &mut self,
        state: &mut GameState,
        client_id: u32,
        pad_id: u32,
        now: Instant,
    ) -> Vec<Event> {
        let Some(pad) = state.pad(pad_id).copied() else {
            return Vec::new();
        };
        let Some(mover) = state.registry.get(client_id) else {
            return Vec::new();
        };
        if mover.is_swimming {
            return Vec::new();
        }
        let mover_size = mover.size;

        let mut events = Vec::new();

        let occupant = state
            .registry
            .players()
            .find(|p| p.id != client_id && p.x == pad.x && p.y == pad.y)
            .map(|p| (p.id, p.size));

        if let Some((occupant_id, occupant_size)) = occupant {
            if occupant_size < mover_size && !self.pushed_recently(occupant_id, now) {
                if let Some(occupant) = state.registry.get_mut(occupant_id) {
                    occupant.is_swimming = true;
                    self.last_push.insert(occupant_id, now);
                    self.swim_until
                        .insert(occupant_id, now + Duration::from_millis(SWIM_RECOVERY_MS));
                    events.push(Event::Broadcast {
                        packet: Packet::PlayerPushed { id: occupant_id },
                    });
                }
            }
        }

        if let Some(mover) = state.registry.get_mut(client_id) {
            mover.x = pad.x;
            mover.y = pad.y;
            // Health rides along so a concurrent catch/attack cannot be
            // undone by a stale client-side move animation.
            events.push(Event::Broadcast {
                packet: Packet::PlayerMoved {
                    id: client_id,
                    x: mover.x,
                    y: mover.y,
                    health: mover.health,
                    max_health: mover.max_health,
                },
            });
        }

        events
    }

    /// `tongueAttack`: flat damage, rate-limited per target.
    pub fn handle_attack(
        &mut self,
        state: &mut GameState,
        client_id: u32,
        target_id: u32,
        now: Instant,
    ) -> Vec<Event> {
        if state.registry.get(client_id).is_none() {
            return Vec::new();
        }
        if state.registry.get(target_id).is_none() {
            return Vec::new();
        }

        let log = self.attack_log.entry(client_id).or_default();
        if let Some(last_hit) = log.get(&target_id) {
            if now.duration_since(*last_hit) < Duration::from_millis(ATTACK_COOLDOWN_MS) {
                debug!(
                    "Client {} attack on {} inside cooldown, dropped",
                    client_id, target_id
                );
                return Vec::new();
            }
        }
        log.insert(target_id, now);

        let Some(target) = state.registry.get_mut(target_id) else {
            return Vec::new();
        };
        target.health = (target.health - ATTACK_DAMAGE).max(0);
        let health = target.health;

        let mut events = vec![Event::Broadcast {
            packet: Packet::PlayerDamaged {
                id: target_id,
                health,
            },
        }];

        if health == 0 {
            state.registry.kill(target_id);
            // Name reservation survives until disconnect; timers do not.
            self.swim_until.remove(&target_id);
            self.last_push.remove(&target_id);
            events.push(Event::Broadcast {
                packet: Packet::PlayerDied { id: target_id },
            });
        }

        events
    }

    /// `catchFly`: award xp, maybe level up, replace the fly 1:1.
    pub fn handle_catch(
        &mut self,
        state: &mut GameState,
        client_id: u32,
        fly_id: u32,
    ) -> Vec<Event> {
        if state.registry.get(client_id).is_none() {
            return Vec::new();
        }
        let Some(caught) = state.flies.catch(fly_id) else {
            return Vec::new();
        };
        let replacement = state.flies.spawn_replacement();

        let mut events = Vec::new();

        if let Some(player) = state.registry.get_mut(client_id) {
            player.xp += 1;
            let new_level = level_from_xp(player.xp);
            let did_level_up = new_level > player.level;
            if did_level_up {
                player.level = new_level;
                player.size = size_for_level(new_level);
                player.max_health = max_health_for_level(new_level);
                // Full heal on level-up only
                player.health = player.max_health;
            }

            events.push(Event::Broadcast {
                packet: Packet::FlyCaught {
                    player_id: client_id,
                    fly_id: caught.id,
                    xp: player.xp,
                    level: player.level,
                    did_level_up,
                    size: player.size,
                    health: player.health,
                    max_health: player.max_health,
                },
            });

            if did_level_up {
                events.push(Event::Broadcast {
                    packet: Packet::PlayerHealthUpdate {
                        id: client_id,
                        health: player.health,
                        max_health: player.max_health,
                    },
                });
            }
        }

        events.push(Event::Broadcast {
            packet: Packet::NewFly { fly: replacement },
        });

        events
    }

    /// Transport-level disconnect: drop the player, its reservation, and
    /// every timer tied to the connection.
    pub fn handle_disconnect(&mut self, state: &mut GameState, client_id: u32) -> Vec<Event> {
        self.attack_log.remove(&client_id);
        self.swim_until.remove(&client_id);
        self.last_push.remove(&client_id);

        if state.registry.remove(client_id) {
            vec![Event::Broadcast {
                packet: Packet::PlayerDisconnected { id: client_id },
            }]
        } else {
            Vec::new()
        }
    }

    /// Tick-driven sweep of swim-recovery deadlines. A deadline whose
    /// player is gone is dropped without effect.
    pub fn expire_swimmers(&mut self, state: &mut GameState, now: Instant) -> Vec<Event> {
        let expired: Vec<u32> = self
            .swim_until
            .iter()
            .filter(|(_, deadline)| now >= **deadline)
            .map(|(id, _)| *id)
            .collect();

        let mut events = Vec::new();
        for id in expired {
            self.swim_until.remove(&id);
            if let Some(player) = state.registry.get_mut(id) {
                player.is_swimming = false;
                events.push(Event::Broadcast {
                    packet: Packet::PlayerCanMove { id },
                });
            }
        }
        events
    }

    fn pushed_recently(&self, player_id: u32, now: Instant) -> bool {
        match self.last_push.get(&player_id) {
            Some(pushed) => {
                now.duration_since(*pushed) < Duration::from_millis(PUSH_SUPPRESSION_MS)
            }
            None => false,
        }
    }
}

impl Default for ActionResolver {
    fn default() -> Self {
        Self::new()
    }
}
