//! Authoritative world state assembled from the generated pads, the fly
//! population, and the player registry

use crate::flies::FlyPopulation;
use crate::players::PlayerRegistry;
use crate::world;
use rand::Rng;
use shared::{LilyPad, Packet};

pub struct GameState {
    pub world_width: f32,
    pub world_height: f32,
    pub pads: Vec<LilyPad>,
    pub registry: PlayerRegistry,
    pub flies: FlyPopulation,
    pub tick: u32,
}

impl GameState {
    /// Generates the world once; no connection is accepted before this runs.
    pub fn new(world_width: f32, world_height: f32, fly_count: usize) -> Self {
        Self {
            world_width,
            world_height,
            pads: world::generate(world_width, world_height),
            registry: PlayerRegistry::new(),
            flies: FlyPopulation::new(fly_count, world_width, world_height),
            tick: 0,
        }
    }

    pub fn pad(&self, pad_id: u32) -> Option<&LilyPad> {
        self.pads.iter().find(|pad| pad.id == pad_id)
    }

    /// A pad is occupied when some alive player stands exactly on it.
    pub fn pad_occupied(&self, pad: &LilyPad) -> bool {
        self.registry
            .players()
            .any(|player| player.x == pad.x && player.y == pad.y)
    }

    /// Unoccupied-pad policy: uniform pick over the free pads, falling
    /// back to the first generated pad (accepting an overlap) when the
    /// world is saturated.
    pub fn choose_respawn_pad(&self) -> LilyPad {
        let free: Vec<&LilyPad> = self
            .pads
            .iter()
            .filter(|pad| !self.pad_occupied(pad))
            .collect();

        if free.is_empty() {
            return self.pads[0];
        }
        *free[rand::thread_rng().gen_range(0..free.len())]
    }

    /// Joining players prefer the spawn pad when it is free, otherwise
    /// fall back to the respawn policy.
    pub fn choose_join_pad(&self) -> LilyPad {
        if let Some(spawn) = self
            .pads
            .iter()
            .find(|pad| pad.is_spawn_point && !self.pad_occupied(pad))
        {
            return *spawn;
        }
        self.choose_respawn_pad()
    }

    /// The full snapshot unicast to a joining client.
    pub fn snapshot(&self) -> Packet {
        Packet::GameState {
            world_width: self.world_width,
            world_height: self.world_height,
            lily_pads: self.pads.clone(),
            players: self.registry.players().cloned().collect(),
            flies: self.flies.flies(),
        }
    }
}
