//! Fly entities and their per-tick wandering motion

use rand::Rng;
use shared::{
    Fly, FlyPose, FLY_EDGE_PADDING, FLY_SPEED_FAST, FLY_SPEED_MEDIUM, FLY_SPEED_SLOW,
};
use std::collections::HashMap;
use std::f32::consts::PI;

/// Seconds between heading reassignments, drawn per fly.
const TURN_INTERVAL_MIN: f32 = 2.0;
const TURN_INTERVAL_MAX: f32 = 5.0;
/// Magnitude bound for the wandering curve, radians per second.
const MAX_ANGULAR_VELOCITY: f32 = 1.0;
/// Per-axis positional jitter added each tick.
const JITTER: f32 = 1.0;
/// Damping applied to angular velocity on a wall bounce.
const BOUNCE_DAMPING: f32 = -0.5;

/// Server-side motion bookkeeping that never goes on the wire.
#[derive(Debug)]
struct Motion {
    angular_velocity: f32,
    /// Seconds until the next direction change.
    turn_timer: f32,
}

/// Owns every fly in the world and keeps the population at a fixed size.
///
/// A caught fly is always replaced one-for-one, so `len()` is invariant
/// across the server lifetime.
pub struct FlyPopulation {
    world_width: f32,
    world_height: f32,
    flies: HashMap<u32, Fly>,
    motion: HashMap<u32, Motion>,
    next_fly_id: u32,
}

impl FlyPopulation {
    pub fn new(count: usize, world_width: f32, world_height: f32) -> Self {
        let mut population = Self {
            world_width,
            world_height,
            flies: HashMap::new(),
            motion: HashMap::new(),
            next_fly_id: 0,
        };
        for _ in 0..count {
            population.spawn_fly();
        }
        population
    }

    /// Generates one fly at a random position with a tiered speed.
    ///
    /// Tier odds are 40% slow / 35% medium / 25% fast so the population
    /// keeps a visible mix of easy and hard-to-catch targets.
    fn spawn_fly(&mut self) -> Fly {
        let mut rng = rand::thread_rng();

        let roll: f32 = rng.gen();
        let speed = if roll < 0.40 {
            FLY_SPEED_SLOW
        } else if roll < 0.75 {
            FLY_SPEED_MEDIUM
        } else {
            FLY_SPEED_FAST
        };

        let id = self.next_fly_id;
        self.next_fly_id += 1;

        let fly = Fly {
            id,
            x: rng.gen_range(FLY_EDGE_PADDING..self.world_width - FLY_EDGE_PADDING),
            y: rng.gen_range(FLY_EDGE_PADDING..self.world_height - FLY_EDGE_PADDING),
            angle: rng.gen_range(0.0..std::f32::consts::TAU),
            speed,
        };

        self.flies.insert(id, fly);
        self.motion.insert(
            id,
            Motion {
                angular_velocity: rng.gen_range(-MAX_ANGULAR_VELOCITY..MAX_ANGULAR_VELOCITY),
                turn_timer: rng.gen_range(TURN_INTERVAL_MIN..TURN_INTERVAL_MAX),
            },
        );

        fly
    }

    /// Advances every fly by `dt` seconds of wandering.
    pub fn tick(&mut self, dt: f32) {
        let mut rng = rand::thread_rng();

        for (id, fly) in self.flies.iter_mut() {
            let Some(motion) = self.motion.get_mut(id) else {
                continue;
            };

            motion.turn_timer -= dt;
            if motion.turn_timer <= 0.0 {
                motion.angular_velocity =
                    rng.gen_range(-MAX_ANGULAR_VELOCITY..MAX_ANGULAR_VELOCITY);
                motion.turn_timer = rng.gen_range(TURN_INTERVAL_MIN..TURN_INTERVAL_MAX);
            }

            fly.angle += motion.angular_velocity * dt;
            fly.x += fly.angle.cos() * fly.speed * dt + rng.gen_range(-JITTER..JITTER);
            fly.y += fly.angle.sin() * fly.speed * dt + rng.gen_range(-JITTER..JITTER);

            // Reflect off the padded world boundary and damp the curve so
            // the fly does not oscillate against the wall.
            if fly.x < FLY_EDGE_PADDING {
                fly.x = FLY_EDGE_PADDING;
                fly.angle = PI - fly.angle;
                motion.angular_velocity *= BOUNCE_DAMPING;
            } else if fly.x > self.world_width - FLY_EDGE_PADDING {
                fly.x = self.world_width - FLY_EDGE_PADDING;
                fly.angle = PI - fly.angle;
                motion.angular_velocity *= BOUNCE_DAMPING;
            }

            if fly.y < FLY_EDGE_PADDING {
                fly.y = FLY_EDGE_PADDING;
                fly.angle = -fly.angle;
                motion.angular_velocity *= BOUNCE_DAMPING;
            } else if fly.y > self.world_height - FLY_EDGE_PADDING {
                fly.y = self.world_height - FLY_EDGE_PADDING;
                fly.angle = -fly.angle;
                motion.angular_velocity *= BOUNCE_DAMPING;
            }
        }
    }

    /// Removes a fly, returning it if it existed.
    pub fn catch(&mut self, fly_id: u32) -> Option<Fly> {
        self.motion.remove(&fly_id);
        self.flies.remove(&fly_id)
    }

    /// Spawns the 1:1 replacement for a caught fly.
    pub fn spawn_replacement(&mut self) -> Fly {
        self.spawn_fly()
    }

    pub fn get(&self, fly_id: u32) -> Option<&Fly> {
        self.flies.get(&fly_id)
    }

    pub fn flies(&self) -> Vec<Fly> {
        self.flies.values().copied().collect()
    }

    /// The minimized snapshot broadcast each tick.
    pub fn poses(&self) -> Vec<FlyPose> {
        self.flies
            .values()
            .map(|fly| FlyPose {
                id: fly.id,
                x: fly.x,
                y: fly.y,
                angle: fly.angle,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.flies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flies.is_empty()
    }
}
