use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

pub const WORLD_WIDTH: f32 = 1600.0;
pub const WORLD_HEIGHT: f32 = 1200.0;

// Lily pad layout
pub const PAD_MIN_DISTANCE: f32 = 120.0;
pub const PAD_MAX_DISTANCE: f32 = 260.0;
pub const PAD_EDGE_PADDING: f32 = 100.0;

// Fly motion
pub const FLY_COUNT: usize = 20;
pub const FLY_SPEED_SLOW: f32 = 40.0;
pub const FLY_SPEED_MEDIUM: f32 = 80.0;
pub const FLY_SPEED_FAST: f32 = 140.0;
pub const FLY_EDGE_PADDING: f32 = 40.0;

// Combat and movement
pub const ATTACK_DAMAGE: i32 = 10;
pub const ATTACK_COOLDOWN_MS: u64 = 500;
pub const SWIM_RECOVERY_MS: u64 = 1000;
pub const PUSH_SUPPRESSION_MS: u64 = 2000;

// Progression
pub const MAX_NAME_LEN: usize = 16;
pub const LEVEL_CAP: u32 = 10;

/// Experience needed to advance from `level` to the next one.
pub fn xp_required_for_level(level: u32) -> u32 {
    3 * level + 2
}

/// Level reached with `xp` total experience, saturating at [`LEVEL_CAP`].
pub fn level_from_xp(xp: u32) -> u32 {
    let mut level = 1;
    let mut cumulative = 0;
    while level < LEVEL_CAP {
        cumulative += xp_required_for_level(level);
        if xp < cumulative {
            break;
        }
        level += 1;
    }
    level
}

pub fn size_for_level(level: u32) -> f32 {
    0.7 + (level - 1) as f32 * 0.05
}

pub fn max_health_for_level(level: u32) -> i32 {
    50 + (level as i32 - 1) * 10
}

/// A fixed landing spot. Generated once at startup, immutable afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LilyPad {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub is_spawn_point: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Fly {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    /// Heading in radians.
    pub angle: f32,
    pub speed: f32,
}

/// Minimized per-tick fly state: enough to animate, nothing more.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct FlyPose {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub health: i32,
    pub max_health: i32,
    pub level: u32,
    pub xp: u32,
    pub is_swimming: bool,
}

impl Player {
    /// A fresh level-1 player standing on the pad at (x, y).
    pub fn new(id: u32, name: String, x: f32, y: f32) -> Self {
        Self {
            id,
            name,
            x,
            y,
            size: size_for_level(1),
            health: max_health_for_level(1),
            max_health: max_health_for_level(1),
            level: 1,
            xp: 0,
            is_swimming: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Client -> server
    Connect {
        client_version: u32,
    },
    CheckName {
        name: String,
    },
    NewPlayer {
        name: String,
    },
    Respawn,
    MoveToLilyPad {
        pad_id: u32,
    },
    TongueAttack {
        target_id: u32,
    },
    CatchFly {
        fly_id: u32,
    },
    Ping,
    Disconnect,

    // Server -> client
    Connected {
        client_id: u32,
    },
    NameAvailable {
        name: String,
        available: bool,
    },
    GameState {
        world_width: f32,
        world_height: f32,
        lily_pads: Vec<LilyPad>,
        players: Vec<Player>,
        flies: Vec<Fly>,
    },
    PlayerJoined {
        player: Player,
    },
    PlayerMoved {
        id: u32,
        x: f32,
        y: f32,
        health: i32,
        max_health: i32,
    },
    PlayerDamaged {
        id: u32,
        health: i32,
    },
    PlayerDied {
        id: u32,
    },
    PlayerDisconnected {
        id: u32,
    },
    PlayerPushed {
        id: u32,
    },
    PlayerCanMove {
        id: u32,
    },
    PlayerHealthUpdate {
        id: u32,
        health: i32,
        max_health: i32,
    },
    FlyCaught {
        player_id: u32,
        fly_id: u32,
        xp: u32,
        level: u32,
        did_level_up: bool,
        size: f32,
        health: i32,
        max_health: i32,
    },
    NewFly {
        fly: Fly,
    },
    FliesUpdated {
        flies: Vec<FlyPose>,
    },
    Kicked {
        reason: String,
    },
}
