//! One-shot procedural layout of the lily-pad graph

use rand::Rng;
use shared::{LilyPad, PAD_EDGE_PADDING, PAD_MAX_DISTANCE, PAD_MIN_DISTANCE};

/// Grid cell edge used for the initial scatter pass. Chosen so a typical
/// gap between neighboring cells stays within a jump.
const CELL_SIZE: f32 = 200.0;
/// Chance that a grid cell receives a pad at all.
const CELL_FILL_PROBABILITY: f64 = 0.8;
/// Pads placed before the local-connectivity requirement kicks in.
const UNCONSTRAINED_PADS: usize = 4;
/// Extra placement passes that patch isolated regions.
const CONNECTOR_ATTEMPTS: usize = 12;
/// Per-connector retry budget before the candidate is skipped.
const CONNECTOR_TRIES: usize = 16;

/// Lays out the full pad set for a world of the given dimensions.
///
/// Randomized, never fails: exhausted placement budgets skip the candidate
/// point instead of erroring. The spawn pad at world center always exists.
pub fn generate(world_width: f32, world_height: f32) -> Vec<LilyPad> {
    let mut rng = rand::thread_rng();
    let mut pads = Vec::new();

    let center_x = world_width / 2.0;
    let center_y = world_height / 2.0;
    pads.push(LilyPad {
        id: 0,
        x: center_x,
        y: center_y,
        is_spawn_point: true,
    });

    // Scatter pass: one candidate per grid cell inside the edge padding.
    let cols = ((world_width - 2.0 * PAD_EDGE_PADDING) / CELL_SIZE) as u32;
    let rows = ((world_height - 2.0 * PAD_EDGE_PADDING) / CELL_SIZE) as u32;

    for row in 0..rows {
        for col in 0..cols {
            let cell_x = PAD_EDGE_PADDING + col as f32 * CELL_SIZE;
            let cell_y = PAD_EDGE_PADDING + row as f32 * CELL_SIZE;

            // The center cell already holds the spawn pad.
            if (cell_x..cell_x + CELL_SIZE).contains(&center_x)
                && (cell_y..cell_y + CELL_SIZE).contains(&center_y)
            {
                continue;
            }

            if !rng.gen_bool(CELL_FILL_PROBABILITY) {
                continue;
            }

            let x = cell_x + rng.gen_range(0.0..CELL_SIZE);
            let y = cell_y + rng.gen_range(0.0..CELL_SIZE);

            if accepts(&pads, x, y) {
                push_pad(&mut pads, x, y);
            }
        }
    }

    // Connector pass: grow off random existing pads to patch sparse regions.
    for _ in 0..CONNECTOR_ATTEMPTS {
        let base = pads[rng.gen_range(0..pads.len())];

        for _ in 0..CONNECTOR_TRIES {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let reach = rng.gen_range(PAD_MIN_DISTANCE..PAD_MAX_DISTANCE);
            let x = base.x + angle.cos() * reach;
            let y = base.y + angle.sin() * reach;

            if !in_bounds(x, y, world_width, world_height) {
                continue;
            }
            if min_distance_ok(&pads, x, y) {
                push_pad(&mut pads, x, y);
                break;
            }
        }
    }

    pads
}

fn push_pad(pads: &mut Vec<LilyPad>, x: f32, y: f32) {
    let id = pads.len() as u32;
    pads.push(LilyPad {
        id,
        x,
        y,
        is_spawn_point: false,
    });
}

fn in_bounds(x: f32, y: f32, world_width: f32, world_height: f32) -> bool {
    x >= PAD_EDGE_PADDING
        && x <= world_width - PAD_EDGE_PADDING
        && y >= PAD_EDGE_PADDING
        && y <= world_height - PAD_EDGE_PADDING
}

fn min_distance_ok(pads: &[LilyPad], x: f32, y: f32) -> bool {
    pads.iter()
        .all(|pad| distance(pad.x, pad.y, x, y) >= PAD_MIN_DISTANCE)
}

/// Scatter-pass acceptance: spacing plus, once a few pads exist, a
/// reachable neighbor within jump range.
fn accepts(pads: &[LilyPad], x: f32, y: f32) -> bool {
    if !min_distance_ok(pads, x, y) {
        return false;
    }
    if pads.len() < UNCONSTRAINED_PADS {
        return true;
    }
    pads.iter()
        .any(|pad| distance(pad.x, pad.y, x, y) <= PAD_MAX_DISTANCE)
}

fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{WORLD_HEIGHT, WORLD_WIDTH};

    #[test]
    fn test_spawn_pad_at_world_center() {
        let pads = generate(WORLD_WIDTH, WORLD_HEIGHT);

        let spawn: Vec<&LilyPad> = pads.iter().filter(|p| p.is_spawn_point).collect();
        assert_eq!(spawn.len(), 1);
        assert_eq!(spawn[0].x, WORLD_WIDTH / 2.0);
        assert_eq!(spawn[0].y, WORLD_HEIGHT / 2.0);
        assert_eq!(spawn[0].id, 0);
    }

    #[test]
    fn test_minimum_pad_spacing() {
        // Generation is randomized, so check the invariant across several runs
        for _ in 0..10 {
            let pads = generate(WORLD_WIDTH, WORLD_HEIGHT);

            for i in 0..pads.len() {
                for j in (i + 1)..pads.len() {
                    let d = distance(pads[i].x, pads[i].y, pads[j].x, pads[j].y);
                    assert!(
                        d >= PAD_MIN_DISTANCE,
                        "pads {} and {} only {:.1} apart",
                        pads[i].id,
                        pads[j].id,
                        d
                    );
                }
            }
        }
    }

    #[test]
    fn test_pad_ids_unique_and_dense() {
        let pads = generate(WORLD_WIDTH, WORLD_HEIGHT);
        for (index, pad) in pads.iter().enumerate() {
            assert_eq!(pad.id, index as u32);
        }
    }

    #[test]
    fn test_world_is_populated() {
        let pads = generate(WORLD_WIDTH, WORLD_HEIGHT);
        // 7x5 grid at 80% fill minus spacing rejections always leaves a
        // playable pad count
        assert!(pads.len() > 10, "only {} pads generated", pads.len());
    }

    #[test]
    fn test_non_spawn_pads_respect_edge_padding() {
        let pads = generate(WORLD_WIDTH, WORLD_HEIGHT);
        for pad in pads.iter().filter(|p| !p.is_spawn_point) {
            assert!(pad.x >= PAD_EDGE_PADDING);
            assert!(pad.x <= WORLD_WIDTH - PAD_EDGE_PADDING);
            assert!(pad.y >= PAD_EDGE_PADDING);
            assert!(pad.y <= WORLD_HEIGHT - PAD_EDGE_PADDING);
        }
    }
}
