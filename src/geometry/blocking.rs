//! Line-of-sight blocking between pursuers and the target.
//!
//! Works in the ground plane: a cylinder blocks the segment from a drone to
//! the target when its axis lies within `radius` of the line through both
//! points, the foot of the perpendicular falls on the segment, and the
//! cylinder stands on the floor (`z > 0`). Parked cylinders never block.
//!
//! Denominators carry an additive [`BLOCKING_EPS`], so coincident drone and
//! target positions give a well-defined answer instead of a division by zero.

use super::types::Vec3;

/// Additive stabilizer for every denominator in this module.
pub const BLOCKING_EPS: f64 = 1e-5;

/// Perpendicular distance from `cylinder` to the line through `drone` and `target`.
fn distance_to_sight_line(drone: &Vec3, target: &Vec3, cylinder: &Vec3) -> f64 {
    let diff_x = drone.x - target.x;
    let diff_y = drone.y - target.y;
    let diff2_x = cylinder.x - target.x;
    let diff2_y = cylinder.y - target.y;

    let numerator = (diff_x * diff2_y - diff_y * diff2_x).abs();
    let denominator = (diff_x * diff_x + diff_y * diff_y).sqrt();
    numerator / (denominator + BLOCKING_EPS)
}

/// Parameter of the perpendicular foot along the segment drone → target.
fn foot_parameter(drone: &Vec3, target: &Vec3, cylinder: &Vec3) -> f64 {
    let dx = target.x - drone.x;
    let dy = target.y - drone.y;
    let num = (cylinder.x - drone.x) * dx + (cylinder.y - drone.y) * dy;
    let denom = dx * dx + dy * dy;
    num / (denom + BLOCKING_EPS)
}

/// Returns true if `cylinder` blocks the sight line between `drone` and `target`.
///
/// Endpoints count: a foot parameter of exactly `0` or `1` is on the segment.
pub fn cylinder_blocks(drone: &Vec3, target: &Vec3, cylinder: &Vec3, radius: f64) -> bool {
    let on_ground = cylinder.z > 0.0;
    if !on_ground {
        return false;
    }
    let close = distance_to_sight_line(drone, target, cylinder) <= radius;
    let t = foot_parameter(drone, target, cylinder);
    close && (0.0..=1.0).contains(&t)
}

/// Returns true if any active cylinder blocks the sight line.
pub fn line_blocked(drone: &Vec3, target: &Vec3, cylinders: &[Vec3], radius: f64) -> bool {
    cylinders
        .iter()
        .any(|c| cylinder_blocks(drone, target, c, radius))
}

/// Per-drone blocking flags for one lane.
pub fn lines_blocked(drones: &[Vec3], target: &Vec3, cylinders: &[Vec3], radius: f64) -> Vec<bool> {
    drones
        .iter()
        .map(|d| line_blocked(d, target, cylinders, radius))
        .collect()
}

/// Per-lane, per-drone blocking flags.
///
/// # Panics
///
/// Panics if the three batches do not have the same number of lanes.
pub fn lines_blocked_batch(
    drones: &[Vec<Vec3>],
    targets: &[Vec3],
    cylinders: &[Vec<Vec3>],
    radius: f64,
) -> Vec<Vec<bool>> {
    assert_eq!(drones.len(), targets.len(), "lane count mismatch");
    assert_eq!(drones.len(), cylinders.len(), "lane count mismatch");
    drones
        .iter()
        .zip(targets)
        .zip(cylinders)
        .map(|((d, t), c)| lines_blocked(d, t, c, radius))
        .collect()
}

/// Returns true if some drone is strictly inside `catch_radius` of the target
/// with an unobstructed sight line.
pub fn captured(
    drones: &[Vec3],
    target: &Vec3,
    cylinders: &[Vec3],
    cylinder_radius: f64,
    catch_radius: f64,
) -> bool {
    drones.iter().any(|d| {
        d.distance_to(target) < catch_radius && !line_blocked(d, target, cylinders, cylinder_radius)
    })
}
