//! Axis-aligned spawn boxes.

use rand::Rng;

use crate::config::ArenaConfig;
use crate::geometry::Vec3;

/// Box `[min, max]` from which positions are drawn uniformly per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRegion {
    pub min: Vec3,
    pub max: Vec3,
}

impl SpawnRegion {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Drone spawn box: the half of the inscribed square with `x > margin`.
    pub fn drones(arena: &ArenaConfig) -> Self {
        let e = arena.spawn_half_extent();
        let (z_lo, z_hi) = arena.spawn_z_range();
        Self::new(Vec3::new(arena.margin, -e, z_lo), Vec3::new(e, e, z_hi))
    }

    /// Target spawn box: the mirrored half with `x < -margin`.
    pub fn target(arena: &ArenaConfig) -> Self {
        let e = arena.spawn_half_extent();
        let (z_lo, z_hi) = arena.spawn_z_range();
        Self::new(Vec3::new(-e, -e, z_lo), Vec3::new(-arena.margin, e, z_hi))
    }

    fn axis<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
        rng.gen_range(lo..=hi)
    }

    /// Draws one position.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(
            Self::axis(rng, self.min.x, self.max.x),
            Self::axis(rng, self.min.y, self.max.y),
            Self::axis(rng, self.min.z, self.max.z),
        )
    }

    pub fn contains(&self, p: &Vec3) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}
