//! Terrain height queries.
//!
//! The authority only ever asks the terrain for a height at an (x, z)
//! position, so the generator sits behind [`HeightField`]. Any
//! `Fn(f32, f32) -> f32` closure qualifies, which keeps tests on flat ground.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait HeightField {
    fn height_at(&self, x: f32, z: f32) -> f32;
}

impl<F> HeightField for F
where
    F: Fn(f32, f32) -> f32,
{
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

const OCTAVES: usize = 4;
const BASE_FREQUENCY: f32 = 0.01;
const AMPLITUDE: f32 = 10.0;

/// Smooth multi-octave hills in the range [-10, 10].
///
/// Each octave doubles the frequency and halves the weight. Phases come from
/// the seed so the same seed yields the same hills on every machine.
#[derive(Debug, Clone)]
pub struct RollingTerrain {
    seed: u64,
    phases: [(f32, f32); OCTAVES],
}

impl RollingTerrain {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut phases = [(0.0, 0.0); OCTAVES];
        for phase in phases.iter_mut() {
            *phase = (
                rng.gen_range(0.0..std::f32::consts::TAU),
                rng.gen_range(0.0..std::f32::consts::TAU),
            );
        }
        Self { seed, phases }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl HeightField for RollingTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        let mut total = 0.0;
        let mut weight = 1.0;
        let mut frequency = BASE_FREQUENCY;
        let mut max_total = 0.0;

        for (px, pz) in &self.phases {
            total += (x * frequency + px).sin() * (z * frequency + pz).cos() * weight;
            max_total += weight;
            weight *= 0.5;
            frequency *= 2.0;
        }

        total / max_total * AMPLITUDE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_closure_height_field() {
        let flat = |_x: f32, _z: f32| 2.5;
        assert_eq!(flat.height_at(10.0, -4.0), 2.5);
    }

    #[test]
    fn test_rolling_terrain_is_deterministic() {
        let a = RollingTerrain::new(42);
        let b = RollingTerrain::new(42);

        for i in 0..20 {
            let x = i as f32 * 13.7 - 100.0;
            let z = i as f32 * -7.3 + 50.0;
            assert_approx_eq!(a.height_at(x, z), b.height_at(x, z), 1e-6);
        }
    }

    #[test]
    fn test_rolling_terrain_stays_in_range() {
        let terrain = RollingTerrain::new(7);
        for i in -50..50 {
            for j in -50..50 {
                let h = terrain.height_at(i as f32 * 20.0, j as f32 * 20.0);
                assert!((-AMPLITUDE..=AMPLITUDE).contains(&h));
            }
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = RollingTerrain::new(1);
        let b = RollingTerrain::new(2);
        let differs = (0..10).any(|i| {
            let x = i as f32 * 31.0;
            (a.height_at(x, x) - b.height_at(x, x)).abs() > 1e-3
        });
        assert!(differs);
        assert_eq!(a.seed(), 1);
    }
}
