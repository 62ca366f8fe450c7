use crate::hex::metrics::{
    self, CELL_PERTURB_STRENGTH, HASH_GRID_SCALE, HASH_GRID_SIZE,
    INNER_DIAMETER, NOISE_SCALE,
};
use nalgebra::Point3;
use noise::{Fbm, MultiFractal, NoiseFn, Seedable};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Number of independent noise channels available from [NoiseContext]
pub const NOISE_CHANNELS: usize = 4;

/// A set of random values tied to one spot in the hash grid. Each value is in
/// `[0, 0.999)`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HexHash {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
}

impl HexHash {
    fn random(rng: &mut impl Rng) -> Self {
        let mut value = || rng.gen::<f64>() * 0.999;
        Self {
            a: value(),
            b: value(),
            c: value(),
            d: value(),
            e: value(),
        }
    }
}

/// Seeded noise and hash tables shared by the grid and the generator. This is
/// built once and never mutated, so it can be shared freely behind an `Arc`.
///
/// Noise has four independent channels, each sampled from its own fractal
/// function and normalized to `[0, 1]`. The hash grid is a fixed
/// `256 × 256` table of [HexHash] values, tiled across the world.
#[derive(Debug)]
pub struct NoiseContext {
    seed: u64,
    channels: [Fbm; NOISE_CHANNELS],
    hash_grid: Vec<HexHash>,
}

impl NoiseContext {
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut channel = || {
            Fbm::default()
                .set_seed(rng.gen())
                .set_octaves(4)
                .set_frequency(1.0)
        };
        let channels = [channel(), channel(), channel(), channel()];

        let hash_grid = (0..HASH_GRID_SIZE * HASH_GRID_SIZE)
            .map(|_| HexHash::random(&mut rng))
            .collect();

        Self {
            seed,
            channels,
            hash_grid,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Sample all noise channels at a world position. Only the horizontal
    /// components of the position matter. On a wrapped map, positions near
    /// the west edge are blended with the matching positions past the east
    /// edge, so that the noise is continuous across the seam.
    pub fn sample_noise(
        &self,
        position: &Point3<f64>,
        wrap_size: Option<i32>,
    ) -> [f64; NOISE_CHANNELS] {
        let sample = self.sample_raw(position.x, position.z);
        match wrap_size {
            Some(wrap_size) if position.x < INNER_DIAMETER * 1.5 => {
                let wrapped = self.sample_raw(
                    position.x + metrics::wrap_width(wrap_size),
                    position.z,
                );
                let t = (position.x / INNER_DIAMETER - 0.5).clamp(0.0, 1.0);
                let mut blended = [0.0; NOISE_CHANNELS];
                for (i, value) in blended.iter_mut().enumerate() {
                    *value = wrapped[i] + (sample[i] - wrapped[i]) * t;
                }
                blended
            }
            _ => sample,
        }
    }

    fn sample_raw(&self, x: f64, z: f64) -> [f64; NOISE_CHANNELS] {
        let point = [x * NOISE_SCALE, 0.5, z * NOISE_SCALE];
        let mut output = [0.0; NOISE_CHANNELS];
        for (value, channel) in output.iter_mut().zip(self.channels.iter()) {
            // Map from roughly [-1, 1] to [0, 1]
            *value = ((channel.get(point) + 1.0) / 2.0).clamp(0.0, 1.0);
        }
        output
    }

    /// Offset a position horizontally by noise, to break up the regular
    /// grid. The result is never more than [CELL_PERTURB_STRENGTH] away from
    /// the input on either axis.
    pub fn perturb(
        &self,
        position: &Point3<f64>,
        wrap_size: Option<i32>,
    ) -> Point3<f64> {
        let sample = self.sample_noise(position, wrap_size);
        Point3::new(
            position.x + (sample[0] * 2.0 - 1.0) * CELL_PERTURB_STRENGTH,
            position.y,
            position.z + (sample[2] * 2.0 - 1.0) * CELL_PERTURB_STRENGTH,
        )
    }

    /// Look up the hash values for a world position. The grid repeats every
    /// `HASH_GRID_SIZE / HASH_GRID_SCALE` world units in each direction.
    pub fn sample_hash_grid(&self, position: &Point3<f64>) -> HexHash {
        let size = HASH_GRID_SIZE as i64;
        let x = ((position.x * HASH_GRID_SCALE) as i64).rem_euclid(size);
        let z = ((position.z * HASH_GRID_SCALE) as i64).rem_euclid(size);
        self.hash_grid[(x + z * size) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_in_range() {
        let noise = NoiseContext::new(1234);
        for i in 0..50 {
            let position = Point3::new(i as f64 * 37.0, 0.0, i as f64 * 11.0);
            for value in &noise.sample_noise(&position, None) {
                assert!((0.0..=1.0).contains(value), "{} out of range", value);
            }
        }
    }

    #[test]
    fn test_seeded() {
        let position = Point3::new(123.0, 0.0, 456.0);
        let a = NoiseContext::new(5);
        let b = NoiseContext::new(5);
        assert_eq!(
            a.sample_noise(&position, None),
            b.sample_noise(&position, None)
        );
        assert_eq!(a.sample_hash_grid(&position), b.sample_hash_grid(&position));
    }

    #[test]
    fn test_perturb_bounded() {
        let noise = NoiseContext::new(99);
        let position = Point3::new(250.0, 6.0, 80.0);
        let perturbed = noise.perturb(&position, None);
        assert!((perturbed.x - position.x).abs() <= CELL_PERTURB_STRENGTH);
        assert!((perturbed.z - position.z).abs() <= CELL_PERTURB_STRENGTH);
        assert_eq!(perturbed.y, position.y);
    }

    #[test]
    fn test_hash_grid_tiles() {
        let noise = NoiseContext::new(7);
        let period = HASH_GRID_SIZE as f64 / HASH_GRID_SCALE;
        let position = Point3::new(10.0, 0.0, 20.0);
        let repeated = Point3::new(10.0 + period, 0.0, 20.0 - period);
        assert_eq!(
            noise.sample_hash_grid(&position),
            noise.sample_hash_grid(&repeated)
        );

        let hash = noise.sample_hash_grid(&position);
        for value in &[hash.a, hash.b, hash.c, hash.d, hash.e] {
            assert!((0.0..0.999).contains(value));
        }
    }

    #[test]
    fn test_wrap_blend_matches_east_edge() {
        let noise = NoiseContext::new(3);
        // At the far west edge the sample comes entirely from past the east
        // edge
        let west = Point3::new(0.0, 0.0, 40.0);
        let east = Point3::new(metrics::wrap_width(20), 0.0, 40.0);
        assert_eq!(
            noise.sample_noise(&west, Some(20)),
            noise.sample_noise(&east, None)
        );
    }
}
