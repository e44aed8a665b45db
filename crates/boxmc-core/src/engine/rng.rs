use rand::distributions::Standard;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// Stream identifier mixed into every box-update seed, so the updater never
/// shares a random stream with other consumers of the same user seed.
const BOX_MC_SALT: u64 = 0xf6a5_10ab;

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Returns the generator for one box update.
///
/// The stream is a pure function of `(seed, timestep)`: replaying a timestep
/// replays its draws exactly, regardless of what happened before it.
pub fn step_rng(seed: u64, timestep: u64) -> Xoshiro256StarStar {
    let mixed = splitmix64(splitmix64(seed ^ BOX_MC_SALT) ^ timestep);
    Xoshiro256StarStar::seed_from_u64(mixed)
}

/// Uniform draw in `[0, 1)`.
#[inline]
pub fn unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(Standard)
}

/// Uniform draw in `[-delta, delta)`.
#[inline]
pub fn symmetric<R: Rng + ?Sized>(rng: &mut R, delta: f64) -> f64 {
    delta * (2.0 * unit(rng) - 1.0)
}
