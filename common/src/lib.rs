pub extern crate rand;
pub extern crate rand_pcg;

use rand::prelude::*;
use rand_pcg::Pcg32;

/// Stream selector used when only a single `u64` seed is available.
const DEFAULT_STREAM: u64 = 0xa02b_dbf7_bb3c_0a7a;

// pump the rng a few times to avoid possible issues with seeding
fn pump(rng: &mut Pcg32) {
  for _ in 0..8 {
    let _ = rng.gen::<f32>();
  }
}

pub fn build_rng(seed: (u64, u64)) -> Pcg32 {
  let mut bytes = [0u8; 16];
  bytes[..8].copy_from_slice(&seed.0.to_le_bytes());
  bytes[8..].copy_from_slice(&seed.1.to_le_bytes());
  let mut rng = Pcg32::from_seed(bytes);
  pump(&mut rng);
  rng
}

pub fn build_rng_from_u64(seed: u64) -> Pcg32 {
  build_rng((seed, DEFAULT_STREAM))
}

/// Builds an RNG seeded from the platform entropy source, so every run produces
/// different output.  In the browser this goes through `crypto.getRandomValues`.
pub fn build_entropy_rng() -> Pcg32 {
  let mut rng = Pcg32::from_entropy();
  pump(&mut rng);
  rng
}

/// Returns a random f32 in the range [0, 1).
#[inline(always)]
pub fn random(rng: &mut impl Rng) -> f32 {
  rng.gen::<f32>()
}
