//! Cryptographically secure randomness
//!
//! Every salt, nonce and record identifier is drawn through [`RandomSource`].
//! A failing source is an error; there is no fallback to a weaker generator.

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::error;

use crate::error::{Result, VaultError};

/// Source of cryptographically strong random bytes
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            error!("OS random source failed: {}", e);
            VaultError::RandomnessUnavailable(e.to_string())
        })
    }
}

/// Draw a fixed-size array of random bytes
pub fn random_array<const N: usize>(rng: &dyn RandomSource) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    rng.fill(&mut bytes)?;
    Ok(bytes)
}

/// Uniformly random integer in `0..bound`, by rejection sampling
pub fn random_below(rng: &dyn RandomSource, bound: u32) -> Result<u32> {
    if bound == 0 {
        return Err(VaultError::InvalidInput(
            "Random bound must be positive".to_string(),
        ));
    }

    // Largest multiple of `bound` that fits; values at or above it are redrawn.
    let zone = u32::MAX - (u32::MAX % bound);
    loop {
        let value = u32::from_le_bytes(random_array::<4>(rng)?);
        if value < zone {
            return Ok(value % bound);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FailingRandom;
    use super::*;

    #[test]
    fn test_random_array_differs() {
        let a = random_array::<16>(&OsRandom).unwrap();
        let b = random_array::<16>(&OsRandom).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_below_in_range() {
        for bound in [1u32, 2, 7, 26, 1000] {
            for _ in 0..50 {
                assert!(random_below(&OsRandom, bound).unwrap() < bound);
            }
        }
    }

    #[test]
    fn test_random_below_zero_bound() {
        assert!(matches!(
            random_below(&OsRandom, 0),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_failing_source_propagates() {
        let result = random_array::<12>(&FailingRandom);
        assert!(matches!(result, Err(VaultError::RandomnessUnavailable(_))));
    }
}
