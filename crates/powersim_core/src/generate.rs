//! Synthetic data generation
//!
//! Each call builds its own random stream from the row seed. Nothing here
//! touches shared random state, so generation is reentrant and safe to run
//! from any number of workers at once.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;
use crate::model::{SyntheticSample, Unit};

/// Standard deviation of the pre measurement
pub const PRE_SD: f64 = 3.0;
/// Standard deviation of the pre-to-post measurement noise
pub const NOISE_SD: f64 = 0.3;

/// Scales of the two normal draws used by the generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub pre_sd: f64,
    pub noise_sd: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            pre_sd: PRE_SD,
            noise_sd: NOISE_SD,
        }
    }
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        for (name, value) in [("pre", self.pre_sd), ("noise", self.noise_sd)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeneratorError::InvalidScale { name, value });
            }
        }
        Ok(())
    }
}

/// Generate a pre/post sample with the default scales.
///
/// The first `sample_size / 2` units are treated; with an odd sample size the
/// control group gets the extra unit.
pub fn generate(sample_size: usize, effect_size: f64, seed: u64) -> SyntheticSample {
    draw(sample_size, effect_size, seed, GeneratorParams::default())
}

/// Generate a pre/post sample with custom scales
pub fn generate_with(
    sample_size: usize,
    effect_size: f64,
    seed: u64,
    params: GeneratorParams,
) -> Result<SyntheticSample, GeneratorError> {
    params.validate()?;
    Ok(draw(sample_size, effect_size, seed, params))
}

fn draw(
    sample_size: usize,
    effect_size: f64,
    seed: u64,
    params: GeneratorParams,
) -> SyntheticSample {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_treated = sample_size / 2;

    // All pre values are drawn before any noise value
    let pre: Vec<f64> = (0..sample_size)
        .map(|_| params.pre_sd * rng.sample::<f64, _>(StandardNormal))
        .collect();

    let units = pre
        .into_iter()
        .enumerate()
        .map(|(id, pre)| {
            let treated = id < n_treated;
            let mut post = pre + params.noise_sd * rng.sample::<f64, _>(StandardNormal);
            if treated {
                post += effect_size;
            }
            Unit {
                id,
                treated,
                pre,
                post,
            }
        })
        .collect();

    SyntheticSample::new(units)
}
