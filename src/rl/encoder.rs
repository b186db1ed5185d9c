//! Latent encoder seam
//!
//! The pretrained variational encoder that compresses camera images is a
//! collaborator behind the [`Encoder`] trait; its weights and architecture
//! are owned elsewhere. [`PoolingEncoder`] is a deterministic stand-in used
//! by the bundled binary and the tests.

use crate::rl::environment::Observation;
use crate::rl::state::LATENT_DIM;
use anyhow::Result;

/// Maps an image observation to a fixed-length latent vector
pub trait Encoder {
    /// Compress a (normalized) observation into `LATENT_DIM` floats
    fn encode(&self, observation: &Observation) -> Result<[f32; LATENT_DIM]>;
}

/// Reference encoder that block-averages the image into `LATENT_DIM` values
///
/// Splits the flattened pixel data into `LATENT_DIM` contiguous chunks and
/// takes the mean of each. Deterministic and shape-agnostic; a crude summary,
/// but enough to exercise the loop end-to-end.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolingEncoder;

impl PoolingEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for PoolingEncoder {
    fn encode(&self, observation: &Observation) -> Result<[f32; LATENT_DIM]> {
        let data = observation.data();
        let mut latent = [0.0; LATENT_DIM];

        if data.is_empty() {
            return Ok(latent);
        }

        let chunk_size = data.len().div_ceil(LATENT_DIM);
        for (slot, chunk) in latent.iter_mut().zip(data.chunks(chunk_size)) {
            *slot = chunk.iter().sum::<f32>() / chunk.len() as f32;
        }

        Ok(latent)
    }
}
