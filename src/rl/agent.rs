//! Policy agent seam and checkpoint metadata
//!
//! The policy optimizer (network, recurrent state, gradient updates) is a
//! collaborator behind the [`Agent`] trait. [`RandomAgent`] is a reference
//! implementation that samples uniform velocity commands; it persists only
//! bookkeeping metadata, in the same metadata-sidecar style a real agent
//! would use alongside its weights.

use crate::rl::state::{ActMode, Action, StateInput};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Policy driven by the train/eval loop
pub trait Agent {
    /// Reset internal (e.g. recurrent) state at the start of an episode
    fn reset(&mut self);

    /// Select an action for the given state
    fn act(&mut self, state: &StateInput, mode: ActMode) -> Action;

    /// Feed back the outcome of the last action for credit assignment
    ///
    /// Only called in training mode; evaluation episodes produce no learning
    /// signal.
    fn observe(&mut self, terminal: bool, reward: f32);

    /// Persist the model into the given directory, returning the checkpoint path
    fn save_model(&self, dir: &Path) -> Result<PathBuf>;

    /// Restore the model from a previously saved checkpoint directory
    fn restore(&mut self, dir: &Path) -> Result<()>;
}

/// Metadata persisted with an agent checkpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Total training steps observed
    pub observed_steps: usize,

    /// Number of training episodes completed
    pub episodes_observed: usize,

    /// Crate version that wrote the checkpoint
    pub version: String,
}

/// Reference agent sampling uniform velocity commands in `[-1, 1]^2`
///
/// In deterministic or independent mode it emits a fixed straight-ahead
/// command instead of sampling. Useful for wiring tests and as a baseline.
#[derive(Debug)]
pub struct RandomAgent {
    rng: StdRng,
    observed_steps: usize,
    episodes_observed: usize,
}

impl RandomAgent {
    const CHECKPOINT_FILE: &'static str = "random_agent.meta.json";

    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Seeded construction for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            observed_steps: 0,
            episodes_observed: 0,
        }
    }

    pub fn observed_steps(&self) -> usize {
        self.observed_steps
    }

    pub fn episodes_observed(&self) -> usize {
        self.episodes_observed
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn reset(&mut self) {
        // Stateless policy; nothing to clear between episodes
    }

    fn act(&mut self, _state: &StateInput, mode: ActMode) -> Action {
        match mode {
            ActMode::Learning {
                deterministic: false,
            } => [
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            ],
            // Mode of a uniform policy: drive straight
            ActMode::Learning {
                deterministic: true,
            }
            | ActMode::Independent => [1.0, 0.0],
        }
    }

    fn observe(&mut self, terminal: bool, _reward: f32) {
        self.observed_steps += 1;
        if terminal {
            self.episodes_observed += 1;
        }
    }

    fn save_model(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create checkpoint directory {dir:?}"))?;

        let metadata = AgentMetadata {
            observed_steps: self.observed_steps,
            episodes_observed: self.episodes_observed,
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let path = dir.join(Self::CHECKPOINT_FILE);
        let json = serde_json::to_string_pretty(&metadata)
            .context("failed to serialize agent metadata")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write checkpoint to {path:?}"))?;

        Ok(path)
    }

    fn restore(&mut self, dir: &Path) -> Result<()> {
        let path = dir.join(Self::CHECKPOINT_FILE);
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read checkpoint from {path:?}"))?;
        let metadata: AgentMetadata =
            serde_json::from_str(&json).context("failed to deserialize agent metadata")?;

        self.observed_steps = metadata.observed_steps;
        self.episodes_observed = metadata.episodes_observed;

        Ok(())
    }
}
