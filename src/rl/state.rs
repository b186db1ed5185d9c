//! Per-timestep state input assembled for the agent

/// Length of the latent vector produced by the encoder
pub const LATENT_DIM: usize = 32;

/// Dimensionality of the continuous action (velocity command)
pub const ACTION_DIM: usize = 2;

/// Continuous action emitted by the agent
pub type Action = [f32; ACTION_DIM];

/// State mapping consumed by the agent at every timestep
///
/// Constructed fresh each step from the encoded observation and the
/// environment's accessors, and consumed immediately; never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct StateInput {
    /// Latent summary of the current camera observation
    pub latent_vector: [f32; LATENT_DIM],

    /// Position of the goal relative to the robot
    pub relative_pos: [f32; 2],

    /// Velocity command executed on the previous step
    pub previous_action: Action,

    /// Scalar reward received on the previous step
    pub previous_reward: [f32; 1],
}

/// How the agent should select its action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActMode {
    /// Training-mode action selection; the agent will receive an `observe`
    /// call for this step
    Learning {
        /// Whether to pick the mode of the policy rather than sampling
        deterministic: bool,
    },

    /// Independent evaluation; no learning signal follows and selection is
    /// deterministic
    Independent,
}

impl ActMode {
    /// Whether a learning signal follows this action
    pub fn is_learning(&self) -> bool {
        matches!(self, Self::Learning { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_act_mode_learning() {
        assert!(ActMode::Learning {
            deterministic: false
        }
        .is_learning());
        assert!(ActMode::Learning {
            deterministic: true
        }
        .is_learning());
        assert!(!ActMode::Independent.is_learning());
    }
}
