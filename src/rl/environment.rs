//! Maze environment seam
//!
//! The simulation itself (physics, rendering, collision) lives behind the
//! [`MazeEnvironment`] trait. The loop only relies on reset/execute plus a
//! handful of read-only accessors mirroring the simulator's state.

use crate::rl::state::Action;
use anyhow::Result;

/// Camera image observation, H×W×3 floats in row-major order
///
/// Environments report raw pixel values in `[0, 255]`; the loop normalizes
/// them into `[0, 1]` via [`normalized`](Self::normalized) before encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl Observation {
    /// Number of color channels per pixel
    pub const CHANNELS: usize = 3;

    /// Build an observation from raw pixel data
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != height * width * 3`.
    pub fn from_pixels(height: usize, width: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            height * width * Self::CHANNELS,
            "observation data does not match {height}x{width}x{} shape",
            Self::CHANNELS
        );
        Self {
            height,
            width,
            data,
        }
    }

    /// Divide every pixel value by 255, mapping `[0, 255]` into `[0, 1]`
    pub fn normalized(mut self) -> Self {
        for value in &mut self.data {
            *value /= 255.0;
        }
        self
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Flattened pixel data, `height * width * 3` values
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Result of executing one action in the environment
#[derive(Debug, Clone)]
pub struct Step {
    /// Observation after the action
    pub observation: Observation,

    /// Whether the episode ended (goal reached, collision, or simulator end)
    pub terminal: bool,

    /// Scalar reward for this step
    pub reward: f32,
}

/// Maze simulation driven by the train/eval loop
///
/// Accessors report the simulator's current bookkeeping: they are read after
/// `reset`/`execute` and carry the values of the most recent step. `success`
/// is read at episode end whatever value it holds, including when the episode
/// was cut off by the timestep cap.
pub trait MazeEnvironment {
    /// Reset the simulation for a fresh episode and return the initial
    /// (raw, unnormalized) observation
    fn reset(&mut self) -> Result<Observation>;

    /// Execute a velocity command and advance the simulation one step
    fn execute(&mut self, action: Action) -> Result<Step>;

    /// Identifier of the goal position chosen for the current episode
    fn goal(&self) -> u32;

    /// Goal position relative to the robot
    fn relative_pos(&self) -> [f32; 2];

    /// Velocity command executed on the previous step
    fn last_action(&self) -> Action;

    /// Scalar reward received on the previous step
    fn last_reward(&self) -> f32;

    /// Whether the navigation goal was achieved
    fn success(&self) -> bool;

    /// Shut the simulation down
    fn close(&mut self) -> Result<()>;
}
