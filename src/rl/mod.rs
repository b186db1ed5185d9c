//! Collaborator seams for the train/eval loop
//!
//! Provides:
//! - The per-timestep state input fed to the agent
//! - The `MazeEnvironment`, `Encoder` and `Agent` traits
//! - Reference implementations: a kinematic grid maze, an average-pooling
//!   encoder and a random-policy agent

pub mod agent;
pub mod encoder;
pub mod environment;
pub mod grid_maze;
pub mod state;

pub use agent::{Agent, RandomAgent};
pub use encoder::{Encoder, PoolingEncoder};
pub use environment::{MazeEnvironment, Observation, Step};
pub use grid_maze::GridMaze;
pub use state::{ActMode, Action, StateInput, ACTION_DIM, LATENT_DIM};
