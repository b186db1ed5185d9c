//! Maze Nav - train/eval orchestration for RL maze navigation
//!
//! This library provides:
//! - Run configuration (config module)
//! - Episode record logging (record module)
//! - Rolling success tracking (metrics module)
//! - Collaborator seams for encoder, environment and agent (rl module)
//! - The train/eval loop itself (modes module)
//!
//! The policy optimizer, the latent encoder model and the maze simulation are
//! collaborators behind traits; this crate only orchestrates them. Reference
//! implementations (a random-policy agent, a pooling encoder, a kinematic grid
//! maze) are included so the binary runs end-to-end.

pub mod config;
pub mod metrics;
pub mod modes;
pub mod record;
pub mod rl;
