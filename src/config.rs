//! Run configuration for the train/eval loop

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Configuration for a training/evaluation run
///
/// Fixed at startup and immutable for the process lifetime. Goal positions
/// listed in `test_goals` for the active maze are evaluated (no learning
/// signal); all other goals are trained on.
///
/// # Example
///
/// ```rust
/// use maze_nav::config::NavConfig;
///
/// // Defaults for maze 1
/// let config = NavConfig::new(1);
/// assert_eq!(config.max_timesteps, 1000);
///
/// // Or customize specific parameters
/// let config = NavConfig {
///     deterministic: true,
///     ..NavConfig::new(2)
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavConfig {
    /// Identifier of the active maze
    pub maze_id: u32,

    /// Whether training-mode action selection is deterministic
    ///
    /// Test-mode episodes always evaluate deterministically regardless of
    /// this flag.
    pub deterministic: bool,

    /// Restore the agent from its checkpoint directory before the first episode
    pub restore: bool,

    /// Name prefix for log files and the summary directory
    pub run_name: String,

    /// Maximum timesteps per episode before the inner loop is cut off
    ///
    /// Default: 1000
    pub max_timesteps: usize,

    /// Flush train records and checkpoint the agent every N train episodes
    ///
    /// Default: 1000
    pub train_flush_interval: usize,

    /// Flush test records every N test episodes
    ///
    /// Default: 100
    pub test_flush_interval: usize,

    /// Size of the rolling window of test outcomes
    ///
    /// Default: 100
    pub stop_window: usize,

    /// Stop once more than this many of the windowed test outcomes succeeded
    ///
    /// Default: 60
    pub stop_threshold: usize,

    /// Log a training progress line every N train episodes
    ///
    /// Default: 100
    pub log_frequency: usize,

    /// Optional cap on the total number of episodes (train + test)
    ///
    /// `None` preserves the run-forever behavior: absent the success-rate
    /// stopping condition, the loop never terminates on its own.
    pub max_episodes: Option<usize>,

    /// Directory for episode record logs
    pub record_dir: PathBuf,

    /// Base directory for agent checkpoints
    pub model_dir: PathBuf,

    /// Per-maze designation of which goal positions are held out for testing
    pub test_goals: BTreeMap<u32, BTreeSet<u32>>,
}

impl NavConfig {
    /// Create a configuration with default parameters for the given maze
    pub fn new(maze_id: u32) -> Self {
        let mut test_goals = BTreeMap::new();
        test_goals.insert(1, BTreeSet::from([3]));
        test_goals.insert(2, BTreeSet::from([0, 2]));
        test_goals.insert(3, BTreeSet::from([1]));

        Self {
            maze_id,
            deterministic: false,
            restore: false,
            run_name: "ppo_rnn".to_string(),
            max_timesteps: 1000,
            train_flush_interval: 1000,
            test_flush_interval: 100,
            stop_window: 100,
            stop_threshold: 60,
            log_frequency: 100,
            max_episodes: None,
            record_dir: PathBuf::from("record"),
            model_dir: PathBuf::from("models"),
            test_goals,
        }
    }

    /// Whether the given goal is held out for testing in the active maze
    pub fn is_test_goal(&self, goal: u32) -> bool {
        self.test_goals
            .get(&self.maze_id)
            .is_some_and(|goals| goals.contains(&goal))
    }

    /// Path of the train episode log: `<record_dir>/<run_name>_nav<maze_id>.txt`
    pub fn train_record_path(&self) -> PathBuf {
        self.record_dir
            .join(format!("{}_nav{}.txt", self.run_name, self.maze_id))
    }

    /// Path of the test episode log: `<record_dir>/<run_name>_test_nav<maze_id>.txt`
    pub fn test_record_path(&self) -> PathBuf {
        self.record_dir
            .join(format!("{}_test_nav{}.txt", self.run_name, self.maze_id))
    }

    /// Directory the agent checkpoints into: `<model_dir>/nav<maze_id>`
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.model_dir.join(format!("nav{}", self.maze_id))
    }

    /// Directory for run summaries: `<record_dir>/<run_name>/nav<maze_id>`
    pub fn summary_dir(&self) -> PathBuf {
        self.record_dir
            .join(&self.run_name)
            .join(format!("nav{}", self.maze_id))
    }

    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error
    /// message otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use maze_nav::config::NavConfig;
    ///
    /// let mut config = NavConfig::new(1);
    /// assert!(config.validate().is_ok());
    ///
    /// config.max_timesteps = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.run_name.is_empty() {
            return Err("run_name must not be empty".to_string());
        }

        if self.max_timesteps == 0 {
            return Err("max_timesteps must be at least 1".to_string());
        }

        if self.train_flush_interval == 0 {
            return Err("train_flush_interval must be at least 1".to_string());
        }

        if self.test_flush_interval == 0 {
            return Err("test_flush_interval must be at least 1".to_string());
        }

        if self.stop_window == 0 {
            return Err("stop_window must be at least 1".to_string());
        }

        if self.stop_threshold >= self.stop_window {
            return Err(format!(
                "stop_threshold ({}) must be below stop_window ({})",
                self.stop_threshold, self.stop_window
            ));
        }

        if self.log_frequency == 0 {
            return Err("log_frequency must be at least 1".to_string());
        }

        if self.max_episodes == Some(0) {
            return Err("max_episodes must be at least 1 when set".to_string());
        }

        Ok(())
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self::new(1)
    }
}
