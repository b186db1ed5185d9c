//! Combined training and evaluation loop
//!
//! Runs episodes indefinitely, routing each one into train or test mode by
//! whether the environment's sampled goal belongs to the configured test-goal
//! set. Train episodes feed a learning signal to the agent and are flushed to
//! the train log (with a checkpoint) every `train_flush_interval` episodes;
//! test episodes run the agent independently, are flushed every
//! `test_flush_interval` episodes, and feed the rolling success window that
//! decides termination.
//!
//! # Example
//!
//! ```rust,ignore
//! use maze_nav::config::NavConfig;
//! use maze_nav::modes::TrainEvalMode;
//! use maze_nav::rl::{GridMaze, PoolingEncoder, RandomAgent};
//!
//! let config = NavConfig::new(1);
//! let env = GridMaze::new(config.maze_id)?;
//! let mut mode = TrainEvalMode::new(config, env, PoolingEncoder::new(), RandomAgent::new())?;
//! let outcome = mode.run()?;
//! ```

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::NavConfig;
use crate::metrics::SuccessWindow;
use crate::record::{EpisodeRecord, RecordWriter};
use crate::rl::{ActMode, Agent, Encoder, MazeEnvironment, Observation, StateInput};

/// Per-episode routing decided once, from goal membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeMode {
    /// Learning signal sent to the agent each timestep
    Train,
    /// Independent evaluation; no learning signal
    Test,
}

/// Why the loop terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// More than `stop_threshold` of the windowed test outcomes succeeded
    SuccessRate,
    /// The optional `max_episodes` cap was reached
    EpisodeCap,
}

/// Summary returned when the loop terminates
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    /// Train episodes completed
    pub episodes: usize,
    /// Test episodes completed
    pub test_episodes: usize,
    /// Timesteps accumulated across train episodes
    pub total_timesteps: usize,
    pub reason: StopReason,
}

/// Training/evaluation loop over an environment, encoder and agent
///
/// Owns all run bookkeeping: episode counters, pending record lists and the
/// rolling test-success window. Collaborators own their internal state
/// (simulation, model weights); the loop only drives them.
pub struct TrainEvalMode<Env, E, A> {
    config: NavConfig,
    env: Env,
    encoder: E,
    agent: A,

    episode: usize,
    test_episode: usize,
    total_timesteps: usize,

    pending_train: Vec<EpisodeRecord>,
    pending_test: Vec<EpisodeRecord>,
    window: SuccessWindow,

    train_writer: RecordWriter,
    test_writer: RecordWriter,
}

impl<Env, E, A> TrainEvalMode<Env, E, A>
where
    Env: MazeEnvironment,
    E: Encoder,
    A: Agent,
{
    /// Create the loop, validating the configuration and creating the record,
    /// checkpoint and summary directories if absent
    pub fn new(config: NavConfig, env: Env, encoder: E, agent: A) -> Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;

        for dir in [
            config.record_dir.clone(),
            config.checkpoint_dir(),
            config.summary_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create directory {dir:?}"))?;
        }

        let train_writer = RecordWriter::new(config.train_record_path());
        let test_writer = RecordWriter::new(config.test_record_path());
        let window = SuccessWindow::new(config.stop_window);

        Ok(Self {
            config,
            env,
            encoder,
            agent,
            episode: 0,
            test_episode: 0,
            total_timesteps: 0,
            pending_train: Vec::new(),
            pending_test: Vec::new(),
            window,
            train_writer,
            test_writer,
        })
    }

    /// Run episodes until the stopping condition fires
    ///
    /// The success-rate condition over test episodes is the only normal
    /// termination path unless `max_episodes` is set; a maze whose goals
    /// never fall in the test set runs until killed.
    pub fn run(&mut self) -> Result<RunOutcome> {
        if self.config.restore {
            let dir = self.config.checkpoint_dir();
            self.agent
                .restore(&dir)
                .with_context(|| format!("failed to restore agent from {dir:?}"))?;
            info!(dir = ?dir, "restored agent checkpoint");
        }

        loop {
            self.agent.reset();
            let observation = self
                .env
                .reset()
                .context("environment reset failed")?
                .normalized();

            let mode = if self.config.is_test_goal(self.env.goal()) {
                EpisodeMode::Test
            } else {
                EpisodeMode::Train
            };

            let (episode_reward, timesteps) = self.run_episode(observation, mode)?;

            // Read whatever the environment reports, even when the episode
            // was cut off by the timestep cap rather than a true terminal.
            let success = self.env.success();
            let record = EpisodeRecord::new(episode_reward, timesteps, success);

            match mode {
                EpisodeMode::Train => self.record_train_episode(record, timesteps)?,
                EpisodeMode::Test => {
                    self.record_test_episode(record)?;

                    if self.window.is_full()
                        && self.window.successes() > self.config.stop_threshold
                    {
                        info!(
                            successes = self.window.successes(),
                            window = self.window.capacity(),
                            "test success rate reached, stopping"
                        );
                        self.finish()?;
                        return Ok(self.outcome(StopReason::SuccessRate));
                    }
                }
            }

            if let Some(cap) = self.config.max_episodes {
                if self.episode + self.test_episode >= cap {
                    info!(cap, "episode cap reached, stopping");
                    self.finish()?;
                    return Ok(self.outcome(StopReason::EpisodeCap));
                }
            }
        }
    }

    /// Run the inner timestep loop for one episode
    ///
    /// Returns the cumulative reward and the number of timesteps taken, the
    /// latter always in `[1, max_timesteps]`.
    fn run_episode(
        &mut self,
        mut observation: Observation,
        mode: EpisodeMode,
    ) -> Result<(f32, usize)> {
        let act_mode = match mode {
            EpisodeMode::Train => ActMode::Learning {
                deterministic: self.config.deterministic,
            },
            EpisodeMode::Test => ActMode::Independent,
        };

        let mut timestep = 0;
        let mut episode_reward = 0.0;

        loop {
            let latent_vector = self
                .encoder
                .encode(&observation)
                .context("encoder failed")?;
            let state = StateInput {
                latent_vector,
                relative_pos: self.env.relative_pos(),
                previous_action: self.env.last_action(),
                previous_reward: [self.env.last_reward()],
            };

            let action = self.agent.act(&state, act_mode);
            let step = self
                .env
                .execute(action)
                .context("environment step failed")?;
            observation = step.observation.normalized();

            if mode == EpisodeMode::Train {
                self.agent.observe(step.terminal, step.reward);
            }

            timestep += 1;
            episode_reward += step.reward;

            if step.terminal || timestep == self.config.max_timesteps {
                break;
            }
        }

        Ok((episode_reward, timestep))
    }

    fn record_train_episode(&mut self, record: EpisodeRecord, timesteps: usize) -> Result<()> {
        self.episode += 1;
        self.total_timesteps += timesteps;
        self.pending_train.push(record);

        debug!(
            episode = self.episode,
            reward = record.reward,
            timesteps,
            success = record.success,
            "train episode"
        );

        if self.episode % self.config.log_frequency == 0 {
            info!(
                episode = self.episode,
                total_timesteps = self.total_timesteps,
                last_reward = record.reward,
                "training progress"
            );
        }

        if self.episode % self.config.train_flush_interval == 0 {
            self.flush_train()?;
            self.checkpoint()?;
        }

        Ok(())
    }

    fn record_test_episode(&mut self, record: EpisodeRecord) -> Result<()> {
        self.test_episode += 1;
        self.pending_test.push(record);
        self.window.push(record.success);

        debug!(
            test_episode = self.test_episode,
            reward = record.reward,
            timesteps = record.timesteps,
            success = record.success,
            "test episode"
        );

        if self.test_episode % self.config.test_flush_interval == 0 {
            self.flush_test()?;
        }

        Ok(())
    }

    /// Append pending train records to the train log and clear the list
    fn flush_train(&mut self) -> Result<()> {
        self.train_writer
            .append(&self.pending_train)
            .context("failed to flush train records")?;
        info!(
            count = self.pending_train.len(),
            path = ?self.train_writer.path(),
            "flushed train records"
        );
        self.pending_train.clear();
        Ok(())
    }

    /// Append pending test records to the test log and clear the list
    fn flush_test(&mut self) -> Result<()> {
        self.test_writer
            .append(&self.pending_test)
            .context("failed to flush test records")?;
        info!(
            count = self.pending_test.len(),
            path = ?self.test_writer.path(),
            "flushed test records"
        );
        self.pending_test.clear();
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<()> {
        let dir = self.config.checkpoint_dir();
        let path = self
            .agent
            .save_model(&dir)
            .with_context(|| format!("failed to save agent checkpoint to {dir:?}"))?;
        info!(path = ?path, "saved agent checkpoint");
        Ok(())
    }

    /// Final teardown: flush both pending lists, checkpoint, close the
    /// environment
    fn finish(&mut self) -> Result<()> {
        self.flush_train()?;
        self.flush_test()?;
        self.checkpoint()?;
        self.env
            .close()
            .context("failed to close environment")?;
        Ok(())
    }

    fn outcome(&self, reason: StopReason) -> RunOutcome {
        RunOutcome {
            episodes: self.episode,
            test_episodes: self.test_episode,
            total_timesteps: self.total_timesteps,
            reason,
        }
    }

    /// Train episodes completed so far
    pub fn episodes(&self) -> usize {
        self.episode
    }

    /// Test episodes completed so far
    pub fn test_episodes(&self) -> usize {
        self.test_episode
    }

    /// Timesteps accumulated across train episodes
    pub fn total_timesteps(&self) -> usize {
        self.total_timesteps
    }

    /// Number of train records not yet flushed
    pub fn pending_train(&self) -> usize {
        self.pending_train.len()
    }

    /// Number of test records not yet flushed
    pub fn pending_test(&self) -> usize {
        self.pending_test.len()
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{Action, Observation, PoolingEncoder, Step, LATENT_DIM};
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Environment that terminates after a fixed number of steps, with a
    /// scripted per-episode success outcome.
    struct StubEnv {
        goal: u32,
        steps_per_episode: Option<usize>,
        step_reward: f32,
        outcomes: Vec<bool>,
        episode: usize,
        step: usize,
        success: bool,
        last_action: Action,
        last_reward: f32,
        closes: usize,
    }

    impl StubEnv {
        fn new(goal: u32, steps_per_episode: Option<usize>, step_reward: f32) -> Self {
            Self {
                goal,
                steps_per_episode,
                step_reward,
                outcomes: vec![true],
                episode: 0,
                step: 0,
                success: false,
                last_action: [0.0, 0.0],
                last_reward: 0.0,
                closes: 0,
            }
        }

        fn with_outcomes(mut self, outcomes: Vec<bool>) -> Self {
            self.outcomes = outcomes;
            self
        }

        fn obs() -> Observation {
            Observation::from_pixels(2, 2, vec![128.0; 12])
        }
    }

    impl MazeEnvironment for StubEnv {
        fn reset(&mut self) -> Result<Observation> {
            self.step = 0;
            self.success = false;
            self.last_action = [0.0, 0.0];
            self.last_reward = 0.0;
            Ok(Self::obs())
        }

        fn execute(&mut self, action: Action) -> Result<Step> {
            self.step += 1;
            self.last_action = action;
            self.last_reward = self.step_reward;

            let terminal = self.steps_per_episode == Some(self.step);
            if terminal {
                self.success = self.outcomes[self.episode % self.outcomes.len()];
                self.episode += 1;
            }

            Ok(Step {
                observation: Self::obs(),
                terminal,
                reward: self.step_reward,
            })
        }

        fn goal(&self) -> u32 {
            self.goal
        }

        fn relative_pos(&self) -> [f32; 2] {
            [1.0, -1.0]
        }

        fn last_action(&self) -> Action {
            self.last_action
        }

        fn last_reward(&self) -> f32 {
            self.last_reward
        }

        fn success(&self) -> bool {
            self.success
        }

        fn close(&mut self) -> Result<()> {
            self.closes += 1;
            Ok(())
        }
    }

    /// Agent that counts every trait call and remembers the act modes seen.
    #[derive(Default)]
    struct StubAgent {
        resets: usize,
        acts: usize,
        observes: usize,
        saves: Cell<usize>,
        restores: usize,
        modes: Vec<ActMode>,
    }

    impl Agent for StubAgent {
        fn reset(&mut self) {
            self.resets += 1;
        }

        fn act(&mut self, state: &StateInput, mode: ActMode) -> Action {
            assert_eq!(state.latent_vector.len(), LATENT_DIM);
            self.acts += 1;
            self.modes.push(mode);
            [0.1, 0.2]
        }

        fn observe(&mut self, _terminal: bool, _reward: f32) {
            self.observes += 1;
        }

        fn save_model(&self, dir: &std::path::Path) -> Result<std::path::PathBuf> {
            self.saves.set(self.saves.get() + 1);
            Ok(dir.join("stub.ckpt"))
        }

        fn restore(&mut self, _dir: &std::path::Path) -> Result<()> {
            self.restores += 1;
            Ok(())
        }
    }

    fn test_config(dir: &TempDir) -> NavConfig {
        let mut config = NavConfig::new(1);
        config.record_dir = dir.path().join("record");
        config.model_dir = dir.path().join("models");
        config
    }

    #[test]
    fn test_train_goal_sends_learning_signal() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.max_episodes = Some(2);

        // Goal 0 is not in maze 1's test set
        let env = StubEnv::new(0, Some(3), 1.0);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        let outcome = mode.run().unwrap();

        assert_eq!(outcome.episodes, 2);
        assert_eq!(outcome.test_episodes, 0);
        assert_eq!(outcome.total_timesteps, 6);
        assert_eq!(outcome.reason, StopReason::EpisodeCap);

        let agent = mode.agent();
        assert_eq!(agent.resets, 2);
        assert_eq!(agent.acts, 6);
        assert_eq!(agent.observes, 6);
        assert!(agent.modes.iter().all(|m| m.is_learning()));
    }

    #[test]
    fn test_test_goal_sends_no_learning_signal() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.max_episodes = Some(2);

        // Goal 3 is maze 1's held-out test goal
        let env = StubEnv::new(3, Some(3), 1.0);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        let outcome = mode.run().unwrap();

        assert_eq!(outcome.episodes, 0);
        assert_eq!(outcome.test_episodes, 2);
        assert_eq!(outcome.total_timesteps, 0);

        let agent = mode.agent();
        assert_eq!(agent.observes, 0);
        assert!(agent.modes.iter().all(|m| *m == ActMode::Independent));
    }

    #[test]
    fn test_determinism_flag_plumbed_into_act_mode() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.deterministic = true;
        config.max_episodes = Some(1);

        let env = StubEnv::new(0, Some(1), 0.0);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        mode.run().unwrap();

        assert_eq!(
            mode.agent().modes,
            vec![ActMode::Learning {
                deterministic: true
            }]
        );
    }

    #[test]
    fn test_timestep_cap_bounds_inner_loop() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.max_timesteps = 10;
        config.max_episodes = Some(1);

        // Never terminates on its own
        let env = StubEnv::new(0, None, -0.1);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        let outcome = mode.run().unwrap();

        assert_eq!(outcome.total_timesteps, 10);
        assert_eq!(mode.agent().acts, 10);
    }

    #[test]
    fn test_flush_clears_pending_and_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.train_flush_interval = 2;
        config.max_episodes = Some(3);

        let env = StubEnv::new(0, Some(2), 1.0);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        mode.run().unwrap();

        // Interval flush after episode 2, final flush of episode 3 at the cap
        let records = crate::record::read_records(&mode.config().train_record_path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(mode.pending_train(), 0);

        // One interval checkpoint plus the final one
        assert_eq!(mode.agent().saves.get(), 2);
    }

    #[test]
    fn test_stop_fires_only_with_full_window() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.stop_window = 4;
        config.stop_threshold = 2;
        config.test_flush_interval = 100;

        // All-test-goal environment succeeding every episode: the window
        // fills at episode 4 with 4 > 2 successes.
        let env = StubEnv::new(3, Some(1), 0.5).with_outcomes(vec![true]);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        let outcome = mode.run().unwrap();

        assert_eq!(outcome.reason, StopReason::SuccessRate);
        assert_eq!(outcome.test_episodes, 4);
        assert_eq!(mode.env().closes, 1);
        assert_eq!(mode.agent().saves.get(), 1);
    }

    #[test]
    fn test_stop_does_not_fire_below_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.stop_window = 4;
        config.stop_threshold = 2;
        config.max_episodes = Some(8);

        // Alternating outcomes: any 4-episode window holds 2 successes,
        // never more than the threshold.
        let env = StubEnv::new(3, Some(1), 0.5).with_outcomes(vec![true, false]);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        let outcome = mode.run().unwrap();

        assert_eq!(outcome.reason, StopReason::EpisodeCap);
        assert_eq!(outcome.test_episodes, 8);
    }

    #[test]
    fn test_success_read_on_timestep_cap_exit() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.max_timesteps = 3;
        config.train_flush_interval = 1;
        config.max_episodes = Some(1);

        // Non-terminating environment: the episode ends via the cap and the
        // environment's success flag (false) is recorded as-is.
        let env = StubEnv::new(0, None, 0.0);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        mode.run().unwrap();

        let records = crate::record::read_records(&mode.config().train_record_path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timesteps, 3);
        assert!(!records[0].success);
    }

    #[test]
    fn test_restore_invoked_when_configured() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.restore = true;
        config.max_episodes = Some(1);

        let env = StubEnv::new(0, Some(1), 0.0);
        let mut mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();
        mode.run().unwrap();

        assert_eq!(mode.agent().restores, 1);
    }

    #[test]
    fn test_startup_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let env = StubEnv::new(0, Some(1), 0.0);
        let mode =
            TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default()).unwrap();

        assert!(mode.config().record_dir.is_dir());
        assert!(mode.config().checkpoint_dir().is_dir());
        assert!(mode.config().summary_dir().is_dir());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.max_timesteps = 0;

        let env = StubEnv::new(0, Some(1), 0.0);
        let result = TrainEvalMode::new(config, env, PoolingEncoder::new(), StubAgent::default());
        assert!(result.is_err());
    }
}
