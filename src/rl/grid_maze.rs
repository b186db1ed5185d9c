//! Kinematic grid-maze reference environment
//!
//! Stands in for the external simulator so the binary and tests can run the
//! loop end-to-end. A point robot moves in a bounded square arena under
//! velocity commands; each episode navigates to one of a fixed set of goal
//! positions, sampled uniformly on reset. There is no physics: position
//! integrates the command directly, leaving the arena ends the episode, and
//! reaching the goal radius is a success.

use crate::rl::environment::{MazeEnvironment, Observation, Step};
use crate::rl::state::Action;
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const OBS_HEIGHT: usize = 48;
const OBS_WIDTH: usize = 64;

/// Side length of the square arena
const ARENA_SIZE: f32 = 10.0;

/// Integration step for velocity commands
const DT: f32 = 0.2;

/// Distance to the goal that counts as reaching it
const SUCCESS_RADIUS: f32 = 0.4;

const STEP_PENALTY: f32 = 0.01;
const GOAL_REWARD: f32 = 10.0;
const COLLISION_PENALTY: f32 = -10.0;

/// Start position and candidate goals of one maze
#[derive(Debug, Clone)]
struct MazeLayout {
    start: [f32; 2],
    goals: Vec<[f32; 2]>,
}

fn layout(maze_id: u32) -> Option<MazeLayout> {
    match maze_id {
        1 => Some(MazeLayout {
            start: [5.0, 5.0],
            goals: vec![[1.0, 1.0], [9.0, 1.0], [1.0, 9.0], [9.0, 9.0]],
        }),
        2 => Some(MazeLayout {
            start: [1.0, 5.0],
            goals: vec![[9.0, 1.0], [9.0, 5.0], [9.0, 9.0]],
        }),
        3 => Some(MazeLayout {
            start: [5.0, 1.0],
            goals: vec![[1.0, 9.0], [5.0, 9.0], [9.0, 9.0]],
        }),
        _ => None,
    }
}

/// Point-robot maze environment over a bounded arena
pub struct GridMaze {
    maze_id: u32,
    layout: MazeLayout,
    rng: StdRng,
    pos: [f32; 2],
    goal_idx: usize,
    vel_cmd: Action,
    last_reward: f32,
    prev_dist: f32,
    success: bool,
    closed: bool,
}

impl GridMaze {
    pub fn new(maze_id: u32) -> Result<Self> {
        Self::from_rng(maze_id, StdRng::from_entropy())
    }

    /// Seeded construction for reproducible goal sampling
    pub fn with_seed(maze_id: u32, seed: u64) -> Result<Self> {
        Self::from_rng(maze_id, StdRng::seed_from_u64(seed))
    }

    fn from_rng(maze_id: u32, rng: StdRng) -> Result<Self> {
        let Some(layout) = layout(maze_id) else {
            bail!("unknown maze id {maze_id}");
        };

        let start = layout.start;
        let first_goal = layout.goals[0];
        Ok(Self {
            maze_id,
            layout,
            rng,
            pos: start,
            goal_idx: 0,
            vel_cmd: [0.0, 0.0],
            last_reward: 0.0,
            prev_dist: distance(start, first_goal),
            success: false,
            closed: false,
        })
    }

    pub fn maze_id(&self) -> u32 {
        self.maze_id
    }

    fn goal_pos(&self) -> [f32; 2] {
        self.layout.goals[self.goal_idx]
    }

    /// Synthetic camera image: one channel peaks near the robot, one near the
    /// goal, one encodes the vertical arena coordinate. Raw values in [0, 255].
    fn observation(&self) -> Observation {
        let goal = self.goal_pos();
        let mut data = Vec::with_capacity(OBS_HEIGHT * OBS_WIDTH * Observation::CHANNELS);

        for row in 0..OBS_HEIGHT {
            for col in 0..OBS_WIDTH {
                let ax = (col as f32 + 0.5) / OBS_WIDTH as f32 * ARENA_SIZE;
                let ay = (row as f32 + 0.5) / OBS_HEIGHT as f32 * ARENA_SIZE;
                let pixel = [ax, ay];

                data.push(255.0 * (-distance(pixel, self.pos) / 2.0).exp());
                data.push(255.0 * (-distance(pixel, goal) / 2.0).exp());
                data.push(255.0 * ay / ARENA_SIZE);
            }
        }

        Observation::from_pixels(OBS_HEIGHT, OBS_WIDTH, data)
    }
}

impl MazeEnvironment for GridMaze {
    fn reset(&mut self) -> Result<Observation> {
        if self.closed {
            bail!("environment is closed");
        }

        self.goal_idx = self.rng.gen_range(0..self.layout.goals.len());
        self.pos = self.layout.start;
        self.vel_cmd = [0.0, 0.0];
        self.last_reward = 0.0;
        self.prev_dist = distance(self.pos, self.goal_pos());
        self.success = false;

        Ok(self.observation())
    }

    fn execute(&mut self, action: Action) -> Result<Step> {
        if self.closed {
            bail!("environment is closed");
        }

        let cmd = [action[0].clamp(-1.0, 1.0), action[1].clamp(-1.0, 1.0)];
        self.pos[0] += cmd[0] * DT;
        self.pos[1] += cmd[1] * DT;
        self.vel_cmd = cmd;

        let out_of_bounds = self
            .pos
            .iter()
            .any(|&c| !(0.0..=ARENA_SIZE).contains(&c));

        let (reward, terminal) = if out_of_bounds {
            (COLLISION_PENALTY, true)
        } else {
            let dist = distance(self.pos, self.goal_pos());
            let mut reward = self.prev_dist - dist - STEP_PENALTY;
            self.prev_dist = dist;

            if dist <= SUCCESS_RADIUS {
                self.success = true;
                reward += GOAL_REWARD;
                (reward, true)
            } else {
                (reward, false)
            }
        };

        self.last_reward = reward;

        Ok(Step {
            observation: self.observation(),
            terminal,
            reward,
        })
    }

    fn goal(&self) -> u32 {
        self.goal_idx as u32
    }

    fn relative_pos(&self) -> [f32; 2] {
        let goal = self.goal_pos();
        [goal[0] - self.pos[0], goal[1] - self.pos[1]]
    }

    fn last_action(&self) -> Action {
        self.vel_cmd
    }

    fn last_reward(&self) -> f32 {
        self.last_reward
    }

    fn success(&self) -> bool {
        self.success
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}
