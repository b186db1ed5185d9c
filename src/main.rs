use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use maze_nav::config::NavConfig;
use maze_nav::modes::{StopReason, TrainEvalMode};
use maze_nav::rl::{GridMaze, PoolingEncoder, RandomAgent};

#[derive(Parser)]
#[command(name = "maze_nav")]
#[command(version, about = "Train/eval loop for latent-space maze navigation")]
struct Cli {
    /// Maze to run (1-3)
    #[arg(long, default_value = "1")]
    maze_id: u32,

    /// Deterministic action selection during training
    #[arg(long)]
    deterministic: bool,

    /// Restore the agent from its checkpoint before the first episode
    #[arg(long)]
    restore: bool,

    /// Directory for episode record logs
    #[arg(long, default_value = "record")]
    record_dir: PathBuf,

    /// Base directory for agent checkpoints
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

    /// Stop after this many episodes (default: run until the test success
    /// threshold is reached)
    #[arg(long)]
    max_episodes: Option<usize>,

    /// Seed for goal sampling and the reference agent
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = NavConfig {
        deterministic: cli.deterministic,
        restore: cli.restore,
        record_dir: cli.record_dir,
        model_dir: cli.model_dir,
        max_episodes: cli.max_episodes,
        ..NavConfig::new(cli.maze_id)
    };

    print_header(&config);

    let env = match cli.seed {
        Some(seed) => GridMaze::with_seed(config.maze_id, seed)?,
        None => GridMaze::new(config.maze_id)?,
    };
    let agent = match cli.seed {
        Some(seed) => RandomAgent::with_seed(seed),
        None => RandomAgent::new(),
    };

    let mut mode = TrainEvalMode::new(config, env, PoolingEncoder::new(), agent)?;
    let outcome = mode.run()?;

    println!();
    println!("Training end!");
    println!(
        "Train episodes: {} | Test episodes: {} | Total timesteps: {}",
        outcome.episodes, outcome.test_episodes, outcome.total_timesteps
    );
    match outcome.reason {
        StopReason::SuccessRate => println!("Stopped on test success rate"),
        StopReason::EpisodeCap => println!("Stopped on episode cap"),
    }

    Ok(())
}

fn print_header(config: &NavConfig) {
    println!("{}", "=".repeat(70));
    println!("Maze Navigation - Train/Eval Loop");
    println!("{}", "=".repeat(70));
    println!("Maze: {}", config.maze_id);
    println!("Deterministic training actions: {}", config.deterministic);
    println!("Restore from checkpoint: {}", config.restore);
    println!("Max timesteps per episode: {}", config.max_timesteps);
    println!(
        "Flush intervals: {} train / {} test episodes",
        config.train_flush_interval, config.test_flush_interval
    );
    println!(
        "Stop condition: >{} successes in last {} test episodes",
        config.stop_threshold, config.stop_window
    );
    println!("Train log: {:?}", config.train_record_path());
    println!("Test log: {:?}", config.test_record_path());
    println!("Checkpoints: {:?}", config.checkpoint_dir());
    println!("{}", "=".repeat(70));
    println!();
}
