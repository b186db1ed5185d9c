pub mod train_eval;

pub use train_eval::{EpisodeMode, RunOutcome, StopReason, TrainEvalMode};
