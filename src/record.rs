//! Episode record logging
//!
//! Completed episodes are summarized as `(reward, timesteps, success)` tuples
//! and appended, one per line, to plain text log files. Files are opened in
//! append mode and closed within each flush, so records from a prior run (or
//! a crashed one) are preserved, not deduplicated.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Outcome summary of a single episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeRecord {
    /// Cumulative reward over the episode
    pub reward: f32,

    /// Number of timesteps taken, in `[1, max_timesteps]`
    pub timesteps: usize,

    /// Success flag as reported by the environment at episode end
    pub success: bool,
}

impl EpisodeRecord {
    pub fn new(reward: f32, timesteps: usize, success: bool) -> Self {
        Self {
            reward,
            timesteps,
            success,
        }
    }
}

impl fmt::Display for EpisodeRecord {
    /// Literal tuple form, e.g. `(12.5, 300, true)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {}, {})", self.reward, self.timesteps, self.success)
    }
}

impl FromStr for EpisodeRecord {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .with_context(|| format!("record is not a parenthesized tuple: {s:?}"))?;

        let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            bail!("expected 3 fields in record, got {}: {s:?}", fields.len());
        }

        Ok(Self {
            reward: fields[0]
                .parse()
                .with_context(|| format!("invalid reward in record: {s:?}"))?,
            timesteps: fields[1]
                .parse()
                .with_context(|| format!("invalid timestep count in record: {s:?}"))?,
            success: fields[2]
                .parse()
                .with_context(|| format!("invalid success flag in record: {s:?}"))?,
        })
    }
}

/// Appends episode records to a plain text log file
///
/// No file handle is held between flushes; each [`append`](Self::append)
/// opens the file, writes, and closes it.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    path: PathBuf,
}

impl RecordWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the log file this writer appends to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records to the log, one per line, in slice order
    ///
    /// Creates the file if absent. The target directory must already exist.
    pub fn append(&self, records: &[EpisodeRecord]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open record log {:?}", self.path))?;
        let mut writer = BufWriter::new(file);

        for record in records {
            writeln!(writer, "{record}")
                .with_context(|| format!("failed to write to record log {:?}", self.path))?;
        }

        writer
            .flush()
            .with_context(|| format!("failed to flush record log {:?}", self.path))?;

        Ok(())
    }
}

/// Read every record from a log file, in append order
pub fn read_records(path: &Path) -> Result<Vec<EpisodeRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read record log {path:?}"))?;

    contents
        .lines()
        .map(|line| line.parse())
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("malformed record log {path:?}"))
}
