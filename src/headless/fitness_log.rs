//! Append-only CSV log of per-generation episode statistics

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::episode::EpisodeSummary;

const HEADER: &str =
    "Run,Avg Dist,Avg Speed,Avg Fitness,Landed,Crashed,Roll Killed,Out Of Bounds,Ticks";

/// Fitness log file. The header is written once, when the file is empty.
pub struct FitnessLog {
    path: PathBuf,
}

impl FitnessLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row for episode `run`
    pub fn append(&self, run: usize, summary: &EpisodeSummary) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open fitness log {}", self.path.display()))?;

        let empty = file
            .metadata()
            .context("Failed to read fitness log metadata")?
            .len()
            == 0;
        if empty {
            writeln!(file, "{}", HEADER).context("Failed to write fitness log header")?;
        }

        writeln!(
            file,
            "{},{:.3},{:.3},{:.3},{},{},{},{},{}",
            run,
            summary.avg_distance,
            summary.avg_velocity,
            summary.avg_fitness,
            summary.landed,
            summary.crashed,
            summary.roll_killed,
            summary.out_of_bounds,
            summary.ticks
        )
        .context("Failed to write fitness log row")?;
        Ok(())
    }
}
