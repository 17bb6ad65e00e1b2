//! Metrics export for offline charting
//!
//! Per-episode rows are appended to a CSV file as training runs; a
//! [`ScoreSummary`] condenses the whole score history at the end.
//!
//! # Format
//!
//! ```text
//! episode,score,reward,steps,epsilon,avg_score
//! 1,0,-100.80,9,0.9606,0.00
//! ```

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::training_stats::EpisodeSummary;

/// Number of histogram buckets in a [`ScoreSummary`]
pub const HISTOGRAM_BUCKETS: usize = 10;

const HEADER: &str = "episode,score,reward,steps,epsilon,avg_score";

/// Incremental CSV writer for episode metrics
pub struct MetricsWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl MetricsWriter {
    /// Create (or truncate) the CSV file and write the header
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file at {:?}", path))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{HEADER}")?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    /// Append one episode row; flushed so an interrupted run keeps its data
    pub fn write_episode(&mut self, summary: &EpisodeSummary, avg_score: f32) -> Result<()> {
        writeln!(
            self.writer,
            "{},{},{:.2},{},{:.4},{:.2}",
            summary.episode,
            summary.score,
            summary.total_reward,
            summary.steps,
            summary.epsilon,
            avg_score
        )
        .and_then(|_| self.writer.flush())
        .with_context(|| format!("Failed to write metrics to {:?}", self.path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Aggregate view of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub episodes: usize,
    pub mean: f32,
    pub max: u32,
    /// `(lowest score in bucket, episodes in bucket)`, lowest bucket first
    pub histogram: Vec<(u32, usize)>,
}

impl ScoreSummary {
    /// Summarize a score history; `None` when it is empty
    pub fn from_scores(scores: &[u32]) -> Option<Self> {
        let max = *scores.iter().max()?;
        let mean = scores.iter().map(|&s| s as f32).sum::<f32>() / scores.len() as f32;

        // Equal-width integer buckets covering 0..=max
        let width = (max as usize + 1).div_ceil(HISTOGRAM_BUCKETS).max(1);
        let buckets = (max as usize / width) + 1;
        let mut histogram: Vec<(u32, usize)> =
            (0..buckets).map(|b| ((b * width) as u32, 0)).collect();
        for &score in scores {
            histogram[score as usize / width].1 += 1;
        }

        Some(Self {
            episodes: scores.len(),
            mean,
            max,
            histogram,
        })
    }

    /// Multi-line text rendering with a bar per histogram bucket
    pub fn format(&self) -> String {
        let mut out = format!(
            "Episodes: {} | Mean score: {:.2} | Max score: {}",
            self.episodes, self.mean, self.max
        );

        let largest = self.histogram.iter().map(|&(_, n)| n).max().unwrap_or(0).max(1);
        let width = self.histogram.get(1).map_or(1, |&(lo, _)| lo);
        for &(lo, count) in &self.histogram {
            let bar = "#".repeat(count * 40 / largest);
            let hi = lo + width.saturating_sub(1);
            let range = if hi > lo { format!("{lo}-{hi}") } else { lo.to_string() };
            out.push_str(&format!("\n{range:>9} | {bar} {count}"));
        }

        out
    }
}
