//! Block averaging of a per-frame time series.
//!
//! Consecutive frames of a trajectory are correlated, so the uncertainty of
//! the trajectory mean is estimated from the spread of the means of a few long
//! contiguous blocks, each treated as one independent replicate.

use crate::error::Error;
use crate::stats::{Accumulator, compute_mean, compute_std_dev};
use serde::{Deserialize, Serialize};

/// Strictly increasing block boundary times.
///
/// Block 0 spans `[b0, b1]`; block `i > 0` spans `(b_i, b_{i+1}]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockBoundaries {
    times: Vec<f64>,
}

impl BlockBoundaries {
    pub fn new(times: Vec<f64>) -> Result<Self, Error> {
        if times.len() < 2 {
            return Err(Error::config(
                "block boundaries",
                format!("at least 2 boundaries are needed, but {} given", times.len()),
            ));
        }
        if let Some(time) = times.iter().find(|time| !time.is_finite()) {
            return Err(Error::config(
                "block boundaries",
                format!("boundary {time} is not finite"),
            ));
        }
        if let Some(pair) = times.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(Error::config(
                "block boundaries",
                format!(
                    "boundaries must be strictly increasing, but {} is followed by {}",
                    pair[0], pair[1]
                ),
            ));
        }
        Ok(Self { times })
    }

    pub fn n_blocks(&self) -> usize {
        self.times.len() - 1
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Whether `time` falls in block `i_blk`.
    pub fn contains(&self, i_blk: usize, time: f64) -> bool {
        let start = self.times[i_blk];
        let end = self.times[i_blk + 1];
        if i_blk == 0 {
            start <= time && time <= end
        } else {
            start < time && time <= end
        }
    }

    /// Index of the block containing `time`, if any.
    pub fn block_of(&self, time: f64) -> Option<usize> {
        (0..self.n_blocks()).find(|&i_blk| self.contains(i_blk, time))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub start: f64,
    pub end: f64,
    pub n_frames: usize,
    /// `None` for an empty block.
    pub mean: Option<f64>,
    /// `None` for blocks with fewer than 2 frames.
    pub std_dev: Option<f64>,
}

impl BlockSummary {
    pub fn is_empty(&self) -> bool {
        self.n_frames == 0
    }
}

/// Per-block statistics of one trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAnalysis {
    pub blocks: Vec<BlockSummary>,
    /// Frames outside every block.
    pub n_unassigned: usize,
}

impl BlockAnalysis {
    /// Partition `samples` (time, value) into the blocks and summarise each one.
    ///
    /// Frames without a defined value must be filtered out beforehand.
    pub fn new(samples: &[(f64, f64)], boundaries: &BlockBoundaries) -> Result<Self, Error> {
        if samples.is_empty() {
            return Err(Error::EmptySeries);
        }

        let mut acc_vec = Vec::new();
        acc_vec.resize_with(boundaries.n_blocks(), Accumulator::new);
        let mut n_unassigned = 0;
        for &(time, val) in samples {
            match boundaries.block_of(time) {
                Some(i_blk) => acc_vec[i_blk].add(val),
                None => n_unassigned += 1,
            }
        }

        let blocks = acc_vec
            .iter()
            .zip(boundaries.times().windows(2))
            .map(|(acc, range)| {
                let report = acc.report();
                BlockSummary {
                    start: range[0],
                    end: range[1],
                    n_frames: report.n_vals,
                    mean: report.mean,
                    std_dev: report.std_dev,
                }
            })
            .collect();

        Ok(Self {
            blocks,
            n_unassigned,
        })
    }

    /// Means of the non-empty blocks, in block order.
    pub fn block_means(&self) -> Vec<f64> {
        self.blocks.iter().filter_map(|blk| blk.mean).collect()
    }

    pub fn n_filled_blocks(&self) -> usize {
        self.blocks.iter().filter(|blk| !blk.is_empty()).count()
    }

    /// Sample standard deviation of the frames in block `i_blk`.
    pub fn block_std_dev(&self, i_blk: usize) -> Result<f64, Error> {
        let blk = self.blocks.get(i_blk).ok_or_else(|| {
            Error::config(
                "block index",
                format!("{i_blk} is out of range for {} blocks", self.blocks.len()),
            )
        })?;
        blk.std_dev.ok_or(Error::InsufficientData {
            what: "block standard deviation",
            needed: 2,
            found: blk.n_frames,
        })
    }

    /// Unweighted mean of the non-empty block means.
    pub fn trajectory_mean(&self) -> Result<f64, Error> {
        let means = self.block_means();
        compute_mean(&means).ok_or(Error::InsufficientData {
            what: "trajectory mean",
            needed: 1,
            found: 0,
        })
    }

    /// Sample standard deviation of the non-empty block means.
    pub fn standard_error(&self) -> Result<f64, Error> {
        let means = self.block_means();
        compute_std_dev(&means).ok_or(Error::InsufficientData {
            what: "trajectory standard error",
            needed: 2,
            found: means.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    pub n_blocks: usize,
    pub mean: f64,
    /// `None` when fewer than 2 blocks have data.
    pub std_err: Option<f64>,
}

impl TrajectorySummary {
    /// Summarise a block analysis, keeping the mean alone when the standard
    /// error is unavailable.
    pub fn from_analysis(analysis: &BlockAnalysis) -> Result<Self, Error> {
        let mean = analysis.trajectory_mean()?;
        let std_err = match analysis.standard_error() {
            Ok(err) => Some(err),
            Err(Error::InsufficientData { .. }) => None,
            Err(err) => return Err(err),
        };
        Ok(Self {
            n_blocks: analysis.n_filled_blocks(),
            mean,
            std_err,
        })
    }
}
