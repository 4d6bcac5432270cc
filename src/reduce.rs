//! Per-frame reduction of raw twist samples.
//!
//! Each frame keeps a fixed contiguous range of channels, drops the cells that
//! fail the validity bounds and averages what survives. A frame with no valid
//! cell keeps its time coordinate and reports no value.

use crate::config::check_num;
use crate::error::Error;
use crate::helical::helical_repeat;
use crate::stats::{Accumulator, compute_mean};
use crate::table::RawTable;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Contiguous range of internal channels, numbered from 1 and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelRange {
    first: usize,
    last: usize,
    n_channels: usize,
}

impl ChannelRange {
    pub fn new(first: usize, last: usize, n_channels: usize) -> Result<Self, Error> {
        check_num("n_channels", n_channels, 1..)?;
        check_num("first channel", first, 1..=n_channels)?;
        check_num("last channel", last, first..=n_channels)?;
        Ok(Self {
            first,
            last,
            n_channels,
        })
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn last(&self) -> usize {
        self.last
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Number of selected channels.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Zero-based channel indices of the selection.
    pub fn indices(&self) -> Range<usize> {
        self.first - 1..self.last
    }
}

/// Bounds outside of which a sample is considered invalid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityBounds {
    /// Samples strictly greater than this are rejected.
    pub upper: f64,
    /// Value written by the instrument for missing data.
    pub sentinel: f64,
    /// Samples strictly smaller than this are rejected.
    pub lower: f64,
}

impl Default for ValidityBounds {
    fn default() -> Self {
        Self {
            upper: 100.0,
            sentinel: 999.0,
            lower: 0.0,
        }
    }
}

impl ValidityBounds {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.upper.is_finite() || !self.lower.is_finite() {
            return Err(Error::config(
                "validity bounds",
                format!("bounds must be finite, but are [{}, {}]", self.lower, self.upper),
            ));
        }
        if self.lower > self.upper {
            return Err(Error::config(
                "validity bounds",
                format!("lower bound {} exceeds upper bound {}", self.lower, self.upper),
            ));
        }
        Ok(())
    }

    pub fn is_valid(&self, val: f64) -> bool {
        let invalid =
            !val.is_finite() || val > self.upper || val == self.sentinel || val < self.lower;
        !invalid
    }
}

/// One reduced frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub time: f64,
    /// Mean over the valid channels, `None` if no channel was valid.
    pub value: Option<f64>,
}

/// Time and value of every frame with a defined value.
pub fn defined_samples(frames: &[Frame]) -> Vec<(f64, f64)> {
    frames
        .iter()
        .filter_map(|frame| frame.value.map(|val| (frame.time, val)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReducer {
    channels: ChannelRange,
    bounds: ValidityBounds,
}

impl FrameReducer {
    pub fn new(channels: ChannelRange, bounds: ValidityBounds) -> Result<Self, Error> {
        bounds.validate()?;
        Ok(Self { channels, bounds })
    }

    pub fn channels(&self) -> &ChannelRange {
        &self.channels
    }

    /// Reduce every frame of `table` to the mean of its valid selected channels.
    pub fn reduce(&self, table: &RawTable) -> Result<Reduction, Error> {
        let n_table_channels = table.n_channels();
        if n_table_channels < self.channels.last() {
            return Err(Error::config(
                "last channel",
                format!(
                    "table has {n_table_channels} channels, but channel {} was selected",
                    self.channels.last()
                ),
            ));
        }

        let indices = self.channels.indices();
        let mut frames = Vec::with_capacity(table.n_frames());
        let mut n_invalid = 0;
        for (&time, row) in table.times().iter().zip(table.rows()) {
            let mut acc = Accumulator::new();
            for &val in &row[indices.clone()] {
                if self.bounds.is_valid(val) {
                    acc.add(val);
                } else {
                    n_invalid += 1;
                }
            }
            frames.push(Frame {
                time,
                value: acc.mean(),
            });
        }

        Ok(Reduction {
            frames,
            n_channels: self.channels.len(),
            n_invalid,
        })
    }

    /// Header lines describing the reduction, for the output table.
    pub fn describe(&self) -> Vec<String> {
        let ch = &self.channels;
        let mut excluded = Vec::new();
        if ch.first() > 1 {
            excluded.push(format!("1-{}", ch.first() - 1));
        }
        if ch.last() < ch.n_channels() {
            excluded.push(format!("{}-{}", ch.last() + 1, ch.n_channels()));
        }
        let selection = if excluded.is_empty() {
            format!("All {} steps", ch.n_channels())
        } else {
            format!(
                "Internal steps {}-{} of {} (excluding steps {})",
                ch.first(),
                ch.last(),
                ch.n_channels(),
                excluded.join(" and ")
            )
        };
        let b = &self.bounds;
        vec![
            "Time(ps)   Avg_Internal_Twist(deg)".to_string(),
            selection,
            format!(
                "Masked values > {}, == {}, < {} or non-finite",
                b.upper, b.sentinel, b.lower
            ),
        ]
    }
}

/// Output of [`FrameReducer::reduce`]: one frame per input row plus masking counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub frames: Vec<Frame>,
    pub n_channels: usize,
    pub n_invalid: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionReport {
    pub n_frames: usize,
    pub n_channels: usize,
    pub n_invalid: usize,
    pub pct_invalid: f64,
    pub n_empty_frames: usize,
    pub mean: Option<f64>,
    pub helical_repeat: Option<f64>,
}

impl Reduction {
    pub fn report(&self) -> ReductionReport {
        let n_frames = self.frames.len();
        let n_cells = n_frames * self.n_channels;
        let pct_invalid = if n_cells > 0 {
            100.0 * self.n_invalid as f64 / n_cells as f64
        } else {
            0.0
        };

        let vals: Vec<f64> = self.frames.iter().filter_map(|frame| frame.value).collect();
        let mean = compute_mean(&vals);

        ReductionReport {
            n_frames,
            n_channels: self.n_channels,
            n_invalid: self.n_invalid,
            pct_invalid,
            n_empty_frames: n_frames - vals.len(),
            mean,
            helical_repeat: mean.and_then(helical_repeat),
        }
    }
}
