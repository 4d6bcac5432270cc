use crate::blocks::BlockBoundaries;
use crate::error::Error;
use crate::reduce::{ChannelRange, FrameReducer, ValidityBounds};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration of one trajectory.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Raw input table.
    #[serde(default)]
    pub input: InputConfig,

    /// Channels kept for the per-frame average.
    pub channels: ChannelConfig,

    /// Bounds outside of which samples are masked.
    #[serde(default)]
    pub validity: ValidityBounds,

    /// Time blocks used for the uncertainty estimate.
    pub blocks: BlockConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// File name of the raw table, relative to the trajectory directory.
    pub raw_file: String,
    /// Lines starting with any of these are skipped.
    pub comment_markers: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            raw_file: "Twist__twist.xvg".to_string(),
            comment_markers: vec!["@".to_string(), "#".to_string()],
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Number of channels measured for the system (base-pair steps).
    pub n_channels: usize,
    /// First internal channel, counting from 1.
    pub first: usize,
    /// Last internal channel, inclusive.
    pub last: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BlockConfig {
    /// Block boundary times (ps).
    pub boundaries: Vec<f64>,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.input.raw_file.is_empty() {
            return Err(Error::config("raw_file", "file name must not be empty").into());
        }
        if self.input.comment_markers.iter().any(String::is_empty) {
            return Err(Error::config("comment_markers", "markers must not be empty").into());
        }
        self.reducer().context("invalid reduction parameters")?;
        self.boundaries().context("invalid block boundaries")?;
        Ok(())
    }

    pub fn reducer(&self) -> Result<FrameReducer, Error> {
        let ch = &self.channels;
        let channels = ChannelRange::new(ch.first, ch.last, ch.n_channels)?;
        FrameReducer::new(channels, self.validity)
    }

    pub fn boundaries(&self) -> Result<BlockBoundaries, Error> {
        BlockBoundaries::new(self.blocks.boundaries.clone())
    }
}

pub(crate) fn check_num<T, R>(param: &'static str, num: T, range: R) -> Result<(), Error>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(Error::config(
            param,
            format!("number must be in the range {range:?}, but is {num:?}"),
        ));
    }
    Ok(())
}
