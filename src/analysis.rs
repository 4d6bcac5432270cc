use crate::blocks::{BlockAnalysis, TrajectorySummary};
use crate::error::Error;
use crate::helical::{HelicalRepeat, analytic_uncertainty, empirical_uncertainty, helical_repeat};
use crate::stats::{compute_mean, compute_std_dev};
use anyhow::{Context, Result};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Block averaging results of one trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryReport {
    /// Frames dropped because no channel was valid.
    pub n_filtered: usize,
    pub analysis: BlockAnalysis,
    pub summary: TrajectorySummary,
    pub helical: HelicalRepeat,
}

impl TrajectoryReport {
    pub fn new(n_filtered: usize, analysis: BlockAnalysis) -> Result<Self, Error> {
        let summary = TrajectorySummary::from_analysis(&analysis)?;
        let helical =
            HelicalRepeat::estimate(summary.mean, summary.std_err, &analysis.block_means())?;
        Ok(Self {
            n_filtered,
            analysis,
            summary,
            helical,
        })
    }
}

/// One trajectory of an ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleMember {
    pub label: String,
    pub mean: f64,
    pub std_err: Option<f64>,
    pub helical_repeat: Option<f64>,
}

/// Comparison of the trajectory means of several simulated sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub members: Vec<EnsembleMember>,
    pub mean: f64,
    pub std_dev: f64,
    pub sem: f64,
    pub helical_repeat: f64,
    /// Analytic uncertainty propagated from the standard error of the mean.
    pub helical_analytic_err: f64,
    /// Sample standard deviation of the members' repeats.
    pub helical_empirical_err: f64,
}

impl EnsembleSummary {
    pub fn new(members: Vec<EnsembleMember>) -> Result<Self, Error> {
        let means: Vec<f64> = members.iter().map(|mbr| mbr.mean).collect();
        let insufficient = Error::InsufficientData {
            what: "ensemble summary",
            needed: 2,
            found: means.len(),
        };
        let mean = compute_mean(&means).ok_or_else(|| insufficient.clone())?;
        let std_dev = compute_std_dev(&means).ok_or(insufficient)?;
        let sem = std_dev / (means.len() as f64).sqrt();

        let helical_repeat = helical_repeat(mean).ok_or_else(|| {
            Error::config("ensemble mean", format!("twist {mean} has no helical repeat"))
        })?;

        Ok(Self {
            helical_analytic_err: analytic_uncertainty(mean, sem),
            helical_empirical_err: empirical_uncertainty(&means)?,
            members,
            mean,
            std_dev,
            sem,
            helical_repeat,
        })
    }
}

/// Save a value as a MessagePack file.
pub fn save_msgpack<T: Serialize, P: AsRef<Path>>(value: &T, file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, value).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Load a value from a MessagePack file.
pub fn load_msgpack<T: DeserializeOwned, P: AsRef<Path>>(file: P) -> Result<T> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let mut reader = BufReader::new(file);
    let value = decode::from_read(&mut reader).context("failed to deserialize value")?;
    Ok(value)
}
