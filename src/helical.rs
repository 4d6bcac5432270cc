//! Helical repeat (base pairs per turn) derived from a mean twist angle.
//!
//! Two uncertainty estimators are provided and they are not interchangeable:
//! the analytic one linearises `360 / mean` around the mean, the empirical one
//! transforms each replicate mean and measures the spread of the results.

use crate::error::Error;
use crate::stats::compute_std_dev;
use serde::{Deserialize, Serialize};

pub const DEG_PER_TURN: f64 = 360.0;

/// Base pairs per full turn for a mean twist in degrees.
///
/// Returns `None` when the repeat is not finite (zero twist).
pub fn helical_repeat(mean_twist: f64) -> Option<f64> {
    let repeat = DEG_PER_TURN / mean_twist;
    repeat.is_finite().then_some(repeat)
}

/// First-order propagation of `mean_err` through `360 / mean`.
pub fn analytic_uncertainty(mean_twist: f64, mean_err: f64) -> f64 {
    DEG_PER_TURN / mean_twist.powi(2) * mean_err
}

/// Sample standard deviation of the repeats of each replicate mean.
pub fn empirical_uncertainty(replicate_means: &[f64]) -> Result<f64, Error> {
    let repeats = replicate_means
        .iter()
        .map(|&mean| {
            helical_repeat(mean).ok_or_else(|| {
                Error::config("replicate mean", format!("twist {mean} has no helical repeat"))
            })
        })
        .collect::<Result<Vec<f64>, Error>>()?;
    compute_std_dev(&repeats).ok_or(Error::InsufficientData {
        what: "empirical helical repeat uncertainty",
        needed: 2,
        found: repeats.len(),
    })
}

/// Which estimator to use for the helical repeat uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uncertainty {
    Analytic,
    Empirical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelicalRepeat {
    pub repeat: f64,
    pub analytic_err: Option<f64>,
    pub empirical_err: Option<f64>,
}

impl HelicalRepeat {
    /// Estimate the repeat of `mean_twist` with both uncertainties.
    ///
    /// `mean_err` is the uncertainty of `mean_twist` and `replicate_means` the
    /// independent means it was computed from. Either estimator is `None` when
    /// its input is unavailable; the empirical one also when a replicate mean
    /// has no repeat of its own (zero twist).
    pub fn estimate(
        mean_twist: f64,
        mean_err: Option<f64>,
        replicate_means: &[f64],
    ) -> Result<Self, Error> {
        let repeat = helical_repeat(mean_twist).ok_or_else(|| {
            Error::config("mean twist", format!("twist {mean_twist} has no helical repeat"))
        })?;
        let analytic_err = mean_err.map(|err| analytic_uncertainty(mean_twist, err));
        let empirical_err = match empirical_uncertainty(replicate_means) {
            Ok(err) => Some(err),
            Err(Error::InsufficientData { .. } | Error::Config { .. }) => None,
            Err(err) => return Err(err),
        };
        Ok(Self {
            repeat,
            analytic_err,
            empirical_err,
        })
    }

    pub fn uncertainty(&self, mode: Uncertainty) -> Option<f64> {
        match mode {
            Uncertainty::Analytic => self.analytic_err,
            Uncertainty::Empirical => self.empirical_err,
        }
    }
}
