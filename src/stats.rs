use serde::{Deserialize, Serialize};

/// Running mean and sample variance of a stream of values (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    /// Mean of the values added so far, `None` if there are none.
    pub fn mean(&self) -> Option<f64> {
        (self.n_vals > 0).then_some(self.mean)
    }

    /// Bessel-corrected standard deviation, `None` with fewer than 2 values.
    pub fn std_dev(&self) -> Option<f64> {
        (self.n_vals > 1).then(|| (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt())
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: self.mean(),
            std_dev: self.std_dev(),
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn compute_mean(vals: &[f64]) -> Option<f64> {
    if vals.is_empty() {
        return None;
    }
    Some(vals.iter().sum::<f64>() / vals.len() as f64)
}

/// Sample variance with the `n - 1` divisor.
pub fn compute_var(vals: &[f64]) -> Option<f64> {
    let n_vals = vals.len();
    if n_vals < 2 {
        return None;
    }
    let mean = compute_mean(vals)?;
    let diff_2_sum = vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>();
    Some(diff_2_sum / (n_vals - 1) as f64)
}

pub fn compute_std_dev(vals: &[f64]) -> Option<f64> {
    compute_var(vals).map(f64::sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_matches_two_pass_estimates() {
        let vals = [35.2, 34.8, 36.1, 35.5, 34.9, 35.0];
        let mut acc = Accumulator::new();
        for &val in &vals {
            acc.add(val);
        }

        let report = acc.report();
        assert_eq!(report.n_vals, 6);
        let mean = report.mean.unwrap();
        let std_dev = report.std_dev.unwrap();
        assert!((mean - compute_mean(&vals).unwrap()).abs() < 1e-12);
        assert!((std_dev - compute_std_dev(&vals).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn undefined_moments_are_none() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.std_dev(), None);

        acc.add(40.0);
        assert_eq!(acc.mean(), Some(40.0));
        assert_eq!(acc.std_dev(), None);

        assert_eq!(compute_mean(&[]), None);
        assert_eq!(compute_var(&[1.0]), None);
    }

    #[test]
    fn std_dev_uses_bessel_correction() {
        let std_dev = compute_std_dev(&[20.0, 40.0]).unwrap();
        assert!((std_dev - 200.0_f64.sqrt()).abs() < 1e-12);
    }
}
