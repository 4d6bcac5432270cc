use crate::analysis::{
    EnsembleMember, EnsembleSummary, TrajectoryReport, load_msgpack, save_msgpack,
};
use crate::blocks::BlockAnalysis;
use crate::config::Config;
use crate::helical::Uncertainty;
use crate::reduce::defined_samples;
use crate::table::{read_series, read_table, write_block_means, write_series};
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

const SERIES_FILE: &str = "twist_internal_avg.xvg";
const BLOCK_MEANS_FILE: &str = "block_averages_for_plotting.dat";
const RESULTS_FILE: &str = "results.msgpack";
const ENSEMBLE_FILE: &str = "ensemble.msgpack";

pub struct Manager {
    traj_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(traj_dir: P) -> Result<Self> {
        let traj_dir = traj_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(traj_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { traj_dir, cfg })
    }

    /// Reduce the raw table to one averaged value per frame.
    pub fn reduce_trajectory(&self) -> Result<()> {
        let raw_file = self.traj_dir.join(&self.cfg.input.raw_file);
        let file =
            File::open(&raw_file).with_context(|| format!("failed to open {raw_file:?}"))?;
        let table = read_table(BufReader::new(file), &self.cfg.input.comment_markers)
            .with_context(|| format!("failed to read {raw_file:?}"))?;
        log::info!(
            "read {} frames of {} channels from {raw_file:?}",
            table.n_frames(),
            table.n_channels()
        );

        let reducer = self.cfg.reducer()?;
        let reduction = reducer.reduce(&table).context("failed to reduce frames")?;

        let series_file = self.series_file();
        let file = File::create(&series_file)
            .with_context(|| format!("failed to create {series_file:?}"))?;
        let mut writer = BufWriter::new(file);
        write_series(&mut writer, &reduction.frames, &reducer.describe())?;
        writer.flush().context("failed to flush writer stream")?;
        log::info!("saved {series_file:?}");

        let report = reduction.report();
        log::info!("internal steps: {}", report.n_channels);
        log::info!(
            "invalid values filtered: {} ({:.2}%)",
            report.n_invalid,
            report.pct_invalid
        );
        if report.n_empty_frames > 0 {
            log::warn!("{} frames have no valid steps", report.n_empty_frames);
        }
        match (report.mean, report.helical_repeat) {
            (Some(mean), Some(repeat)) => {
                log::info!("overall average: {mean:.3} deg");
                log::info!("helical repeat: {repeat:.2} bp/turn");
            }
            (Some(mean), None) => log::info!("overall average: {mean:.3} deg"),
            _ => log::warn!("no frame has a defined average"),
        }

        Ok(())
    }

    /// Block average the reduced series and save the results.
    pub fn block_average(&self) -> Result<()> {
        let series_file = self.series_file();
        let file =
            File::open(&series_file).with_context(|| format!("failed to open {series_file:?}"))?;
        let frames = read_series(BufReader::new(file))
            .with_context(|| format!("failed to read {series_file:?}"))?;

        let samples = defined_samples(&frames);
        let n_filtered = frames.len() - samples.len();
        if n_filtered > 0 {
            log::warn!("filtered {n_filtered} frames without a defined average");
        }
        if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
            log::info!(
                "loaded {} valid frames from {:.0} to {:.0} ps",
                samples.len(),
                first.0,
                last.0
            );
        }

        let boundaries = self.cfg.boundaries()?;
        let analysis =
            BlockAnalysis::new(&samples, &boundaries).context("failed to analyze blocks")?;
        if analysis.n_unassigned > 0 {
            log::warn!("{} frames fall outside every block", analysis.n_unassigned);
        }

        log::info!("block | time range (ns) | average (deg) | std dev (deg) | n frames");
        for (i_blk, blk) in analysis.blocks.iter().enumerate() {
            let range = format!("{:.0} - {:.0}", blk.start / 1000.0, blk.end / 1000.0);
            let mean = blk.mean.map_or("no data".to_string(), |val| format!("{val:.3}"));
            let std_dev = match analysis.block_std_dev(i_blk) {
                Ok(val) => format!("{val:.3}"),
                Err(_) => "undefined".to_string(),
            };
            log::info!(
                "{:>5} | {range:<15} | {mean:^13} | {std_dev:^13} | {:>8}",
                i_blk + 1,
                blk.n_frames
            );
        }

        let report =
            TrajectoryReport::new(n_filtered, analysis).context("failed to summarize blocks")?;
        let summary = &report.summary;
        log::info!("overall average (mean of blocks): {:.3} deg", summary.mean);
        match summary.std_err {
            Some(std_err) => {
                log::info!("standard error (std dev of blocks): {std_err:.3} deg");
                log::info!("report as: {:.3} ± {std_err:.3} deg", summary.mean);
            }
            None => log::warn!(
                "standard error needs at least 2 blocks with data, found {}",
                summary.n_blocks
            ),
        }
        let helical = &report.helical;
        log::info!("helical repeat: {:.2} bp/turn", helical.repeat);
        for mode in [Uncertainty::Analytic, Uncertainty::Empirical] {
            if let Some(err) = helical.uncertainty(mode) {
                log::info!("helical repeat uncertainty ({mode:?}): {err:.3} bp/turn");
            }
        }

        let block_means_file = self.traj_dir.join(BLOCK_MEANS_FILE);
        let file = File::create(&block_means_file)
            .with_context(|| format!("failed to create {block_means_file:?}"))?;
        let mut writer = BufWriter::new(file);
        write_block_means(&mut writer, &report.analysis.block_means())?;
        writer.flush().context("failed to flush writer stream")?;
        log::info!("saved {block_means_file:?}");

        let results_file = self.traj_dir.join(RESULTS_FILE);
        save_msgpack(&report, &results_file).context("failed to save results")?;
        log::info!("saved {results_file:?}");

        Ok(())
    }

    /// Remove every generated file from the trajectory directory.
    pub fn clean_trajectory(&self) -> Result<()> {
        for name in [SERIES_FILE, BLOCK_MEANS_FILE, RESULTS_FILE] {
            let file = self.traj_dir.join(name);
            match fs::remove_file(&file) {
                Ok(()) => log::info!("removed {file:?}"),
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => {
                    return Err(error).with_context(|| format!("failed to remove {file:?}"));
                }
            }
        }
        Ok(())
    }

    fn series_file(&self) -> PathBuf {
        self.traj_dir.join(SERIES_FILE)
    }
}

/// Compare the results of every trajectory directory directly under `root`.
pub fn combine_trajectories<P: AsRef<Path>>(root: P) -> Result<()> {
    let root = root.as_ref();
    let pattern = root.join("*").join(RESULTS_FILE);
    let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
    let mut results_files: Vec<PathBuf> = glob(pattern)
        .context("failed to glob results files")?
        .filter_map(Result::ok)
        .collect();
    results_files.sort();

    let mut members = Vec::with_capacity(results_files.len());
    for results_file in &results_files {
        let report: TrajectoryReport = load_msgpack(results_file)
            .with_context(|| format!("failed to load {results_file:?}"))?;
        let label = results_file
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("loaded {results_file:?}");
        members.push(EnsembleMember {
            label,
            mean: report.summary.mean,
            std_err: report.summary.std_err,
            helical_repeat: Some(report.helical.repeat),
        });
    }

    let ensemble = EnsembleSummary::new(members).context("failed to combine trajectories")?;
    for mbr in &ensemble.members {
        let std_err = mbr.std_err.map_or("undefined".to_string(), |val| format!("{val:.3}"));
        let repeat = mbr
            .helical_repeat
            .map_or("undefined".to_string(), |val| format!("{val:.2}"));
        log::info!("{}: {:.3} ± {std_err} deg, {repeat} bp/turn", mbr.label, mbr.mean);
    }
    log::info!(
        "overall mean twist: {:.3} ± {:.3} deg (sem {:.3})",
        ensemble.mean,
        ensemble.std_dev,
        ensemble.sem
    );
    log::info!(
        "helical repeat: {:.2} ± {:.2} bp/turn (analytic ± {:.2})",
        ensemble.helical_repeat,
        ensemble.helical_empirical_err,
        ensemble.helical_analytic_err
    );

    let ensemble_file = root.join(ENSEMBLE_FILE);
    save_msgpack(&ensemble, &ensemble_file).context("failed to save ensemble")?;
    log::info!("saved {ensemble_file:?}");

    Ok(())
}
