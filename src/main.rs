mod analysis;
mod blocks;
mod config;
mod error;
mod helical;
mod manager;
mod reduce;
mod stats;
mod table;

use crate::manager::{Manager, combine_trajectories};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Average the internal steps of every frame.
    Reduce {
        #[arg(long)]
        traj_dir: PathBuf,
    },

    /// Block average the reduced series.
    Block {
        #[arg(long)]
        traj_dir: PathBuf,
    },

    /// Reduce and block average.
    Analyze {
        #[arg(long)]
        traj_dir: PathBuf,
    },

    /// Compare the results of every trajectory directory under a root.
    Combine {
        #[arg(long)]
        root: PathBuf,
    },

    /// Remove generated files from the trajectory directory.
    Clean {
        #[arg(long)]
        traj_dir: PathBuf,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    match args.command {
        Command::Reduce { traj_dir } => manager(traj_dir)?.reduce_trajectory()?,
        Command::Block { traj_dir } => manager(traj_dir)?.block_average()?,
        Command::Analyze { traj_dir } => {
            let mgr = manager(traj_dir)?;
            mgr.reduce_trajectory()?;
            mgr.block_average()?;
        }
        Command::Combine { root } => combine_trajectories(root)?,
        Command::Clean { traj_dir } => manager(traj_dir)?.clean_trajectory()?,
    }

    Ok(())
}

fn manager(traj_dir: PathBuf) -> Result<Manager> {
    Manager::new(traj_dir).context("failed to construct mgr")
}
