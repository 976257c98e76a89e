use std::path::PathBuf;

use bevy::prelude::Resource;
use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug, Resource, Clone)]
#[command(name = "shoal-sim")]
#[command(about = "Headless fish-flock simulator", long_about = None)]
pub struct Args {
    /// Path to the TOML config
    #[arg(long, default_value = "shoal.toml")]
    pub config: PathBuf,
    /// Stop after this many ticks (overrides `max_ticks`; 0 runs forever)
    #[arg(long)]
    pub ticks: Option<u64>,
    /// RNG seed for school placement (overrides `seed`)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Append snapshot frames to this file
    #[arg(long)]
    pub record: Option<PathBuf>,
    /// Re-read species tunables when the config file changes
    #[arg(long, default_value_t = false)]
    pub watch: bool,
    /// Step as fast as possible instead of at wall-clock rate
    #[arg(long, default_value_t = false)]
    pub fast: bool,
}

impl Args {
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(ticks) = self.ticks {
            cfg.max_ticks = ticks;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if self.fast {
            cfg.realtime = false;
        }
    }
}
