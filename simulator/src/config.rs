use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bevy::prelude::Resource;
use flocking::{layers, species, BodySpec, FlockerSpec, SpawnBounds, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One group of identical fish placed at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolConfig {
    pub species: String,
    pub count: usize,
    /// Layer this school occupies in the spatial index.
    #[serde(default = "default_layer")]
    pub layer: u8,
    #[serde(flatten)]
    pub bounds: SpawnBounds,
}

fn default_layer() -> u8 {
    layers::FISH
}

#[derive(Debug, Clone, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct Config {
    pub tick_hz: u32,
    /// 0 runs until interrupted.
    pub max_ticks: u64,
    pub seed: u64,
    /// Pace ticks against the wall clock. When false every app update
    /// advances exactly one tick.
    pub realtime: bool,
    pub scan_capacity: usize,
    pub cell_size: f32,
    /// Write a recording frame every N ticks.
    pub record_every: u64,
    /// Log a population summary every N ticks (0 disables).
    pub summary_every: u64,
    pub body: BodySpec,
    /// Named tunables; these shadow the built-in presets.
    pub species: BTreeMap<String, FlockerSpec>,
    pub schools: Vec<SchoolConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_hz: 50,
            max_ticks: 0,
            seed: 0x5eed,
            realtime: true,
            scan_capacity: flocking::DEFAULT_SCAN_CAPACITY,
            cell_size: 10.0,
            record_every: 5,
            summary_every: 250,
            body: BodySpec::default(),
            species: BTreeMap::new(),
            schools: vec![
                SchoolConfig {
                    species: species::SARDINE.into(),
                    count: 120,
                    layer: layers::FISH,
                    bounds: SpawnBounds {
                        center: Vec3::new(0.0, -20.0, 0.0),
                        extents: Vec3::new(15.0, 5.0, 15.0),
                    },
                },
                SchoolConfig {
                    species: species::SHARK.into(),
                    count: 2,
                    layer: layers::PREDATOR,
                    bounds: SpawnBounds {
                        center: Vec3::new(0.0, -30.0, 0.0),
                        extents: Vec3::new(20.0, 2.0, 20.0),
                    },
                },
            ],
        }
    }
}

impl Config {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }

    /// Tunables for `name`: the config's own table first, then the presets.
    pub fn species_spec(&self, name: &str) -> Option<FlockerSpec> {
        self.species
            .get(name)
            .cloned()
            .or_else(|| species::builtin(name))
    }

    /// Species referenced by schools, in first-use order, with their specs.
    pub fn resolve_species(&self) -> Result<Vec<(String, FlockerSpec)>> {
        let mut out: Vec<(String, FlockerSpec)> = Vec::new();
        for school in &self.schools {
            if out.iter().any(|(n, _)| n == &school.species) {
                continue;
            }
            let spec = self
                .species_spec(&school.species)
                .with_context(|| format!("unknown species `{}`", school.species))?;
            spec.validate()
                .with_context(|| format!("species `{}`", school.species))?;
            out.push((school.species.clone(), spec));
        }
        Ok(out)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_hz == 0 {
            bail!("tick_hz must be positive");
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            bail!("cell_size must be positive, got {}", self.cell_size);
        }
        if self.scan_capacity == 0 {
            bail!("scan_capacity must be positive");
        }
        if self.record_every == 0 {
            bail!("record_every must be positive");
        }
        for (name, spec) in &self.species {
            spec.validate().with_context(|| format!("species `{name}`"))?;
        }
        for school in &self.schools {
            if u32::from(school.layer) >= 32 {
                bail!("school `{}` uses layer {}, max is 31", school.species, school.layer);
            }
        }
        self.resolve_species()?;
        Ok(())
    }
}

pub fn parse_config(text: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(text).context("parsing config")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Read and validate a config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_config(&text).with_context(|| format!("loading {}", path.display()))
}
