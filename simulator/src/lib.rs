use std::time::Duration;

use anyhow::Result;
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

pub mod args;
pub mod config;
pub mod recorder;
pub mod reload;
pub mod sim;

pub use args::Args;
pub use config::{load_config, parse_config, Config, SchoolConfig};
pub use recorder::Recorder;
pub use reload::ConfigWatch;
pub use sim::{
    Agent, Body, Layers, Motion, NeighborIndex, ScanStats, SimClock, SimPlugin, SimSet, Species,
    SpeciesTable,
};

/// Headless app running the flock at `cfg.tick_hz`.
pub fn build_sim_app(cfg: Config) -> Result<App> {
    cfg.validate()?;
    let tick = cfg.tick_duration();

    let mut app = App::new();
    if cfg.realtime {
        app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick)));
    } else {
        app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
            .insert_resource(TimeUpdateStrategy::ManualDuration(tick));
    }

    app.insert_resource(Time::<Fixed>::from_duration(tick))
        .insert_resource(SpeciesTable::from_config(&cfg)?)
        .insert_resource(cfg)
        .add_plugins(SimPlugin);
    Ok(app)
}

/// Wire up the optional recording and hot-reload requested on the command line.
pub fn attach_cli(app: &mut App, args: &Args) -> Result<()> {
    let cfg = app.world().resource::<Config>().clone();
    if let Some(path) = &args.record {
        let species = app.world().resource::<SpeciesTable>().names().to_vec();
        app.insert_resource(Recorder::create(path, &cfg, species)?);
    }
    if args.watch {
        app.insert_resource(ConfigWatch::new(args.config.clone()));
    }
    Ok(())
}
