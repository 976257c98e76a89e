use anyhow::Result;
use clap::Parser;
use tracing::info;

use simulator::{build_sim_app, load_config, Args};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut cfg = load_config(&args.config)?;
    args.apply_overrides(&mut cfg);
    info!(?cfg, "Simulator config loaded");

    let mut app = build_sim_app(cfg)?;
    simulator::attach_cli(&mut app, &args)?;
    app.insert_resource(args);
    app.run();
    Ok(())
}
