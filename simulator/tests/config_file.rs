use std::path::PathBuf;

use flocking::{layers, species, LayerMask};
use simulator::{load_config, parse_config, Config, SpeciesTable};

const SHOAL: &str = include_str!("../../shoal.toml");

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("shoal-{}-{name}", std::process::id()))
}

#[test]
fn bundled_config_parses() {
    let cfg = parse_config(SHOAL).expect("shoal.toml is valid");
    assert_eq!(cfg.tick_hz, 50);
    assert_eq!(cfg.schools.len(), 2);
    assert_eq!(cfg.schools[1].layer, layers::PREDATOR);

    let sardine = cfg.species_spec(species::SARDINE).unwrap();
    assert_eq!(sardine.speed, 4.5);
    assert_eq!(
        sardine.avoidance.filter,
        LayerMask::layer(layers::PREDATOR) | LayerMask::layer(layers::SCENERY)
    );
    // Not in the file, falls back to the preset.
    assert_eq!(cfg.species_spec(species::SHARK), species::builtin(species::SHARK));
}

#[test]
fn partial_file_keeps_defaults() {
    let cfg = parse_config("max_ticks = 40\n").unwrap();
    let defaults = Config::default();
    assert_eq!(cfg.max_ticks, 40);
    assert_eq!(cfg.tick_hz, defaults.tick_hz);
    assert_eq!(cfg.schools, defaults.schools);
    assert_eq!(cfg.scan_capacity, flocking::DEFAULT_SCAN_CAPACITY);
}

#[test]
fn school_layer_defaults_to_fish() {
    let cfg = parse_config(
        r#"
        [[schools]]
        species = "sardine"
        count = 3
        center = [0.0, -5.0, 0.0]
        extents = [1.0, 1.0, 1.0]
        "#,
    )
    .unwrap();
    assert_eq!(cfg.schools[0].layer, layers::FISH);
}

#[test]
fn rejects_bad_configs() {
    let unknown = r#"
        [[schools]]
        species = "kraken"
        count = 1
        center = [0.0, -5.0, 0.0]
        extents = [0.0, 0.0, 0.0]
    "#;
    let err = parse_config(unknown).unwrap_err();
    assert!(format!("{err:#}").contains("kraken"));

    let negative = r#"
        [species.sardine]
        speed = -1.0
    "#;
    assert!(parse_config(negative).is_err());

    let bad_filter = r#"
        [species.sardine]
        cohesion = { weight = 1.0, radius = 2.0, filter = [40] }
    "#;
    assert!(parse_config(bad_filter).is_err());

    assert!(parse_config("tick_hz = 0").is_err());
    assert!(parse_config("cell_size = 0.0").is_err());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let cfg = load_config(&scratch_path("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.schools, Config::default().schools);
}

#[test]
fn refreshed_table_follows_file_and_rejects_bad_edits() {
    let cfg = Config::default();
    let table = SpeciesTable::from_config(&cfg).unwrap();
    assert_eq!(table.names(), [species::SARDINE, species::SHARK]);

    let path = scratch_path("reload.toml");
    std::fs::write(
        &path,
        "[species.sardine]\nspeed = 9.0\ncohesion = { weight = 0.2, radius = 10.0, filter = [8] }\n",
    )
    .unwrap();
    let edited = load_config(&path).unwrap();
    let next = table.refreshed(&edited).unwrap();
    assert_ne!(next, table);
    let sardine = next.index_of(species::SARDINE).unwrap();
    assert_eq!(next.spec(simulator::Species(sardine)).unwrap().speed, 9.0);

    std::fs::write(&path, "[species.sardine]\nmax_turn_rate_deg = -5.0\n").unwrap();
    assert!(load_config(&path).and_then(|c| table.refreshed(&c)).is_err());
    let _ = std::fs::remove_file(&path);
}
