use crate::layers::{LayerMask, FISH, PREDATOR, SCENERY};
use crate::spec::{BehaviorSpec, FlockerSpec};

pub const SARDINE: &str = "sardine";
pub const SHARK: &str = "shark";

// Small schooling fish: tight spacing, flees predators and scenery.
pub fn sardine_spec() -> FlockerSpec {
    let school = LayerMask::layer(FISH);
    FlockerSpec {
        speed: 5.0,
        max_turn_rate_deg: 120.0,
        cohesion: BehaviorSpec::new(0.2, 10.0, school),
        separation: BehaviorSpec::new(1.0, 3.0, school),
        alignment: BehaviorSpec::new(0.5, 5.0, school),
        avoidance: BehaviorSpec::new(
            2.0,
            7.5,
            LayerMask::layer(PREDATOR) | LayerMask::layer(SCENERY),
        ),
    }
}

// Lone hunter: pulled toward fish, keeps its distance from other sharks.
pub fn shark_spec() -> FlockerSpec {
    FlockerSpec {
        speed: 6.5,
        max_turn_rate_deg: 45.0,
        cohesion: BehaviorSpec::new(1.0, 14.0, LayerMask::layer(FISH)),
        separation: BehaviorSpec::new(0.8, 8.0, LayerMask::layer(PREDATOR)),
        alignment: BehaviorSpec::new(0.0, 0.0, LayerMask::NONE),
        avoidance: BehaviorSpec::new(2.0, 4.0, LayerMask::layer(SCENERY)),
    }
}

/// Look up a built-in species by name.
pub fn builtin(name: &str) -> Option<FlockerSpec> {
    match name {
        SARDINE => Some(sardine_spec()),
        SHARK => Some(shark_spec()),
        _ => None,
    }
}
