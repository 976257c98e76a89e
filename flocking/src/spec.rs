use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layers::LayerMask;

/// One of the four steering channels an agent blends each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorGroup {
    Cohesion,
    Separation,
    Alignment,
    Avoidance,
}

impl BehaviorGroup {
    pub const ALL: [BehaviorGroup; 4] = [
        BehaviorGroup::Cohesion,
        BehaviorGroup::Separation,
        BehaviorGroup::Alignment,
        BehaviorGroup::Avoidance,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            BehaviorGroup::Cohesion => "cohesion",
            BehaviorGroup::Separation => "separation",
            BehaviorGroup::Alignment => "alignment",
            BehaviorGroup::Avoidance => "avoidance",
        }
    }
}

impl fmt::Display for BehaviorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{param} must be finite and non-negative (got {value})")]
    InvalidParam { param: &'static str, value: f32 },
    #[error("{group}.{param} must be finite and non-negative (got {value})")]
    InvalidGroupParam {
        group: BehaviorGroup,
        param: &'static str,
        value: f32,
    },
    #[error("layer {0} is out of range (layers are 0..32)")]
    LayerOutOfRange(u8),
}

/// Tunables for one steering channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSpec {
    pub weight: f32,
    pub radius: f32,
    /// Layers whose members contribute to this channel.
    #[serde(default)]
    pub filter: LayerMask,
}

impl BehaviorSpec {
    pub const fn new(weight: f32, radius: f32, filter: LayerMask) -> Self {
        Self {
            weight,
            radius,
            filter,
        }
    }
}

/// Per-agent flocking tunables.
///
/// Defaults follow the reference fish: slow cohesion, strong separation and a
/// stronger avoidance channel for threats. Filters default to empty, so a
/// spec does nothing until it is told which layers to react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockerSpec {
    /// Cruise speed in m/s reached when the blended heading has unit length.
    pub speed: f32,
    /// Maximum turn rate in degrees per second.
    pub max_turn_rate_deg: f32,
    pub cohesion: BehaviorSpec,
    pub separation: BehaviorSpec,
    pub alignment: BehaviorSpec,
    pub avoidance: BehaviorSpec,
}

impl Default for FlockerSpec {
    fn default() -> Self {
        Self {
            speed: 5.0,
            max_turn_rate_deg: 120.0,
            cohesion: BehaviorSpec::new(0.2, 10.0, LayerMask::NONE),
            separation: BehaviorSpec::new(1.0, 3.0, LayerMask::NONE),
            alignment: BehaviorSpec::new(0.5, 5.0, LayerMask::NONE),
            avoidance: BehaviorSpec::new(2.0, 7.5, LayerMask::NONE),
        }
    }
}

fn check(param: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParam { param, value })
    }
}

impl FlockerSpec {
    pub fn group(&self, group: BehaviorGroup) -> &BehaviorSpec {
        match group {
            BehaviorGroup::Cohesion => &self.cohesion,
            BehaviorGroup::Separation => &self.separation,
            BehaviorGroup::Alignment => &self.alignment,
            BehaviorGroup::Avoidance => &self.avoidance,
        }
    }

    pub fn group_mut(&mut self, group: BehaviorGroup) -> &mut BehaviorSpec {
        match group {
            BehaviorGroup::Cohesion => &mut self.cohesion,
            BehaviorGroup::Separation => &mut self.separation,
            BehaviorGroup::Alignment => &mut self.alignment,
            BehaviorGroup::Avoidance => &mut self.avoidance,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("speed", self.speed)?;
        check("max_turn_rate_deg", self.max_turn_rate_deg)?;
        for group in BehaviorGroup::ALL {
            let g = self.group(group);
            for (param, value) in [("weight", g.weight), ("radius", g.radius)] {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ConfigError::InvalidGroupParam {
                        group,
                        param,
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Union of all four group filters; the only layers worth querying.
    pub fn combined_filter(&self) -> LayerMask {
        BehaviorGroup::ALL
            .iter()
            .fold(LayerMask::NONE, |acc, g| acc | self.group(*g).filter)
    }

    /// Largest group radius; the scan sphere never needs to be bigger.
    pub fn max_scan_radius(&self) -> f32 {
        BehaviorGroup::ALL
            .iter()
            .map(|g| self.group(*g).radius)
            .fold(0.0, f32::max)
    }
}
