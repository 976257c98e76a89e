use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::spec::ConfigError;

/// Layer assigned to schooling prey fish by the built-in species.
pub const FISH: u8 = 8;
/// Layer assigned to predators by the built-in species.
pub const PREDATOR: u8 = 9;
/// Static obstacles and scenery that fish steer away from.
pub const SCENERY: u8 = 10;

/// Set of up to 32 layer tags.
///
/// Serialized as the list of set layer indices, so configs read `filter = [8, 9]`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    /// Mask with the single bit for `layer`; layers past 31 map to the empty mask.
    pub const fn layer(layer: u8) -> Self {
        match 1u32.checked_shl(layer as u32) {
            Some(bits) => Self(bits),
            None => Self::NONE,
        }
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter_layers(self) -> impl Iterator<Item = u8> {
        (0u8..32).filter(move |l| self.0 & (1u32 << l) != 0)
    }
}

impl BitOr for LayerMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for LayerMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for LayerMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl TryFrom<Vec<u8>> for LayerMask {
    type Error = ConfigError;

    fn try_from(layers: Vec<u8>) -> Result<Self, Self::Error> {
        layers.into_iter().try_fold(Self::NONE, |mask, layer| {
            if layer >= 32 {
                Err(ConfigError::LayerOutOfRange(layer))
            } else {
                Ok(mask | Self::layer(layer))
            }
        })
    }
}

impl From<LayerMask> for Vec<u8> {
    fn from(mask: LayerMask) -> Self {
        mask.iter_layers().collect()
    }
}

impl fmt::Debug for LayerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter_layers()).finish()
    }
}
