use crate::math::{forward, Vec3};
use crate::scan::Neighbor;
use crate::spec::{BehaviorGroup, BehaviorSpec, FlockerSpec};

/// Linear falloff for an in-range neighbor: 1 at distance 0, 0 at the radius.
/// `None` when the neighbor lies outside the radius.
#[inline]
fn falloff(radius: f32, distance: f32) -> Option<f32> {
    if distance > radius {
        return None;
    }
    if radius > 0.0 {
        Some((radius - distance) / radius)
    } else {
        Some(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct GroupSum {
    sum: Vec3,
    count: u32,
}

/// Finalized per-group steering vectors for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringVectors {
    pub cohesion: Vec3,
    pub separation: Vec3,
    pub alignment: Vec3,
    pub avoidance: Vec3,
}

impl SteeringVectors {
    pub fn get(&self, group: BehaviorGroup) -> Vec3 {
        match group {
            BehaviorGroup::Cohesion => self.cohesion,
            BehaviorGroup::Separation => self.separation,
            BehaviorGroup::Alignment => self.alignment,
            BehaviorGroup::Avoidance => self.avoidance,
        }
    }

    /// Desired heading: the plain sum of all four channels.
    pub fn blend(&self) -> Vec3 {
        blend(self.cohesion, self.separation, self.alignment, self.avoidance)
    }
}

/// Sum the four channel vectors without normalizing; the magnitude later
/// throttles speed.
#[inline]
pub fn blend(cohesion: Vec3, separation: Vec3, alignment: Vec3, avoidance: Vec3) -> Vec3 {
    cohesion + separation + alignment + avoidance
}

/// Per-tick running sums for the four behavior groups.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringAccumulator {
    groups: [GroupSum; 4],
}

impl SteeringAccumulator {
    pub fn reset(&mut self) {
        self.groups = Default::default();
    }

    /// Feed one neighbor into every group whose filter it matches.
    pub fn accumulate(&mut self, neighbor: &Neighbor, spec: &FlockerSpec) {
        for group in BehaviorGroup::ALL {
            let params = spec.group(group);
            if params.filter.intersects(neighbor.layers) {
                self.accumulate_group(group, neighbor, params);
            }
        }
    }

    /// Apply a single group's weighting law to `neighbor`, ignoring filters.
    pub fn accumulate_group(&mut self, group: BehaviorGroup, neighbor: &Neighbor, params: &BehaviorSpec) {
        let Some(k) = falloff(params.radius, neighbor.distance) else {
            return;
        };
        let contribution = match group {
            BehaviorGroup::Cohesion => neighbor.direction * k,
            // avoidance is a second separation channel for a different class of threat
            BehaviorGroup::Separation | BehaviorGroup::Avoidance => -neighbor.direction * k,
            // heading taken from the neighbor's body axis, not its velocity
            BehaviorGroup::Alignment => forward(neighbor.orientation) * k,
        };
        let slot = &mut self.groups[group.index()];
        slot.sum += contribution;
        slot.count += 1;
    }

    pub fn count(&self, group: BehaviorGroup) -> u32 {
        self.groups[group.index()].count
    }

    pub fn raw_sum(&self, group: BehaviorGroup) -> Vec3 {
        self.groups[group.index()].sum
    }

    /// Mean contribution per group scaled by the group weight; empty groups are zero.
    pub fn finalize(&self, spec: &FlockerSpec) -> SteeringVectors {
        let v = |group: BehaviorGroup| {
            let g = &self.groups[group.index()];
            if g.count == 0 {
                Vec3::ZERO
            } else {
                g.sum / g.count as f32 * spec.group(group).weight
            }
        };
        SteeringVectors {
            cohesion: v(BehaviorGroup::Cohesion),
            separation: v(BehaviorGroup::Separation),
            alignment: v(BehaviorGroup::Alignment),
            avoidance: v(BehaviorGroup::Avoidance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerMask;
    use crate::math::Quat;
    use crate::spatial::AgentId;

    fn neighbor_at(offset: Vec3, layers: LayerMask) -> Neighbor {
        let distance = offset.length();
        Neighbor {
            id: AgentId(7),
            offset,
            direction: offset.normalize_or_zero(),
            distance,
            orientation: Quat::IDENTITY,
            layers,
        }
    }

    fn only(group: BehaviorGroup, weight: f32, radius: f32) -> FlockerSpec {
        let mut spec = FlockerSpec::default();
        for g in BehaviorGroup::ALL {
            spec.group_mut(g).filter = LayerMask::NONE;
        }
        *spec.group_mut(group) = BehaviorSpec::new(weight, radius, LayerMask::layer(0));
        spec
    }

    #[test]
    fn boundary_neighbor_contributes_zero_but_counts() {
        let spec = only(BehaviorGroup::Cohesion, 1.0, 4.0);
        let mut acc = SteeringAccumulator::default();
        acc.accumulate(&neighbor_at(Vec3::new(4.0, 0.0, 0.0), LayerMask::layer(0)), &spec);
        assert_eq!(acc.count(BehaviorGroup::Cohesion), 1);
        assert_eq!(acc.finalize(&spec).cohesion, Vec3::ZERO);
    }

    #[test]
    fn out_of_range_neighbor_is_ignored() {
        let spec = only(BehaviorGroup::Separation, 1.0, 3.0);
        let mut acc = SteeringAccumulator::default();
        acc.accumulate(&neighbor_at(Vec3::new(0.0, 3.01, 0.0), LayerMask::layer(0)), &spec);
        assert_eq!(acc.count(BehaviorGroup::Separation), 0);
    }

    #[test]
    fn groups_are_independent_bitmask_tests() {
        let mut spec = FlockerSpec::default();
        spec.cohesion.filter = LayerMask::layer(0);
        spec.separation.filter = LayerMask::layer(0) | LayerMask::layer(1);
        spec.alignment.filter = LayerMask::layer(2);
        spec.avoidance.filter = LayerMask::layer(1);

        let mut acc = SteeringAccumulator::default();
        acc.accumulate(&neighbor_at(Vec3::new(1.0, 0.0, 0.0), LayerMask::layer(0)), &spec);
        acc.accumulate(&neighbor_at(Vec3::new(-1.0, 0.0, 0.0), LayerMask::layer(1)), &spec);

        assert_eq!(acc.count(BehaviorGroup::Cohesion), 1);
        assert_eq!(acc.count(BehaviorGroup::Separation), 2);
        assert_eq!(acc.count(BehaviorGroup::Alignment), 0);
        assert_eq!(acc.count(BehaviorGroup::Avoidance), 1);
    }

    #[test]
    fn alignment_follows_neighbor_orientation() {
        let spec = only(BehaviorGroup::Alignment, 2.0, 5.0);
        let mut n = neighbor_at(Vec3::new(0.0, 0.0, 0.0), LayerMask::layer(0));
        n.orientation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let mut acc = SteeringAccumulator::default();
        acc.accumulate(&n, &spec);
        let v = acc.finalize(&spec).alignment;
        // +Z turned a quarter turn about +Y lands on +X
        assert!((v - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5, "v={v:?}");
    }

    #[test]
    fn zero_radius_does_not_divide_by_zero() {
        let spec = only(BehaviorGroup::Avoidance, 1.0, 0.0);
        let mut acc = SteeringAccumulator::default();
        acc.accumulate(&neighbor_at(Vec3::ZERO, LayerMask::layer(0)), &spec);
        let v = acc.finalize(&spec).avoidance;
        assert_eq!(acc.count(BehaviorGroup::Avoidance), 1);
        assert!(v.is_finite());
        assert_eq!(v, Vec3::ZERO);
    }

    #[test]
    fn reset_clears_all_groups() {
        let spec = only(BehaviorGroup::Cohesion, 1.0, 10.0);
        let mut acc = SteeringAccumulator::default();
        acc.accumulate(&neighbor_at(Vec3::X, LayerMask::layer(0)), &spec);
        acc.reset();
        assert_eq!(acc, SteeringAccumulator::default());
        assert_eq!(acc.finalize(&spec), SteeringVectors::default());
    }

    #[test]
    fn blend_is_a_plain_sum() {
        let v = SteeringVectors {
            cohesion: Vec3::X,
            separation: Vec3::Y,
            alignment: Vec3::Z,
            avoidance: Vec3::splat(-1.0),
        };
        assert_eq!(v.blend(), Vec3::ZERO);
        assert_eq!(v.get(BehaviorGroup::Alignment), Vec3::Z);
    }
}
