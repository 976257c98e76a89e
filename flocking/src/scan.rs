use crate::layers::LayerMask;
use crate::math::{Quat, Vec3};
use crate::spatial::{AgentId, ScanBuffer, SpatialEntry, SpatialIndex};

/// A classified-ready neighbor with its geometry relative to the scanning agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: AgentId,
    /// Neighbor position minus agent position.
    pub offset: Vec3,
    /// Unit `offset`, or zero when the two positions coincide.
    pub direction: Vec3,
    pub distance: f32,
    pub orientation: Quat,
    pub layers: LayerMask,
}

impl Neighbor {
    #[inline]
    pub fn relative_to(origin: Vec3, hit: &SpatialEntry) -> Self {
        let offset = hit.position - origin;
        let distance = offset.length();
        let direction = if distance > 0.0 {
            offset / distance
        } else {
            Vec3::ZERO
        };
        Self {
            id: hit.id,
            offset,
            direction,
            distance,
            orientation: hit.orientation,
            layers: hit.layers,
        }
    }
}

/// Parameters of one neighbor scan, usually taken from an agent's cached spec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanQuery {
    pub origin: Vec3,
    pub radius: f32,
    pub filter: LayerMask,
    /// Identity to drop from the results.
    pub exclude: AgentId,
}

/// Issue a single overlap query and yield neighbors, minus the querying agent.
///
/// The buffer is cleared first; results past its capacity are dropped. The
/// returned iterator borrows the buffer, so it cannot outlive the scan.
pub fn scan<'a, I>(
    query: ScanQuery,
    index: &I,
    buffer: &'a mut ScanBuffer,
) -> impl Iterator<Item = Neighbor> + 'a
where
    I: SpatialIndex + ?Sized,
{
    buffer.clear();
    if !query.filter.is_empty() {
        index.overlap_sphere(query.origin, query.radius, query.filter, buffer);
    }
    buffer
        .hits()
        .iter()
        .filter(move |hit| hit.id != query.exclude)
        .map(move |hit| Neighbor::relative_to(query.origin, hit))
}
