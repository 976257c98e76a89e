use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::layers::LayerMask;
use crate::math::{IVec3, Quat, Vec3};

/// Default number of raw hits a single overlap query may return.
pub const DEFAULT_SCAN_CAPACITY: usize = 256;

/// Stable agent identity; also the self-exclusion key for scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

/// One entry in a spatial index, and one raw hit returned by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub id: AgentId,
    pub position: Vec3,
    pub orientation: Quat,
    /// Tag bits this entry carries; tested against query and group filters.
    pub layers: LayerMask,
}

/// Fixed-capacity hit buffer for overlap queries.
///
/// Storage is allocated once. Hits past capacity are dropped and counted,
/// never reallocated. A buffer is scratch for a single query: callers clear it
/// before each scan and must not share one between concurrent scans.
#[derive(Debug, Clone)]
pub struct ScanBuffer {
    hits: Vec<SpatialEntry>,
    capacity: usize,
    dropped: usize,
}

impl Default for ScanBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SCAN_CAPACITY)
    }
}

impl ScanBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn clear(&mut self) {
        self.hits.clear();
        self.dropped = 0;
    }

    /// Append a hit. Returns false (and counts the drop) when full.
    pub fn push(&mut self, hit: SpatialEntry) -> bool {
        if self.hits.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.hits.push(hit);
        true
    }

    pub fn hits(&self) -> &[SpatialEntry] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hits rejected for lack of room since the last `clear`.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Sphere-overlap query port.
///
/// Implementations append every entry within `radius` of `center` whose
/// layers intersect `filter`, stopping once `out` is full. They do not clear
/// `out` and do not exclude any identity.
pub trait SpatialIndex {
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: LayerMask, out: &mut ScanBuffer);
}

#[inline]
fn overlaps(entry: &SpatialEntry, center: Vec3, radius_sq: f32, filter: LayerMask) -> bool {
    entry.layers.intersects(filter) && entry.position.distance_squared(center) <= radius_sq
}

/// Linear scan; fine for small populations and tests.
impl SpatialIndex for [SpatialEntry] {
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: LayerMask, out: &mut ScanBuffer) {
        let radius_sq = radius * radius;
        for entry in self {
            if overlaps(entry, center, radius_sq, filter) && !out.push(*entry) {
                return;
            }
        }
    }
}

impl SpatialIndex for Vec<SpatialEntry> {
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: LayerMask, out: &mut ScanBuffer) {
        self.as_slice().overlap_sphere(center, radius, filter, out);
    }
}

/// Uniform 3D hash grid over an unbounded world.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    inv_cell_size: f32,
    entries: Vec<SpatialEntry>,
    cells: HashMap<IVec3, Vec<u32>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            inv_cell_size: 1.0 / cell_size.max(1e-3),
            entries: Vec::new(),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        1.0 / self.inv_cell_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        let idx = self.entries.len() as u32;
        let cell = self.cell_of(entry.position);
        self.entries.push(entry);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Clear and re-insert everything yielded by `entries`.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = SpatialEntry>) {
        self.clear();
        for entry in entries {
            self.insert(entry);
        }
    }

    #[inline]
    fn cell_of(&self, pos: Vec3) -> IVec3 {
        (pos * self.inv_cell_size).floor().as_ivec3()
    }
}

impl SpatialIndex for SpatialHash {
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: LayerMask, out: &mut ScanBuffer) {
        if filter.is_empty() || radius < 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let min = self.cell_of(center - Vec3::splat(radius));
        let max = self.cell_of(center + Vec3::splat(radius));

        // Past this many cells a pass over the entries is cheaper than the cube.
        let span = (max.as_i64vec3() - min.as_i64vec3()) + 1;
        let volume = span.x.saturating_mul(span.y).saturating_mul(span.z);
        if volume > self.cells.len() as i64 {
            for entry in &self.entries {
                if overlaps(entry, center, radius_sq, filter) && !out.push(*entry) {
                    return;
                }
            }
            return;
        }

        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let Some(cell) = self.cells.get(&IVec3::new(x, y, z)) else {
                        continue;
                    };
                    for &idx in cell {
                        let entry = &self.entries[idx as usize];
                        if overlaps(entry, center, radius_sq, filter) && !out.push(*entry) {
                            return;
                        }
                    }
                }
            }
        }
    }
}
