use crate::layers::LayerMask;
use crate::math::Vec3;
use crate::motion::{integrate_motion, AgentPose, MotionOutput};
use crate::scan::{scan, ScanQuery};
use crate::spatial::{AgentId, ScanBuffer, SpatialIndex};
use crate::spec::{BehaviorGroup, ConfigError, FlockerSpec};
use crate::steering::{SteeringAccumulator, SteeringVectors};

/// Telemetry for one perception pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringDebug {
    /// Raw hits returned by the index, including self.
    pub hits: usize,
    /// Hits lost to buffer overflow.
    pub dropped: usize,
    pub counts: [u32; 4],
    pub vectors: SteeringVectors,
    pub desired_heading: Vec3,
}

/// Flocking state for one simulated fish.
///
/// Owns the tunables, the scan parameters derived from them and the
/// per-tick steering scratch. Pose lives with the body; the agent only reads
/// it during perception and writes it during `act`.
#[derive(Debug, Clone)]
pub struct FlockAgent {
    id: AgentId,
    spec: FlockerSpec,
    combined_filter: LayerMask,
    max_scan_radius: f32,
    steering: SteeringAccumulator,
    desired_heading: Vec3,
}

impl FlockAgent {
    pub fn new(id: AgentId, spec: FlockerSpec) -> Result<Self, ConfigError> {
        spec.validate()?;
        Ok(Self {
            id,
            combined_filter: spec.combined_filter(),
            max_scan_radius: spec.max_scan_radius(),
            spec,
            steering: SteeringAccumulator::default(),
            desired_heading: Vec3::ZERO,
        })
    }

    /// Swap in new tunables. On error the previous spec stays in effect.
    pub fn reconfigure(&mut self, spec: FlockerSpec) -> Result<(), ConfigError> {
        spec.validate()?;
        self.combined_filter = spec.combined_filter();
        self.max_scan_radius = spec.max_scan_radius();
        self.spec = spec;
        Ok(())
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn spec(&self) -> &FlockerSpec {
        &self.spec
    }

    pub fn combined_filter(&self) -> LayerMask {
        self.combined_filter
    }

    pub fn max_scan_radius(&self) -> f32 {
        self.max_scan_radius
    }

    /// Heading produced by the last perception pass.
    pub fn desired_heading(&self) -> Vec3 {
        self.desired_heading
    }

    pub fn steering(&self) -> &SteeringAccumulator {
        &self.steering
    }

    /// Perception pass: scan around `position`, classify neighbors and blend
    /// the four channels into a new desired heading.
    pub fn perceive<I>(&mut self, position: Vec3, index: &I, buffer: &mut ScanBuffer) -> Vec3
    where
        I: SpatialIndex + ?Sized,
    {
        self.perceive_dbg(position, index, buffer, None)
    }

    /// Variant of `perceive` that fills out an optional telemetry struct.
    pub fn perceive_dbg<I>(
        &mut self,
        position: Vec3,
        index: &I,
        buffer: &mut ScanBuffer,
        dbg: Option<&mut SteeringDebug>,
    ) -> Vec3
    where
        I: SpatialIndex + ?Sized,
    {
        self.steering.reset();
        let query = ScanQuery {
            origin: position,
            radius: self.max_scan_radius,
            filter: self.combined_filter,
            exclude: self.id,
        };
        for neighbor in scan(query, index, buffer) {
            self.steering.accumulate(&neighbor, &self.spec);
        }
        let vectors = self.steering.finalize(&self.spec);
        self.desired_heading = vectors.blend();

        if let Some(d) = dbg {
            d.hits = buffer.len();
            d.dropped = buffer.dropped();
            d.counts = BehaviorGroup::ALL.map(|g| self.steering.count(g));
            d.vectors = vectors;
            d.desired_heading = self.desired_heading;
        }
        self.desired_heading
    }

    /// Action pass: turn and throttle `pose` toward the last desired heading.
    pub fn act(&self, pose: &mut AgentPose, dt: f32) -> MotionOutput {
        integrate_motion(
            pose,
            self.desired_heading,
            self.spec.speed,
            self.spec.max_turn_rate_deg,
            dt,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerMask;
    use crate::math::Quat;
    use crate::spatial::SpatialEntry;
    use crate::species::sardine_spec;

    fn entry(id: u64, position: Vec3) -> SpatialEntry {
        SpatialEntry {
            id: AgentId(id),
            position,
            orientation: Quat::IDENTITY,
            layers: LayerMask::layer(crate::layers::FISH),
        }
    }

    #[test]
    fn new_rejects_invalid_spec() {
        let mut spec = sardine_spec();
        spec.alignment.weight = -0.5;
        assert!(FlockAgent::new(AgentId(1), spec).is_err());
    }

    #[test]
    fn reconfigure_recomputes_cache_and_keeps_old_spec_on_error() {
        let mut agent = FlockAgent::new(AgentId(1), FlockerSpec::default()).unwrap();
        assert_eq!(agent.combined_filter(), LayerMask::NONE);

        agent.reconfigure(sardine_spec()).unwrap();
        assert_eq!(agent.combined_filter(), sardine_spec().combined_filter());
        assert_eq!(agent.max_scan_radius(), 10.0);

        let mut bad = sardine_spec();
        bad.cohesion.radius = -3.0;
        assert!(agent.reconfigure(bad).is_err());
        assert_eq!(agent.spec(), &sardine_spec());
        assert_eq!(agent.max_scan_radius(), 10.0);
    }

    #[test]
    fn own_entry_never_counts() {
        let mut agent = FlockAgent::new(AgentId(1), sardine_spec()).unwrap();
        let index = vec![entry(1, Vec3::new(0.0, -5.0, 0.0))];
        let mut buffer = ScanBuffer::default();
        let mut dbg = SteeringDebug::default();
        let heading = agent.perceive_dbg(Vec3::new(0.0, -5.0, 0.0), &index, &mut buffer, Some(&mut dbg));
        assert_eq!(heading, Vec3::ZERO);
        assert_eq!(dbg.hits, 1);
        assert_eq!(dbg.counts, [0; 4]);
    }

    #[test]
    fn scratch_resets_each_tick() {
        let mut agent = FlockAgent::new(AgentId(1), sardine_spec()).unwrap();
        let origin = Vec3::new(0.0, -5.0, 0.0);
        let crowded = vec![entry(2, origin + Vec3::X)];
        let empty: Vec<SpatialEntry> = Vec::new();
        let mut buffer = ScanBuffer::default();

        assert_ne!(agent.perceive(origin, &crowded, &mut buffer), Vec3::ZERO);
        assert_eq!(agent.perceive(origin, &empty, &mut buffer), Vec3::ZERO);
        assert_eq!(agent.steering(), &SteeringAccumulator::default());
    }
}
