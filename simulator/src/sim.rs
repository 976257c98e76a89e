use anyhow::{Context, Result};
use bevy::prelude::*;
use bevy::tasks::ComputeTaskPool;
use flocking::{
    populate, AgentId, AgentPose, FlockAgent, FlockerSpec, LayerMask, MotionMode, ScanBuffer,
    SpatialEntry, SpatialHash, SteeringDebug,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::{recorder, reload};

/// Agents handed to one perception task at minimum.
const MIN_SCAN_CHUNK: usize = 64;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    Index,
    Perceive,
    Act,
    Physics,
    Report,
}

#[derive(Component, Debug, Clone)]
pub struct Agent(pub FlockAgent);

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Body(pub AgentPose);

/// Index into [`SpeciesTable`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Species(pub u16);

#[derive(Component, Debug, Clone, Copy)]
pub struct Layers(pub LayerMask);

/// Last integrator decision, read by the body step.
#[derive(Component, Debug, Clone, Copy)]
pub struct Motion {
    pub mode: MotionMode,
    pub use_gravity: bool,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            mode: MotionMode::Submerged,
            use_gravity: false,
        }
    }
}

/// Species names and their live tunables. Changing this resource
/// reconfigures every agent of the affected species.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SpeciesTable {
    names: Vec<String>,
    specs: Vec<FlockerSpec>,
}

impl SpeciesTable {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let (names, specs) = cfg.resolve_species()?.into_iter().unzip();
        Ok(Self { names, specs })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.names.iter().position(|n| n == name).map(|i| i as u16)
    }

    pub fn spec(&self, species: Species) -> Option<&FlockerSpec> {
        self.specs.get(usize::from(species.0))
    }

    /// Table with the tunables `cfg` now gives for the same species.
    /// Species added by `cfg` are ignored; nothing would spawn them.
    pub fn refreshed(&self, cfg: &Config) -> Result<Self> {
        let specs = self
            .names
            .iter()
            .map(|name| {
                let spec = cfg
                    .species_spec(name)
                    .with_context(|| format!("species `{name}` no longer defined"))?;
                spec.validate().with_context(|| format!("species `{name}`"))?;
                Ok(spec)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            names: self.names.clone(),
            specs,
        })
    }

    pub fn set_spec(&mut self, species: Species, spec: FlockerSpec) {
        if let Some(slot) = self.specs.get_mut(usize::from(species.0)) {
            *slot = spec;
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct NeighborIndex(pub SpatialHash);

impl Default for NeighborIndex {
    fn default() -> Self {
        Self(SpatialHash::new(10.0))
    }
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock {
    pub tick: u64,
    pub elapsed: f64,
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ScanStats {
    /// Hits returned by the index last tick, self included.
    pub hits: usize,
    /// Hits lost to full scan buffers last tick.
    pub dropped: usize,
    pub total_dropped: u64,
}

pub struct SimPlugin;

impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NeighborIndex>()
            .init_resource::<SimClock>()
            .init_resource::<ScanStats>()
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Index,
                    SimSet::Perceive,
                    SimSet::Act,
                    SimSet::Physics,
                    SimSet::Report,
                )
                    .chain(),
            )
            .add_systems(Startup, (size_index, spawn_schools).chain())
            .add_systems(
                FixedUpdate,
                (
                    rebuild_index.in_set(SimSet::Index),
                    perceive.in_set(SimSet::Perceive),
                    act.in_set(SimSet::Act),
                    (integrate_bodies, advance_clock).chain().in_set(SimSet::Physics),
                    (log_summary, recorder::record_frames, stop_at_tick_budget)
                        .chain()
                        .in_set(SimSet::Report),
                ),
            )
            .add_systems(
                Update,
                (reload::poll_config_file, apply_species_changes).chain(),
            );
    }
}

fn size_index(cfg: Res<Config>, mut index: ResMut<NeighborIndex>) {
    index.0 = SpatialHash::new(cfg.cell_size);
}

pub fn spawn_schools(mut commands: Commands, cfg: Res<Config>, table: Res<SpeciesTable>) {
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let mut next_id = 0u64;
    for school in &cfg.schools {
        let Some(species) = table.index_of(&school.species).map(Species) else {
            warn!(species = %school.species, "School species missing from table, skipping");
            continue;
        };
        let Some(spec) = table.spec(species) else {
            continue;
        };
        let layers = LayerMask::layer(school.layer);
        for pose in populate(&school.bounds, school.count, &mut rng) {
            let id = AgentId(next_id);
            next_id += 1;
            match FlockAgent::new(id, spec.clone()) {
                Ok(agent) => {
                    commands.spawn((
                        Agent(agent),
                        Body(pose),
                        species,
                        Layers(layers),
                        Motion::default(),
                    ));
                }
                Err(err) => warn!(?id, %err, "Rejected agent spec"),
            }
        }
        info!(
            species = %school.species,
            count = school.count,
            layer = school.layer,
            "Spawned school"
        );
    }
}

pub fn rebuild_index(mut index: ResMut<NeighborIndex>, q: Query<(&Agent, &Body, &Layers)>) {
    index.0.rebuild(q.iter().map(|(agent, body, layers)| SpatialEntry {
        id: agent.0.id(),
        position: body.0.position,
        orientation: body.0.orientation,
        layers: layers.0,
    }));
}

/// Scan phase. Reads only the index snapshot, so agents are split across the
/// compute pool and each task owns its scan buffer.
pub fn perceive(
    cfg: Res<Config>,
    index: Res<NeighborIndex>,
    mut stats: ResMut<ScanStats>,
    mut q: Query<(&Body, &mut Agent)>,
) {
    let mut work: Vec<_> = q
        .iter_mut()
        .map(|(body, agent)| (body.0.position, agent))
        .collect();
    if work.is_empty() {
        return;
    }

    let pool = ComputeTaskPool::get();
    let chunk_size = work.len().div_ceil(pool.thread_num().max(1)).max(MIN_SCAN_CHUNK);
    let capacity = cfg.scan_capacity;
    let index = &index.0;
    let per_task = pool.scope(|scope| {
        for chunk in work.chunks_mut(chunk_size) {
            scope.spawn(async move {
                let mut buffer = ScanBuffer::with_capacity(capacity);
                let mut dbg = SteeringDebug::default();
                let (mut hits, mut dropped) = (0usize, 0usize);
                for (position, agent) in chunk.iter_mut() {
                    agent.0.perceive_dbg(*position, index, &mut buffer, Some(&mut dbg));
                    hits += dbg.hits;
                    dropped += dbg.dropped;
                }
                (hits, dropped)
            });
        }
    });

    let (hits, dropped) = per_task
        .into_iter()
        .fold((0, 0), |(h, d), (th, td)| (h + th, d + td));
    if dropped > 0 {
        debug!(dropped, capacity, "Scan buffers overflowed");
    }
    stats.hits = hits;
    stats.dropped = dropped;
    stats.total_dropped += dropped as u64;
}

pub fn act(time: Res<Time>, mut q: Query<(&Agent, &mut Body, &mut Motion)>) {
    let dt = time.delta_secs();
    q.par_iter_mut().for_each(|(agent, mut body, mut motion)| {
        let out = agent.0.act(&mut body.0, dt);
        motion.mode = out.mode;
        motion.use_gravity = out.use_gravity;
    });
}

pub fn integrate_bodies(time: Res<Time>, cfg: Res<Config>, mut q: Query<(&mut Body, &Motion)>) {
    let dt = time.delta_secs();
    let spec = cfg.body;
    q.par_iter_mut().for_each(|(mut body, motion)| {
        flocking::step_body(&mut body.0, &spec, motion.use_gravity, dt);
    });
}

fn advance_clock(time: Res<Time>, mut clock: ResMut<SimClock>) {
    clock.tick += 1;
    clock.elapsed += time.delta_secs_f64();
}

fn log_summary(
    cfg: Res<Config>,
    clock: Res<SimClock>,
    stats: Res<ScanStats>,
    q: Query<(&Body, &Motion)>,
) {
    if cfg.summary_every == 0 || clock.tick % cfg.summary_every != 0 {
        return;
    }
    let (mut agents, mut surfaced, mut speed) = (0usize, 0usize, 0.0f32);
    for (body, motion) in &q {
        agents += 1;
        speed += body.0.velocity.length();
        if motion.mode == MotionMode::Surfaced {
            surfaced += 1;
        }
    }
    let mean_speed = if agents > 0 { speed / agents as f32 } else { 0.0 };
    info!(
        tick = clock.tick,
        agents,
        surfaced,
        mean_speed,
        hits = stats.hits,
        dropped_total = stats.total_dropped,
        "Flock summary"
    );
}

fn stop_at_tick_budget(
    cfg: Res<Config>,
    clock: Res<SimClock>,
    recorder: Option<ResMut<recorder::Recorder>>,
    mut exit: EventWriter<AppExit>,
    mut done: Local<bool>,
) {
    if *done || cfg.max_ticks == 0 || clock.tick < cfg.max_ticks {
        return;
    }
    *done = true;
    if let Some(mut recorder) = recorder {
        if let Err(err) = recorder.flush() {
            warn!(%err, "Failed to flush recording");
        }
    }
    info!(tick = clock.tick, elapsed = clock.elapsed, "Tick budget reached");
    exit.write(AppExit::Success);
}

/// Push changed tunables into every agent of the affected species.
pub fn apply_species_changes(table: Res<SpeciesTable>, mut q: Query<(&Species, &mut Agent)>) {
    if !table.is_changed() || table.is_added() {
        return;
    }
    let mut updated = 0usize;
    for (species, mut agent) in &mut q {
        let Some(spec) = table.spec(*species) else {
            continue;
        };
        if agent.0.spec() == spec {
            continue;
        }
        match agent.0.reconfigure(spec.clone()) {
            Ok(()) => updated += 1,
            Err(err) => warn!(id = ?agent.0.id(), %err, "Keeping previous tunables"),
        }
    }
    if updated > 0 {
        info!(updated, "Applied new species tunables");
    }
}
