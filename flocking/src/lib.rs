//! Fish-flock steering core.
//!
//! This crate intentionally avoids any ECS or engine types. Agents read the
//! world through the [`SpatialIndex`] port and write their own [`AgentPose`];
//! whatever owns the bodies (a physics engine, or [`step_body`]) moves them.
//!
//! Per tick, run [`FlockAgent::perceive`] for every agent first, then
//! [`FlockAgent::act`] for every agent, then advance the bodies.

pub mod math;
pub use math::{Quat, Vec3};

pub mod layers;
pub use layers::LayerMask;

mod spec;
pub use spec::{BehaviorGroup, BehaviorSpec, ConfigError, FlockerSpec};

pub mod species;

mod spatial;
pub use spatial::{AgentId, ScanBuffer, SpatialEntry, SpatialHash, SpatialIndex, DEFAULT_SCAN_CAPACITY};

pub mod scan;
pub use scan::{scan, Neighbor, ScanQuery};

pub mod steering;
pub use steering::{blend, SteeringAccumulator, SteeringVectors};

mod motion;
pub use motion::{integrate_motion, AgentPose, MotionMode, MotionOutput, SURFACE_LEVEL};

mod agent;
pub use agent::{FlockAgent, SteeringDebug};

mod body;
pub use body::{step_body, BodySpec};

mod populate;
pub use populate::{populate, SpawnBounds};
