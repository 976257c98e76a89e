use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bevy::prelude::*;
use flocking::MotionMode;
use protocol::{write_record, AgentSnapshot, Frame, ProtocolError, Record, RecordingHeader};
use tracing::{error, info};

use crate::config::Config;
use crate::sim::{Agent, Body, Motion, SimClock, Species};

/// Appends length-prefixed snapshot records to a file.
#[derive(Resource)]
pub struct Recorder {
    path: PathBuf,
    writer: BufWriter<File>,
    frames: u64,
}

impl Recorder {
    /// Create `path` and write the run header.
    pub fn create(path: &Path, cfg: &Config, species: Vec<String>) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let header = RecordingHeader::new(cfg.tick_hz, cfg.seed, species);
        write_record(&mut writer, &Record::Header(header.clone()))
            .with_context(|| format!("writing header to {}", path.display()))?;
        info!(path = %path.display(), run_id = %header.run_id, "Recording started");
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn write_frame(&mut self, frame: Frame) -> Result<(), ProtocolError> {
        write_record(&mut self.writer, &Record::Frame(frame))?;
        self.frames += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

pub fn snapshot(agent: &Agent, body: &Body, species: Species, motion: &Motion) -> AgentSnapshot {
    let pose = &body.0;
    AgentSnapshot {
        id: agent.0.id().0,
        species: species.0,
        position: pose.position.to_array(),
        orientation: pose.orientation.to_array(),
        velocity: pose.velocity.to_array(),
        surfaced: motion.mode == MotionMode::Surfaced,
    }
}

pub fn record_frames(
    mut commands: Commands,
    cfg: Res<Config>,
    clock: Res<SimClock>,
    recorder: Option<ResMut<Recorder>>,
    q: Query<(&Agent, &Body, &Species, &Motion)>,
) {
    let Some(mut recorder) = recorder else {
        return;
    };
    if clock.tick % cfg.record_every != 0 {
        return;
    }
    let mut agents: Vec<AgentSnapshot> = q
        .iter()
        .map(|(agent, body, species, motion)| snapshot(agent, body, *species, motion))
        .collect();
    agents.sort_unstable_by_key(|a| a.id);
    let frame = Frame {
        tick: clock.tick,
        time: clock.elapsed as f32,
        agents,
    };
    if let Err(err) = recorder.write_frame(frame) {
        error!(path = %recorder.path().display(), %err, "Recording failed, stopping it");
        commands.remove_resource::<Recorder>();
    }
}
