use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use bevy::prelude::*;
use tracing::{info, warn};

use crate::config::load_config;
use crate::sim::SpeciesTable;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Watches the config file and refreshes [`SpeciesTable`] when it changes.
#[derive(Resource, Debug)]
pub struct ConfigWatch {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    timer: Timer,
}

impl ConfigWatch {
    pub fn new(path: PathBuf) -> Self {
        let last_modified = modified(&path);
        Self {
            path,
            last_modified,
            timer: Timer::new(POLL_INTERVAL, TimerMode::Repeating),
        }
    }

    /// True once per observed change to the file's mtime.
    fn changed(&mut self) -> bool {
        let now = modified(&self.path);
        if now.is_some() && now != self.last_modified {
            self.last_modified = now;
            true
        } else {
            false
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

pub fn poll_config_file(
    time: Res<Time<Real>>,
    watch: Option<ResMut<ConfigWatch>>,
    mut table: ResMut<SpeciesTable>,
) {
    let Some(mut watch) = watch else {
        return;
    };
    if !watch.timer.tick(time.delta()).just_finished() || !watch.changed() {
        return;
    }
    let refreshed = load_config(&watch.path).and_then(|cfg| table.refreshed(&cfg));
    match refreshed {
        Ok(next) => {
            if *table != next {
                info!(path = %watch.path.display(), "Species tunables reloaded");
                *table = next;
            }
        }
        Err(err) => {
            warn!(
                path = %watch.path.display(),
                error = %format!("{err:#}"),
                "Config reload rejected, keeping current tunables"
            );
        }
    }
}
