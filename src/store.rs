use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::engine::MazeGame;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Disk-backed snapshots of active sessions, one JSON file per channel.
/// Files are rewritten whole after every advanced input and removed when the
/// session leaves the active state.
pub struct GameStore {
    dir: PathBuf,
}

impl GameStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, channel_id: u64) -> PathBuf {
        self.dir.join(format!("game_{channel_id}.json"))
    }

    pub fn save(&self, game: &MazeGame) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let text = serde_json::to_string_pretty(game)?;
        fs::write(self.path_for(game.channel_id), text)?;
        Ok(())
    }

    pub fn delete(&self, channel_id: u64) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(channel_id)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    /// Loads every stored session, skipping unreadable files with a warning
    /// so one corrupt snapshot never blocks startup.
    pub fn load_all(&self) -> Vec<MazeGame> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(dir = %self.dir.display(), %error, "failed to read store dir");
                }
                return Vec::new();
            }
        };

        let mut games = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !is_game_file(&path) {
                continue;
            }
            match load_one(&path) {
                Ok(game) => games.push(game),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable game file");
                }
            }
        }
        games
    }
}

fn is_game_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("game_"))
}

fn load_one(path: &Path) -> Result<MazeGame, StoreError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
