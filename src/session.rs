use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use crate::board::InvalidMapError;
use crate::engine::MazeGame;
use crate::ledger::ScoreLedger;
use crate::store::GameStore;
use crate::types::{GameInput, GameState};

#[derive(Debug, Error)]
pub enum StartError {
    #[error("channel {0} already has an active game")]
    ChannelBusy(u64),
    #[error(transparent)]
    InvalidMap(#[from] InvalidMapError),
}

/// Owns every live session, keyed by channel. Persistence is best-effort:
/// a failed save is logged and play continues in memory.
pub struct SessionManager {
    games: HashMap<u64, MazeGame>,
    store: GameStore,
    ledger: ScoreLedger,
}

impl SessionManager {
    pub fn new(store: GameStore, ledger: ScoreLedger) -> Self {
        Self {
            games: HashMap::new(),
            store,
            ledger,
        }
    }

    /// Restores previously saved sessions from disk.
    pub fn load(&mut self) {
        for game in self.store.load_all() {
            self.games.insert(game.channel_id, game);
        }
        tracing::info!(count = self.games.len(), "restored sessions");
    }

    pub fn start(
        &mut self,
        channel_id: u64,
        owner_id: u64,
        custom_map: Option<&str>,
        mobile_display: bool,
        seed: Option<u32>,
    ) -> Result<&MazeGame, StartError> {
        if self
            .games
            .get(&channel_id)
            .is_some_and(|game| game.state == GameState::Active)
        {
            return Err(StartError::ChannelBusy(channel_id));
        }

        let seed = seed.unwrap_or_else(rand::random);
        let game = MazeGame::new(channel_id, owner_id, custom_map, mobile_display, seed)?;
        if let Err(error) = self.store.save(&game) {
            tracing::warn!(channel_id, %error, "failed to persist new game");
        }
        tracing::info!(channel_id, owner_id, custom = game.custom, "game started");
        self.games.insert(channel_id, game);
        Ok(&self.games[&channel_id])
    }

    pub fn get(&self, channel_id: u64) -> Option<&MazeGame> {
        self.games.get(&channel_id)
    }

    /// Applies one input to the channel's session. The submitting identity
    /// is only recorded in the logs; anyone may play.
    pub fn handle_input(
        &mut self,
        channel_id: u64,
        input: GameInput,
        user_id: u64,
    ) -> Option<&MazeGame> {
        let game = self.games.get_mut(&channel_id)?;
        let advanced = game.input(input);
        tracing::debug!(channel_id, user_id, ?input, advanced, "input handled");
        if !advanced {
            return Some(&self.games[&channel_id]);
        }

        if game.state == GameState::Active {
            if let Err(error) = self.store.save(game) {
                tracing::warn!(channel_id, %error, "failed to persist game");
            }
        } else {
            match self.ledger.record(game) {
                Ok(true) => tracing::info!(channel_id, score = game.score, "score recorded"),
                Ok(false) => {}
                Err(error) => tracing::warn!(channel_id, %error, "failed to record score"),
            }
            if let Err(error) = self.store.delete(channel_id) {
                tracing::warn!(channel_id, %error, "failed to remove finished game file");
            }
        }
        Some(&self.games[&channel_id])
    }

    /// Ends a session without a result. The game stays in memory so the
    /// final frame can still be drawn; `remove` clears it for good.
    pub fn cancel(&mut self, channel_id: u64) -> bool {
        let Some(game) = self.games.get_mut(&channel_id) else {
            return false;
        };
        game.cancel();
        if let Err(error) = self.store.delete(channel_id) {
            tracing::warn!(channel_id, %error, "failed to remove cancelled game file");
        }
        tracing::info!(channel_id, "game cancelled");
        true
    }

    pub fn remove(&mut self, channel_id: u64) {
        self.games.remove(&channel_id);
        if let Err(error) = self.store.delete(channel_id) {
            tracing::warn!(channel_id, %error, "failed to remove game file");
        }
    }

    /// Drops finished sessions and any session idle past the expiry window.
    /// Returns how many were removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Utc::now();
        let stale: Vec<u64> = self
            .games
            .values()
            .filter(|game| game.state.is_terminal() || game.expired(now))
            .map(|game| game.channel_id)
            .collect();
        for &channel_id in &stale {
            tracing::info!(channel_id, "sweeping session");
            self.remove(channel_id);
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionManager, StartError};
    use crate::ledger::ScoreLedger;
    use crate::store::GameStore;
    use crate::types::{GameInput, GameState};
    use chrono::{Duration, Utc};
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique)
    }

    fn manager(dir: &PathBuf) -> SessionManager {
        SessionManager::new(
            GameStore::new(dir.join("games")),
            ScoreLedger::new(dir.join("scores.json")),
        )
    }

    #[test]
    fn starting_persists_and_busy_channels_are_rejected() {
        let dir = temp_dir("session-start");
        let mut sessions = manager(&dir);

        sessions
            .start(10, 1, None, false, Some(4))
            .expect("start game");
        assert!(dir.join("games").join("game_10.json").exists());

        let error = sessions.start(10, 2, None, false, Some(4)).unwrap_err();
        assert!(matches!(error, StartError::ChannelBusy(10)));

        // A second channel is fine.
        sessions
            .start(11, 2, None, false, Some(4))
            .expect("start second game");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn inputs_advance_and_persist() {
        let dir = temp_dir("session-input");
        let mut sessions = manager(&dir);
        sessions
            .start(10, 1, None, false, Some(4))
            .expect("start game");

        let game = sessions
            .handle_input(10, GameInput::Left, 99)
            .expect("game exists");
        assert!(game.time > 0);

        // Restarting from disk resumes the same session.
        let mut restored = manager(&dir);
        restored.load();
        let loaded = restored.get(10).expect("restored game");
        assert_eq!(loaded.time, sessions.get(10).expect("game").time);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn natural_end_records_a_score_and_drops_the_file() {
        let dir = temp_dir("session-finish");
        let mut sessions = manager(&dir);
        sessions
            .start(10, 1, Some("####\n#O·#\n####"), false, Some(4))
            .expect("start game");

        // Stock-map scoring only; flip the custom flag to exercise the
        // ledger path with a one-pellet board.
        sessions.games.get_mut(&10).expect("game").custom = false;

        let game = sessions
            .handle_input(10, GameInput::Right, 1)
            .expect("game exists");
        assert_eq!(game.state, GameState::Win);
        assert!(!dir.join("games").join("game_10.json").exists());

        let ledger = ScoreLedger::new(dir.join("scores.json"));
        let records = ledger.load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 10);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn cancelling_keeps_the_game_for_a_final_frame() {
        let dir = temp_dir("session-cancel");
        let mut sessions = manager(&dir);
        sessions
            .start(10, 1, None, false, Some(4))
            .expect("start game");

        assert!(sessions.cancel(10));
        let game = sessions.get(10).expect("still in memory");
        assert_eq!(game.state, GameState::Cancelled);
        assert!(!dir.join("games").join("game_10.json").exists());

        // No score for a cancelled game.
        assert!(ScoreLedger::new(dir.join("scores.json")).load().is_empty());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn sweep_removes_finished_and_idle_sessions() {
        let dir = temp_dir("session-sweep");
        let mut sessions = manager(&dir);
        sessions
            .start(10, 1, None, false, Some(4))
            .expect("start game");
        sessions
            .start(11, 1, None, false, Some(4))
            .expect("start game");
        sessions
            .start(12, 1, None, false, Some(4))
            .expect("start game");

        sessions.cancel(10);
        sessions.games.get_mut(&11).expect("game").last_played =
            Utc::now() - Duration::days(8);

        assert_eq!(sessions.sweep_expired(), 2);
        assert!(sessions.get(10).is_none());
        assert!(sessions.get(11).is_none());
        assert!(sessions.get(12).is_some());

        let _ = fs::remove_dir_all(dir);
    }
}
