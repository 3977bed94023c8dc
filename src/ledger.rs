use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::engine::MazeGame;
use crate::store::StoreError;
use crate::types::{GameState, ScoreRecord};

/// Append-only JSON array of finished scores. Only games that end naturally
/// on the stock maze are eligible; custom maps and cancellations never
/// produce a record.
pub struct ScoreLedger {
    path: PathBuf,
}

impl ScoreLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Appends a record for the given game if it qualifies. Returns whether
    /// a record was written.
    pub fn record(&self, game: &MazeGame) -> Result<bool, StoreError> {
        if game.custom || !matches!(game.state, GameState::Win | GameState::Lose) {
            return Ok(false);
        }

        let mut records = load_records(&self.path);
        records.push(ScoreRecord {
            score: game.score,
            state: game.state,
            turns: game.time,
            channel_id: game.channel_id,
            owner_id: game.owner_id,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&records)?;
        fs::write(&self.path, text)?;
        Ok(true)
    }

    pub fn load(&self) -> Vec<ScoreRecord> {
        load_records(&self.path)
    }
}

fn load_records(path: &Path) -> Vec<ScoreRecord> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %error, "failed to read score ledger");
            }
            return Vec::new();
        }
    };
    match serde_json::from_str(&text) {
        Ok(records) => records,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "score ledger is unreadable, starting fresh");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScoreLedger;
    use crate::engine::MazeGame;
    use crate::types::{GameInput, GameState};
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique).join("scores.json")
    }

    fn won_game(map: &str) -> MazeGame {
        let mut game = MazeGame::new(3, 9, Some(map), false, 1).expect("valid map");
        game.custom = false;
        game.input(GameInput::Right);
        assert_eq!(game.state, GameState::Win);
        game
    }

    #[test]
    fn natural_ends_append_records() {
        let path = temp_path("score-ledger-append");
        let ledger = ScoreLedger::new(path.clone());

        let game = won_game("####\n#O·#\n####");
        assert!(ledger.record(&game).expect("record win"));
        assert!(ledger.record(&game).expect("record again"));

        let records = ledger.load();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].score, 10);
        assert_eq!(records[0].state, GameState::Win);
        assert_eq!(records[0].channel_id, 3);
        assert_eq!(records[0].owner_id, 9);

        let _ = fs::remove_dir_all(path.parent().expect("parent exists"));
    }

    #[test]
    fn custom_games_are_ignored() {
        let path = temp_path("score-ledger-custom");
        let ledger = ScoreLedger::new(path.clone());

        let mut game = MazeGame::new(3, 9, Some("####\n#O·#\n####"), false, 1)
            .expect("valid map");
        game.input(GameInput::Right);
        assert_eq!(game.state, GameState::Win);
        assert!(!ledger.record(&game).expect("no record"));
        assert!(ledger.load().is_empty());

        let _ = fs::remove_dir_all(path.parent().expect("parent exists"));
    }

    #[test]
    fn cancellations_are_ignored() {
        let path = temp_path("score-ledger-cancelled");
        let ledger = ScoreLedger::new(path.clone());

        let mut game = MazeGame::new(3, 9, None, false, 1).expect("stock map");
        game.cancel();
        assert!(!ledger.record(&game).expect("no record"));
        assert!(ledger.load().is_empty());

        let _ = fs::remove_dir_all(path.parent().expect("parent exists"));
    }

    #[test]
    fn unreadable_ledger_starts_fresh() {
        let path = temp_path("score-ledger-corrupt");
        fs::create_dir_all(path.parent().expect("parent exists")).expect("create dir");
        fs::write(&path, "[{broken").expect("write junk");

        let ledger = ScoreLedger::new(path.clone());
        assert!(ledger.load().is_empty());

        let game = won_game("####\n#O·#\n####");
        assert!(ledger.record(&game).expect("record win"));
        assert_eq!(ledger.load().len(), 1);

        let _ = fs::remove_dir_all(path.parent().expect("parent exists"));
    }
}
