use clap::Parser;
use maze_chase::engine::MazeGame;
use maze_chase::render;
use maze_chase::types::{GameInput, GameState};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a scripted maze-chase game and report the outcome")]
struct Cli {
    /// Path to a custom map file; the stock maze is used when omitted.
    #[arg(long)]
    map: Option<PathBuf>,
    /// Comma-separated input script, e.g. "left,left,up,fast,right".
    #[arg(long, default_value = "left,up,right,down,wait")]
    inputs: String,
    /// Repeat the script up to this many times or until the game ends.
    #[arg(long, default_value_t = 1)]
    loops: u32,
    #[arg(long)]
    seed: Option<u32>,
    /// Render with the compact mobile layout.
    #[arg(long)]
    mobile: bool,
    /// Print a frame after every input.
    #[arg(long)]
    frames: bool,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    seed: u32,
    state: GameState,
    score: u32,
    time: u32,
    #[serde(rename = "pelletsLeft")]
    pellets_left: u32,
    #[serde(rename = "maxPellets")]
    max_pellets: u32,
    #[serde(rename = "inputsApplied")]
    inputs_applied: usize,
    anomalies: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let script = match parse_script(&cli.inputs) {
        Ok(script) => script,
        Err(token) => {
            tracing::error!(token = %token, "unrecognized input in script");
            return ExitCode::from(2);
        }
    };

    let map_text = match cli.map.as_ref() {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(error) => {
                tracing::error!(path = %path.display(), %error, "failed to read map file");
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    let seed = cli.seed.unwrap_or_else(time_seed);
    let mut game = match MazeGame::new(0, 0, map_text.as_deref(), cli.mobile, seed) {
        Ok(game) => game,
        Err(error) => {
            tracing::error!(%error, "invalid map");
            return ExitCode::from(2);
        }
    };

    let mut anomalies = Vec::new();
    let mut inputs_applied = 0;
    'outer: for _ in 0..cli.loops.max(1) {
        for input in &script {
            if game.state != GameState::Active {
                break 'outer;
            }
            let before = game.time;
            game.input(*input);
            inputs_applied += 1;
            check_invariants(&game, before, &mut anomalies);
            if cli.frames {
                println!("{}", render::render(&game, false));
            }
        }
    }

    let summary = RunSummary {
        seed,
        state: game.state,
        score: game.score,
        time: game.time,
        pellets_left: game.pellets(),
        max_pellets: game.max_pellets(),
        inputs_applied,
        anomalies: anomalies.clone(),
    };
    match serde_json::to_string(&summary) {
        Ok(line) => println!("{line}"),
        Err(error) => {
            tracing::error!(%error, "failed to serialize run summary");
            return ExitCode::from(2);
        }
    }

    if anomalies.is_empty() {
        ExitCode::SUCCESS
    } else {
        for anomaly in &anomalies {
            tracing::warn!(anomaly = %anomaly, "invariant violated during run");
        }
        ExitCode::FAILURE
    }
}

fn parse_script(script: &str) -> Result<Vec<GameInput>, String> {
    script
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| GameInput::parse(token).ok_or_else(|| token.to_string()))
        .collect()
}

fn check_invariants(game: &MazeGame, time_before: u32, anomalies: &mut Vec<String>) {
    if game.time < time_before {
        push_unique(anomalies, format!("time moved backwards: {}", game.time));
    }
    if game.time > time_before + 20 {
        push_unique(
            anomalies,
            format!("burst exceeded the cap: {} ticks", game.time - time_before),
        );
    }
    if game.pellets() > game.max_pellets() {
        push_unique(
            anomalies,
            format!("pellet count out of range: {}", game.pellets()),
        );
    }
}

fn push_unique(anomalies: &mut Vec<String>, message: String) {
    if !anomalies.contains(&message) {
        anomalies.push(message);
    }
}

fn time_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u32
}

#[cfg(test)]
mod tests {
    use super::{check_invariants, parse_script};
    use maze_chase::engine::MazeGame;
    use maze_chase::types::{GameInput, GameState};

    #[test]
    fn scripts_parse_with_whitespace_and_trailing_commas() {
        let script = parse_script("left, up ,right,,fast").expect("valid script");
        assert_eq!(
            script,
            vec![
                GameInput::Left,
                GameInput::Up,
                GameInput::Right,
                GameInput::Fast
            ]
        );
        assert_eq!(parse_script("left,warp").unwrap_err(), "warp");
    }

    #[test]
    fn clean_runs_report_no_anomalies() {
        let mut game = MazeGame::new(0, 0, None, false, 9).expect("stock map");
        let mut anomalies = Vec::new();
        let script = [GameInput::Left, GameInput::Up, GameInput::Right];
        for input in script.iter().cycle().take(30) {
            if game.state != GameState::Active {
                break;
            }
            let before = game.time;
            game.input(*input);
            check_invariants(&game, before, &mut anomalies);
        }
        assert!(anomalies.is_empty(), "unexpected anomalies: {anomalies:?}");
    }
}
