use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};

use crate::board::Tile;
use crate::constants::{
    CHAR_GHOST_FRIGHTENED, CHAR_PELLET, CHAR_PLAYER, CHAR_PLAYER_DEAD, CHAR_POWER_PELLET,
    GHOST_APPEARANCE,
};
use crate::engine::MazeGame;
use crate::types::{Dir, GameInput, GameState, GhostMode, Pos};

/// Full-screen overlay shown instead of the maze after a help input.
pub const HELP_TEXT: &str = "\
```
< Maze Chase Help >

Direction inputs move the player one tile, or keep it moving
while fast-forward is active. Other inputs:

  wait - pass a turn without moving
  fast - toggle fast-forward
  help - show this screen; any input closes it

Eat every pellet to win. Power pellets turn the ghosts
vulnerable for a short while; eating one of them then scores
200, 400, 800... until the power runs out. Don't touch them
otherwise.
```";

/// Draws one frame of the game as monospace text. Any panic inside the
/// drawing code is caught and turned into a plain fallback frame so a bad
/// state never takes the caller down with it.
pub fn render(game: &MazeGame, show_help: bool) -> String {
    match catch_unwind(AssertUnwindSafe(|| render_inner(game, show_help))) {
        Ok(text) => text,
        Err(_) => {
            tracing::error!(channel_id = game.channel_id, "failed to render game frame");
            format!(
                "```\nThere was an error drawing the game frame.\nTime: {} / Score: {}\n```",
                game.time, game.score
            )
        }
    }
}

fn render_inner(game: &MazeGame, show_help: bool) -> String {
    if game.last_input == GameInput::Help {
        return HELP_TEXT.to_string();
    }
    let mobile = game.mobile_display;

    // Tile pass: soft walls draw as their walkable face, and the mobile
    // variant swaps the exotic glyphs for ASCII.
    let mut grid: Vec<Vec<char>> = game
        .board
        .rows()
        .map(|row| {
            row.iter()
                .map(|tile| {
                    let glyph = match tile {
                        Tile::SoftWall => ' ',
                        Tile::SoftWallPellet => CHAR_PELLET,
                        other => other.glyph(),
                    };
                    if mobile {
                        match tile {
                            Tile::Wall(_) => '#',
                            _ if glyph == CHAR_PELLET => '.',
                            _ if glyph == CHAR_POWER_PELLET => 'o',
                            _ => glyph,
                        }
                    } else {
                        glyph
                    }
                })
                .collect()
        })
        .collect();

    let put = |grid: &mut Vec<Vec<char>>, pos: Pos, glyph: char| {
        let p = game.board.wrap(pos);
        grid[p.y as usize][p.x as usize] = glyph;
    };

    if game.fruit_timer > 0 {
        if let Some(spawn) = game.fruit_spawn {
            put(&mut grid, spawn, game.fruit_glyph());
            put(&mut grid, spawn + Dir::Right, game.fruit_glyph());
        }
    }
    for ghost in &game.ghosts {
        let glyph = if ghost.mode == GhostMode::Frightened {
            CHAR_GHOST_FRIGHTENED
        } else {
            GHOST_APPEARANCE[ghost.kind.index()]
        };
        put(&mut grid, ghost.pos, glyph);
    }
    // The player draws last so it stays visible on a collision tile.
    let player_glyph = if game.state == GameState::Lose {
        CHAR_PLAYER_DEAD
    } else {
        CHAR_PLAYER
    };
    put(&mut grid, game.pac_man.pos, player_glyph);

    let lines = assemble(game, grid, mobile);

    let mut out = String::new();
    match game.state {
        GameState::Active => {
            // The hash-prefixed stat lines pick up css string highlighting.
            out.push_str(if mobile { "```\n" } else { "```css\n" });
            out.push_str(&lines.join("\n"));
            out.push('\n');
            let fast = if game.fast_forward { "Active" } else { "Disabled" };
            out.push_str(&format!("#Fastforward: {fast}\n"));
            out.push_str("```");
        }
        state => {
            let prefix = match state {
                GameState::Win => "+",
                GameState::Cancelled => "*** ",
                _ => "-",
            };
            out.push_str("```diff\n");
            for line in &lines {
                out.push_str(prefix);
                out.push_str(line);
                out.push('\n');
            }
            out.push_str("```");
        }
    }

    if game.state.is_terminal() || game.custom {
        out.push_str("\n```diff");
        match game.state {
            GameState::Win => out.push_str("\n+You won!"),
            GameState::Lose => out.push_str("\n-You lost!"),
            GameState::Cancelled => out.push_str("\n-Game has been ended."),
            GameState::Active => {}
        }
        if game.custom {
            out.push_str("\n*** Custom game: Score won't be registered. ***");
        }
        out.push_str("\n```");
    }

    if show_help && game.state == GameState::Active && game.time < 5 {
        out.push_str("\n(Confused? Send the help input to see the controls)");
    }

    out
}

/// Merges the grid rows with the sidebar. The sidebar rides alongside the
/// maze on desktop and sits above it on mobile.
fn assemble(game: &MazeGame, grid: Vec<Vec<char>>, mobile: bool) -> Vec<String> {
    let hash = if mobile { "" } else { "#" };
    let delta = game.score as i64 - game.old_score as i64;
    let delta_text = if delta != 0 {
        format!(" +{delta}")
    } else {
        String::new()
    };
    let power_line = if game.pac_man.power > 0 {
        format!("│ {hash}Power: {}", game.pac_man.power)
    } else {
        "│ ".to_string()
    };
    let fruit_line = if game.fruit_timer > 0 {
        let f = game.fruit_glyph();
        format!("│ {f}{f} - Fruit: {}", game.fruit_timer)
    } else {
        "│ ".to_string()
    };

    let mut info: Vec<String> = vec![
        format!("┌{}", if mobile { "───< Mobile Mode >───┐" } else { "" }),
        format!("│ {hash}Time: {}", game.time),
        format!("│ {hash}Score: {}{delta_text}", game.score),
        power_line,
        "│ ".to_string(),
        format!("│ {CHAR_PLAYER} - Pac-Man{}", dir_suffix(game.pac_man.dir)),
        "│ ".to_string(),
        "│ ".to_string(),
        "│ ".to_string(),
        "│ ".to_string(),
        "│ ".to_string(),
        "│ ".to_string(),
        fruit_line,
        "└".to_string(),
    ];
    for (i, ghost) in game.ghosts.iter().enumerate() {
        info[7 + i] = format!(
            "│ {} - {}{}",
            GHOST_APPEARANCE[ghost.kind.index()],
            ghost.kind.name(),
            dir_suffix(ghost.dir)
        );
    }

    let mut lines: Vec<String> = grid
        .into_iter()
        .map(|row| row.into_iter().collect())
        .collect();
    if mobile {
        let mut all = info;
        all.push(String::new());
        all.append(&mut lines);
        all
    } else {
        for (i, extra) in info.iter().enumerate() {
            if i < lines.len() {
                lines[i].push(' ');
                lines[i].push_str(extra);
            }
        }
        lines
    }
}

fn dir_suffix(dir: Dir) -> String {
    if dir == Dir::None {
        String::new()
    } else {
        format!(": {}", dir.label())
    }
}

/// Short notice shown when a session ends without a natural result.
pub fn cancelled_notice(game: &MazeGame, now: DateTime<Utc>) -> String {
    if game.expired(now) {
        "The game timed out after a week of inactivity.".to_string()
    } else {
        "The game has been cancelled.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{cancelled_notice, render, HELP_TEXT};
    use crate::engine::MazeGame;
    use crate::types::{GameInput, GameState, GhostMode};
    use chrono::{Duration, Utc};

    fn stock_game(mobile: bool) -> MazeGame {
        MazeGame::new(1, 2, None, mobile, 5).expect("stock map")
    }

    #[test]
    fn desktop_frame_uses_css_fence_and_sidebar() {
        let mut game = stock_game(false);
        game.input(GameInput::Left);

        let frame = render(&game, false);
        assert!(frame.starts_with("```css\n"));
        assert!(frame.contains("#Time: "));
        assert!(frame.contains("#Score: "));
        assert!(frame.contains("O - Pac-Man: left"));
        assert!(frame.contains("B - Blinky"));
        assert!(frame.contains("#Fastforward: Active"));
        assert!(frame.ends_with("```"));
    }

    #[test]
    fn score_delta_from_the_last_burst_is_shown() {
        let mut game = MazeGame::new(1, 2, Some("#####\n#O··#\n#####"), false, 5)
            .expect("valid map");
        game.fast_forward = false;
        game.input(GameInput::Right);
        assert!(render(&game, false).contains("#Score: 10 +10"));
    }

    #[test]
    fn mobile_frame_moves_the_sidebar_on_top_and_flattens_glyphs() {
        let game = stock_game(true);
        let frame = render(&game, false);
        assert!(frame.starts_with("```\n"));
        assert!(frame.contains("< Mobile Mode >"));
        assert!(frame.contains('.'));
        assert!(frame.contains('o'));
        assert!(!frame.contains('·'));
        // Sidebar comes before the first maze row.
        let sidebar = frame.find("Mobile Mode").expect("sidebar present");
        let maze = frame.find('#').expect("walls present");
        assert!(sidebar < maze);
    }

    #[test]
    fn losing_frame_is_a_diff_block_with_a_dead_player() {
        let mut game = MazeGame::new(1, 2, Some("#####\n#O G#\n#####"), false, 5)
            .expect("valid map");
        game.input(GameInput::Right);
        assert_eq!(game.state, GameState::Lose);

        let frame = render(&game, false);
        assert!(frame.starts_with("```diff\n"));
        assert!(frame.contains('X'));
        assert!(frame.contains("-You lost!"));
        for line in frame.lines().skip(1) {
            if line == "```" || line == "```diff" {
                continue;
            }
            assert!(line.starts_with('-'), "unprefixed line: {line:?}");
        }
    }

    #[test]
    fn winning_frame_celebrates() {
        let mut game =
            MazeGame::new(1, 2, Some("####\n#O·#\n####"), false, 5).expect("valid map");
        game.input(GameInput::Right);
        assert_eq!(game.state, GameState::Win);

        let frame = render(&game, false);
        assert!(frame.starts_with("```diff\n"));
        assert!(frame.contains("+You won!"));
    }

    #[test]
    fn custom_games_always_carry_the_no_score_notice() {
        let game = MazeGame::new(1, 2, Some("#####\n#O··#\n#####"), false, 5)
            .expect("valid map");
        let frame = render(&game, false);
        assert!(frame.contains("Custom game: Score won't be registered."));
    }

    #[test]
    fn help_input_swaps_the_frame_for_the_overlay() {
        let mut game = stock_game(false);
        game.input(GameInput::Help);
        assert_eq!(render(&game, false), HELP_TEXT);

        // The closing input restores the regular frame.
        game.input(GameInput::Wait);
        assert_ne!(render(&game, false), HELP_TEXT);
    }

    #[test]
    fn frightened_ghosts_draw_as_vulnerable() {
        let mut game = stock_game(false);
        for ghost in &mut game.ghosts {
            ghost.mode = GhostMode::Frightened;
        }
        let frame = render(&game, false);
        // Grid glyphs flip to 'E'; the sidebar keeps the appearance letters.
        assert!(frame.contains('E'));
        assert!(frame.contains("B - Blinky"));
    }

    #[test]
    fn early_frames_offer_the_help_hint() {
        let game = stock_game(false);
        assert!(render(&game, true).contains("Confused?"));
        assert!(!render(&game, false).contains("Confused?"));
    }

    #[test]
    fn cancelled_notice_distinguishes_timeouts() {
        let mut game = stock_game(false);
        let now = Utc::now();
        assert!(cancelled_notice(&game, now).contains("cancelled"));
        game.last_played = now - Duration::days(8);
        assert!(cancelled_notice(&game, now).contains("timed out"));
    }
}
