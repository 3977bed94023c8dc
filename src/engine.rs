use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{Board, InvalidMapError, Tile};
use crate::constants::{
    CAPTURE_PAUSE, CHAR_FRUIT, CHAR_GHOST, CHAR_PLAYER, EXPIRY_DAYS, FAST_FORWARD_CAP,
    FRUIT_SCORE_EARLY, FRUIT_SCORE_LATE, FRUIT_TIME_MAX, FRUIT_TIME_MIN, FRUIT_TRIGGER_1,
    FRUIT_TRIGGER_2, GHOST_CAPTURE_SCORE, GHOST_SPAWN_PAUSE, PELLET_SCORE, POWER_PELLET_SCORE,
    POWER_TIME, SCATTER_CYCLE, SCATTER_TIME_1, SCATTER_TIME_2,
};
use crate::rng::Rng;
use crate::types::{Dir, GameInput, GameState, GhostMode, GhostType, Pos, ALL_DIRS};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PacMan {
    pub origin: Pos,
    pub pos: Pos,
    pub dir: Dir,
    /// Remaining power ticks; > 0 means empowered.
    pub power: u32,
    /// Ghosts eaten during the current power window.
    #[serde(rename = "ghostStreak")]
    pub ghost_streak: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ghost {
    pub origin: Pos,
    /// Preferred corner targeted in Scatter mode. Deliberately off-grid.
    pub corner: Pos,
    pub pos: Pos,
    pub dir: Dir,
    pub kind: GhostType,
    pub mode: GhostMode,
    /// Ticks left caged before it may move.
    pub pause: u32,
    /// Exit the cage to the right instead of the left.
    #[serde(rename = "exitRight")]
    pub exit_right: bool,
}

/// Global scatter/chase schedule as a pure function of elapsed ticks. Four
/// scatter windows within a repeating 100-tick cycle, then permanent chase.
pub fn scheduled_mode(time: u32) -> GhostMode {
    let in_scatter = time < 4 * SCATTER_CYCLE
        && (time < 2 * SCATTER_CYCLE && time % SCATTER_CYCLE < SCATTER_TIME_1
            || time >= 2 * SCATTER_CYCLE && time % SCATTER_CYCLE < SCATTER_TIME_2);
    if in_scatter {
        GhostMode::Scatter
    } else {
        GhostMode::Chase
    }
}

/// One maze-chase session: the board, both entity sets and every counter
/// needed to resume the simulation bit-identically after a round trip
/// through serde.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MazeGame {
    #[serde(rename = "channelId")]
    pub channel_id: u64,
    #[serde(rename = "ownerId")]
    pub owner_id: u64,
    pub state: GameState,
    /// Elapsed simulation ticks.
    pub time: u32,
    pub score: u32,
    /// Score at the start of the last burst, for the render delta.
    #[serde(rename = "oldScore")]
    pub(crate) old_score: u32,
    /// User-supplied map; disables score recording.
    pub custom: bool,
    #[serde(rename = "mobileDisplay")]
    pub mobile_display: bool,
    pub(crate) board: Board,
    #[serde(rename = "maxPellets")]
    pub(crate) max_pellets: u32,
    pub(crate) pellets: u32,
    #[serde(rename = "pacMan")]
    pub(crate) pac_man: PacMan,
    pub(crate) ghosts: Vec<Ghost>,
    /// Fruit is visible and collectible while > 0.
    #[serde(rename = "fruitTimer")]
    pub(crate) fruit_timer: u32,
    /// Fruit also occupies the cell to the right of this one.
    #[serde(rename = "fruitSpawn")]
    pub(crate) fruit_spawn: Option<Pos>,
    #[serde(rename = "lastInput")]
    pub(crate) last_input: GameInput,
    #[serde(rename = "fastForward")]
    pub(crate) fast_forward: bool,
    #[serde(rename = "lastPlayed")]
    pub last_played: DateTime<Utc>,
    pub(crate) rng: Rng,
}

impl MazeGame {
    /// Builds a session from a map text, scanning and clearing the player,
    /// fruit and ghost markers. `custom_map == None` uses the stock maze.
    pub fn new(
        channel_id: u64,
        owner_id: u64,
        custom_map: Option<&str>,
        mobile_display: bool,
        seed: u32,
    ) -> Result<Self, InvalidMapError> {
        let custom = custom_map.is_some();
        let text = custom_map.unwrap_or(crate::constants::DEFAULT_MAP);
        let mut board = Board::parse(text)?;

        let max_pellets = text
            .chars()
            .filter(|c| Tile::from_glyph(*c).has_pellet())
            .count() as u32;

        let player_pos = board.find_glyph(CHAR_PLAYER).unwrap_or_default();
        board.set_tile(player_pos, Tile::Empty);
        let pac_man = PacMan {
            origin: player_pos,
            pos: player_pos,
            dir: Dir::None,
            power: 0,
            ghost_streak: 0,
        };

        let fruit_spawn = board.find_glyph(CHAR_FRUIT);
        if let Some(pos) = fruit_spawn {
            board.set_tile(pos, Tile::Empty);
        }

        // Corner assignment matches the original arcade game.
        let corners = [
            Pos::new(board.width() - 3, -3),
            Pos::new(2, -3),
            Pos::new(board.width() - 1, board.height()),
            Pos::new(0, board.height()),
        ];
        let mut ghosts = Vec::new();
        for kind in GhostType::ALL {
            let Some(pos) = board.find_glyph(CHAR_GHOST) else {
                break;
            };
            board.set_tile(pos, Tile::Empty);
            ghosts.push(Ghost {
                origin: pos,
                corner: corners[kind.index()],
                pos,
                dir: Dir::None,
                kind,
                mode: GhostMode::Chase,
                pause: GHOST_SPAWN_PAUSE[kind.index()],
                exit_right: false,
            });
        }

        Ok(Self {
            channel_id,
            owner_id,
            state: GameState::Active,
            time: 0,
            score: 0,
            old_score: 0,
            custom,
            mobile_display,
            board,
            max_pellets,
            pellets: max_pellets,
            pac_man,
            ghosts,
            fruit_timer: 0,
            fruit_spawn,
            last_input: GameInput::None,
            fast_forward: true,
            last_played: Utc::now(),
            rng: Rng::new(seed),
        })
    }

    pub fn pellets(&self) -> u32 {
        self.pellets
    }

    pub fn max_pellets(&self) -> u32 {
        self.max_pellets
    }

    pub fn fast_forward(&self) -> bool {
        self.fast_forward
    }

    /// Marks the session cancelled. Terminal states are one-way, so this is
    /// a no-op once the game has already ended.
    pub fn cancel(&mut self) {
        if self.state == GameState::Active {
            self.state = GameState::Cancelled;
        }
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now - self.last_played > Duration::days(EXPIRY_DAYS)
    }

    /// Feeds one input event. Returns whether the simulation advanced, in
    /// which case the caller should persist the session.
    pub fn input(&mut self, input: GameInput) -> bool {
        if self.state != GameState::Active {
            return false;
        }
        self.last_played = Utc::now();

        // Any input closes a pending help overlay and is consumed by it.
        if self.last_input == GameInput::Help {
            self.last_input = GameInput::None;
            return false;
        }
        self.last_input = input;

        if input == GameInput::Help {
            return false;
        }
        if input == GameInput::Fast {
            self.fast_forward = !self.fast_forward;
            return false;
        }

        self.old_score = self.score;
        let new_dir = input.direction();

        let mut consecutive = 0;
        loop {
            consecutive += 1;
            let keep_going = self.tick(new_dir);
            if !(self.fast_forward
                && keep_going
                && self.state == GameState::Active
                && consecutive < FAST_FORWARD_CAP)
            {
                break;
            }
        }
        true
    }

    /// Advances the world by exactly one tick. Returns false when a stopping
    /// event should end the current fast-forward burst.
    fn tick(&mut self, new_dir: Dir) -> bool {
        self.time += 1;
        let mut continue_input = true;

        // Player movement. The supplied direction is reapplied on every
        // burst iteration so fast-forward keeps the player moving.
        if new_dir != Dir::None {
            self.pac_man.dir = new_dir;
            if self.board.non_solid(self.pac_man.pos + new_dir) {
                self.pac_man.pos = self.board.wrap(self.pac_man.pos + new_dir);
            }
        }

        // Intersections are natural stopping points. The angular-difference
        // check over direction indices detects perpendicular openings.
        for dir in ALL_DIRS {
            let diff = (self.pac_man.dir.index() - dir.index()).abs();
            if (diff == 1 || diff == 3) && self.board.non_solid(self.pac_man.pos + dir) {
                continue_input = false;
            }
        }

        // Fruit occupies its spawn cell and the one to its right.
        if self.fruit_timer > 0 {
            let on_fruit = self.fruit_spawn.is_some_and(|spawn| {
                self.pac_man.pos == spawn || self.pac_man.pos == spawn + Dir::Right
            });
            if on_fruit {
                self.score += self.fruit_score();
                self.fruit_timer = 0;
                continue_input = false;
            } else {
                self.fruit_timer -= 1;
            }
        }

        // Pellet consumption.
        let tile = self.board.tile(self.pac_man.pos);
        if tile.has_pellet() {
            self.pellets -= 1;
            let crossed_trigger = [FRUIT_TRIGGER_1, FRUIT_TRIGGER_2]
                .iter()
                .any(|t| self.max_pellets.checked_sub(*t) == Some(self.pellets));
            if crossed_trigger && self.fruit_spawn.is_some() {
                self.fruit_timer = self.rng.int(FRUIT_TIME_MIN, FRUIT_TIME_MAX) as u32;
            }

            self.score += if tile == Tile::PowerPellet {
                POWER_PELLET_SCORE
            } else {
                PELLET_SCORE
            };
            let downgraded = if tile == Tile::SoftWallPellet {
                Tile::SoftWall
            } else {
                Tile::Empty
            };
            self.board.set_tile(self.pac_man.pos, downgraded);

            if tile == Tile::PowerPellet {
                self.pac_man.power += POWER_TIME;
                for ghost in &mut self.ghosts {
                    ghost.mode = GhostMode::Frightened;
                }
                continue_input = false;
            }

            if self.pellets == 0 {
                self.state = GameState::Win;
                continue_input = false;
            }
        }

        // Ghosts: the collision check runs before and after each ghost's AI
        // step, since a moving ghost can step onto a stationary player.
        for index in 0..self.ghosts.len() {
            let mut did_ai = false;
            loop {
                if self.pac_man.pos == self.ghosts[index].pos {
                    if self.ghosts[index].mode == GhostMode::Frightened {
                        self.ghosts[index].pause = CAPTURE_PAUSE;
                        self.ghosts[index].mode = scheduled_mode(self.time);
                        self.score +=
                            GHOST_CAPTURE_SCORE * 2u32.pow(self.pac_man.ghost_streak);
                        self.pac_man.ghost_streak += 1;
                    } else {
                        self.state = GameState::Lose;
                    }
                    continue_input = false;
                    did_ai = true;
                }
                if did_ai || self.state != GameState::Active {
                    break;
                }
                self.ghost_ai(index);
                did_ai = true;
            }
        }

        // Power countdown; the streak resets the instant power runs out.
        if self.pac_man.power > 0 {
            self.pac_man.power -= 1;
        }
        if self.pac_man.power == 0 {
            self.pac_man.ghost_streak = 0;
        }

        continue_input
    }

    /// One behavior step for one ghost: mode upkeep, cage handling, target
    /// selection and greedy movement.
    fn ghost_ai(&mut self, index: usize) {
        if self.pac_man.power <= 1 {
            self.ghosts[index].mode = scheduled_mode(self.time);
        }

        if self.ghosts[index].pause > 0 {
            // Caged: pinned to the origin until the pause runs out.
            let origin = self.ghosts[index].origin;
            self.ghosts[index].pos = origin;
            self.ghosts[index].dir = Dir::None;
            self.ghosts[index].pause -= 1;
            if self.mode_just_changed(index, true) {
                self.ghosts[index].exit_right = true;
            }
            return;
        }

        if self.ghosts[index].mode == GhostMode::Frightened && self.time % 2 == 1 {
            // Frightened ghosts only move on even ticks.
            if self.mode_just_changed(index, false) {
                let reversed = self.ghosts[index].dir.opposite();
                self.ghosts[index].dir = reversed;
            }
            return;
        }

        let ghost = &self.ghosts[index];
        let target = match ghost.mode {
            GhostMode::Scatter => ghost.corner,
            _ => match ghost.kind {
                GhostType::Blinky => self.pac_man.pos,
                GhostType::Pinky => {
                    let mut t = self.pac_man.pos + self.pac_man.dir.offset(4);
                    if self.pac_man.dir == Dir::Up {
                        // Overflow quirk reproduced from the original arcade.
                        t += Dir::Left.offset(4);
                    }
                    t
                }
                GhostType::Inky => {
                    let mut t = self.pac_man.pos + self.pac_man.dir.offset(2);
                    if self.pac_man.dir == Dir::Up {
                        t += Dir::Left.offset(2);
                    }
                    // Reflected through Blinky's position.
                    t + (t - self.ghosts[GhostType::Blinky.index()].pos)
                }
                GhostType::Clyde => {
                    if Pos::distance(ghost.pos, self.pac_man.pos) > 8.0 {
                        self.pac_man.pos
                    } else {
                        ghost.corner
                    }
                }
            },
        };

        let pos = self.ghosts[index].pos;
        let dir = self.ghosts[index].dir;
        if self.board.tile(pos) == Tile::Door || self.board.tile(pos + Dir::Up) == Tile::Door {
            // Exiting the cage.
            self.ghosts[index].dir = Dir::Up;
        } else if dir == Dir::Up && self.board.tile(pos + Dir::Down) == Tile::Door {
            // Getting away from the cage, to the recorded side.
            self.ghosts[index].dir = if self.ghosts[index].exit_right {
                Dir::Right
            } else {
                Dir::Left
            };
        } else if self.mode_just_changed(index, false) {
            self.ghosts[index].dir = dir.opposite();
        } else if self.ghosts[index].mode == GhostMode::Frightened {
            // Turns randomly, never reversing.
            let open: Vec<Dir> = ALL_DIRS
                .iter()
                .copied()
                .filter(|d| *d != dir.opposite() && self.board.non_solid(pos + *d))
                .collect();
            if !open.is_empty() {
                let pick = self.rng.pick_index(open.len());
                self.ghosts[index].dir = open[pick];
            }
        } else {
            // Track the target: greedy over the non-reverse candidates in
            // preference order, minimizing Euclidean distance.
            self.ghosts[index].exit_right = false;
            let mut best = f32::INFINITY;
            for test_dir in ALL_DIRS {
                if test_dir == dir.opposite() {
                    continue;
                }
                let test_pos = pos + test_dir;
                let test_tile = self.board.tile(test_pos);
                if test_dir == Dir::Up
                    && matches!(test_tile, Tile::SoftWall | Tile::SoftWallPellet)
                {
                    // One-way tiles cannot be entered from below.
                    continue;
                }
                if test_tile.non_solid() {
                    let dist = Pos::distance(test_pos, target);
                    if dist < best {
                        self.ghosts[index].dir = test_dir;
                        best = dist;
                    }
                }
            }
        }

        let chosen = self.ghosts[index].dir;
        self.ghosts[index].pos = self.board.wrap(pos + chosen);
    }

    /// Whether a mode-transition edge fired on this exact tick. The full
    /// check also reports the instant a power pellet was just eaten, so
    /// caged ghosts learn they should exit to the right.
    fn mode_just_changed(&self, index: usize, full_check: bool) -> bool {
        if self.time == 0 {
            return false;
        }
        if self.ghosts[index].mode == GhostMode::Frightened && !full_check {
            // Detects the switch to Frightened, but not from it.
            return self.pac_man.power == POWER_TIME;
        }
        for i in 0..2 {
            if self.time == i * SCATTER_CYCLE || self.time == i * SCATTER_CYCLE + SCATTER_TIME_1 {
                return true;
            }
        }
        for i in 2..4 {
            if self.time == i * SCATTER_CYCLE || self.time == i * SCATTER_CYCLE + SCATTER_TIME_2 {
                return true;
            }
        }
        full_check && self.pac_man.power == POWER_TIME
    }

    /// The late fruit is worth double.
    pub(crate) fn fruit_score(&self) -> u32 {
        let late = self
            .max_pellets
            .checked_sub(FRUIT_TRIGGER_2)
            .is_some_and(|t| self.pellets <= t);
        if late {
            FRUIT_SCORE_LATE
        } else {
            FRUIT_SCORE_EARLY
        }
    }

    pub(crate) fn fruit_glyph(&self) -> char {
        if self.fruit_score() == FRUIT_SCORE_LATE {
            'w'
        } else {
            'x'
        }
    }
}
