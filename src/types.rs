use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// A facing or movement direction. The discriminant order matters: the
/// intersection stop check compares raw indices, so `None` must stay first
/// and the cardinals must keep this cyclic order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dir {
    #[default]
    None,
    Up,
    Right,
    Down,
    Left,
}

/// Order of preference when a ghost breaks distance ties.
pub const ALL_DIRS: [Dir; 4] = [Dir::Up, Dir::Left, Dir::Down, Dir::Right];

impl Dir {
    pub fn opposite(self) -> Self {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
            Dir::None => Dir::None,
        }
    }

    /// Unit offset of this direction, scaled by `steps`.
    pub fn offset(self, steps: i32) -> Pos {
        match self {
            Dir::Up => Pos::new(0, -steps),
            Dir::Down => Pos::new(0, steps),
            Dir::Left => Pos::new(-steps, 0),
            Dir::Right => Pos::new(steps, 0),
            Dir::None => Pos::new(0, 0),
        }
    }

    pub fn index(self) -> i32 {
        match self {
            Dir::None => 0,
            Dir::Up => 1,
            Dir::Right => 2,
            Dir::Down => 3,
            Dir::Left => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dir::None => "none",
            Dir::Up => "up",
            Dir::Right => "right",
            Dir::Down => "down",
            Dir::Left => "left",
        }
    }
}

/// A grid coordinate. Targets may lie outside the board on purpose; only
/// entity positions get wrapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance, used by the ghost pathing and Clyde's retreat.
    pub fn distance(a: Pos, b: Pos) -> f32 {
        let dx = (a.x - b.x) as f32;
        let dy = (a.y - b.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add<Dir> for Pos {
    type Output = Pos;

    fn add(self, dir: Dir) -> Pos {
        self + dir.offset(1)
    }
}

impl Add<Pos> for Pos {
    type Output = Pos;

    fn add(self, other: Pos) -> Pos {
        Pos::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign<Pos> for Pos {
    fn add_assign(&mut self, other: Pos) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub<Pos> for Pos {
    type Output = Pos;

    fn sub(self, other: Pos) -> Pos {
        Pos::new(self.x - other.x, self.y - other.y)
    }
}

/// One external input event for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameInput {
    #[default]
    None,
    Up,
    Left,
    Down,
    Right,
    Wait,
    Help,
    Fast,
}

impl GameInput {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "left" => Some(Self::Left),
            "down" => Some(Self::Down),
            "right" => Some(Self::Right),
            "wait" | "none" => Some(Self::Wait),
            "help" => Some(Self::Help),
            "fast" => Some(Self::Fast),
            _ => None,
        }
    }

    pub fn direction(self) -> Dir {
        match self {
            GameInput::Up => Dir::Up,
            GameInput::Right => Dir::Right,
            GameInput::Down => Dir::Down,
            GameInput::Left => Dir::Left,
            _ => Dir::None,
        }
    }
}

/// Session lifecycle. Transitions out of `Active` are one-way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Active,
    Win,
    Lose,
    Cancelled,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        self != GameState::Active
    }
}

/// The four fixed ghost archetypes, in map scan order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostType {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostType {
    pub const ALL: [GhostType; 4] = [
        GhostType::Blinky,
        GhostType::Pinky,
        GhostType::Inky,
        GhostType::Clyde,
    ];

    pub fn index(self) -> usize {
        match self {
            GhostType::Blinky => 0,
            GhostType::Pinky => 1,
            GhostType::Inky => 2,
            GhostType::Clyde => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GhostType::Blinky => "Blinky",
            GhostType::Pinky => "Pinky",
            GhostType::Inky => "Inky",
            GhostType::Clyde => "Clyde",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Chase,
    Scatter,
    Frightened,
}

/// One row in the score ledger, written once per natural game end.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u32,
    pub state: GameState,
    pub turns: u32,
    #[serde(rename = "channelId")]
    pub channel_id: u64,
    #[serde(rename = "ownerId")]
    pub owner_id: u64,
    pub date: String,
}
