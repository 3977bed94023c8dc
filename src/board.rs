use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::constants::{
    CHAR_DOOR, CHAR_PELLET, CHAR_POWER_PELLET, CHAR_SOFT_WALL, CHAR_SOFT_WALL_PELLET,
    MAX_MAP_CHARS,
};
use crate::types::Pos;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidMapError {
    #[error("map exceeds the maximum length of {MAX_MAP_CHARS} characters")]
    TooLarge,
    #[error("map is completely solid")]
    Solid,
    #[error("map width is not constant")]
    RaggedRows,
}

/// One cell of the board. Unrecognized glyphs are solid walls and keep their
/// glyph so the renderer can draw the maze as authored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Pellet,
    PowerPellet,
    SoftWall,
    SoftWallPellet,
    Door,
    Wall(char),
}

impl Tile {
    pub fn from_glyph(c: char) -> Self {
        match c {
            ' ' => Tile::Empty,
            CHAR_PELLET => Tile::Pellet,
            CHAR_POWER_PELLET => Tile::PowerPellet,
            CHAR_SOFT_WALL => Tile::SoftWall,
            CHAR_SOFT_WALL_PELLET => Tile::SoftWallPellet,
            CHAR_DOOR => Tile::Door,
            other => Tile::Wall(other),
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Pellet => CHAR_PELLET,
            Tile::PowerPellet => CHAR_POWER_PELLET,
            Tile::SoftWall => CHAR_SOFT_WALL,
            Tile::SoftWallPellet => CHAR_SOFT_WALL_PELLET,
            Tile::Door => CHAR_DOOR,
            Tile::Wall(c) => c,
        }
    }

    /// Whether the player and ghosts may occupy this tile.
    pub fn non_solid(self) -> bool {
        matches!(
            self,
            Tile::Empty | Tile::Pellet | Tile::PowerPellet | Tile::SoftWall | Tile::SoftWallPellet
        )
    }

    pub fn has_pellet(self) -> bool {
        matches!(self, Tile::Pellet | Tile::PowerPellet | Tile::SoftWallPellet)
    }
}

/// A rectangular tile grid with toroidal coordinates. Width and height are
/// fixed at parse time; mutation happens only through `set_tile`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Board {
    pub fn parse(text: &str) -> Result<Board, InvalidMapError> {
        if text.chars().count() > MAX_MAP_CHARS {
            return Err(InvalidMapError::TooLarge);
        }
        let non_solid = [
            ' ',
            CHAR_SOFT_WALL,
            CHAR_PELLET,
            CHAR_POWER_PELLET,
            CHAR_SOFT_WALL_PELLET,
        ];
        if !text.chars().any(|c| non_solid.contains(&c)) {
            return Err(InvalidMapError::Solid);
        }

        let lines: Vec<&str> = text.split('\n').collect();
        let width = lines[0].chars().count();
        let mut tiles = Vec::with_capacity(width * lines.len());
        for line in &lines {
            if line.chars().count() != width {
                return Err(InvalidMapError::RaggedRows);
            }
            tiles.extend(line.chars().map(Tile::from_glyph));
        }

        Ok(Board {
            width: width as i32,
            height: lines.len() as i32,
            tiles,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Tile at a position, wrapping out-of-range coordinates.
    pub fn tile(&self, pos: Pos) -> Tile {
        let wrapped = self.wrap(pos);
        self.tiles[(wrapped.y * self.width + wrapped.x) as usize]
    }

    pub fn set_tile(&mut self, pos: Pos, tile: Tile) {
        let wrapped = self.wrap(pos);
        self.tiles[(wrapped.y * self.width + wrapped.x) as usize] = tile;
    }

    /// Applies toroidal wrap to both axes independently.
    pub fn wrap(&self, pos: Pos) -> Pos {
        Pos::new(pos.x.rem_euclid(self.width), pos.y.rem_euclid(self.height))
    }

    pub fn non_solid(&self, pos: Pos) -> bool {
        self.tile(pos).non_solid()
    }

    /// Row-major scan for the given glyph. Used to locate spawn markers.
    pub fn find_glyph(&self, glyph: char) -> Option<Pos> {
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Pos::new(x, y);
                if self.tile(pos).glyph() == glyph {
                    return Some(pos);
                }
            }
        }
        None
    }

    /// Rows of the current grid, for the renderer.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width as usize)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.rows().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            for tile in row {
                write!(f, "{}", tile.glyph())?;
            }
        }
        Ok(())
    }
}

// The board persists as its textual grid form; the typed grid exists only in
// memory.
impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Board::parse(&text).map_err(D::Error::custom)
    }
}
