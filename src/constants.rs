/// Ticks of power granted per power pellet.
pub const POWER_TIME: u32 = 20;
/// Length of the repeating scatter/chase cycle in ticks.
pub const SCATTER_CYCLE: u32 = 100;
/// Scatter window length during the first two cycles.
pub const SCATTER_TIME_1: u32 = 30;
/// Scatter window length during the last two cycles.
pub const SCATTER_TIME_2: u32 = 20;

/// Hard cap on ticks advanced per input under fast-forward.
pub const FAST_FORWARD_CAP: u32 = 20;

/// Maximum accepted map text length, newlines included.
pub const MAX_MAP_CHARS: usize = 1500;

pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
/// Base score for the first frightened ghost capture; doubles per streak.
pub const GHOST_CAPTURE_SCORE: u32 = 200;
/// Ticks a captured ghost stays caged before moving again.
pub const CAPTURE_PAUSE: u32 = 6;

/// Ticks each ghost waits in the cage at game start, in archetype order.
pub const GHOST_SPAWN_PAUSE: [u32; 4] = [0, 3, 15, 35];

/// Pellets eaten from the max that arm each fruit spawn.
pub const FRUIT_TRIGGER_1: u32 = 70;
pub const FRUIT_TRIGGER_2: u32 = 170;
pub const FRUIT_SCORE_EARLY: u32 = 1000;
pub const FRUIT_SCORE_LATE: u32 = 2000;
/// Fruit visibility duration range in ticks, inclusive.
pub const FRUIT_TIME_MIN: i32 = 25;
pub const FRUIT_TIME_MAX: i32 = 30;

/// Days of inactivity after which a session is swept.
pub const EXPIRY_DAYS: i64 = 7;

// Map glyphs read at construction.
pub const CHAR_PLAYER: char = 'O';
pub const CHAR_GHOST: char = 'G';
pub const CHAR_FRUIT: char = '$';
pub const CHAR_PELLET: char = '\u{b7}';
pub const CHAR_POWER_PELLET: char = '\u{25cf}';
pub const CHAR_SOFT_WALL: char = '_';
pub const CHAR_SOFT_WALL_PELLET: char = '~';
pub const CHAR_DOOR: char = '-';

// Display-only glyphs.
pub const CHAR_PLAYER_DEAD: char = 'X';
pub const CHAR_GHOST_FRIGHTENED: char = 'E';
pub const GHOST_APPEARANCE: [char; 4] = ['B', 'P', 'I', 'C'];

/// The stock maze used when no custom map is supplied.
pub const DEFAULT_MAP: &str = "\
┌────────────┬┬────────────┐
│············││············│
│·┌──┐·┌───┐·││·┌───┐·┌──┐·│
│●│  │·│   │·││·│   │·│  │●│
│·└──┘·└───┘·└┘·└───┘·└──┘·│
│··························│
│·┌──┐·┌┐·┌──────┐·┌┐·┌──┐·│
│·└──┘·││·└──┐┌──┘·││·└──┘·│
│······││····││····││······│
└────┐·│└──┐ ││ ┌──┘│·┌────┘
     │·│┌──┘ └┘ └──┐│·│     
     │·││     G    ││·│     
     │·││ ┌─----─┐ ││·│     
─────┘·└┘ │ GGG  │ └┘·└─────
      ·   │      │   ·      
─────┐·┌┐ │      │ ┌┐·┌─────
     │·││ └──────┘ ││·│     
     │·││    $     ││·│     
     │·││ ┌──────┐ ││·│     
┌────┘·└┘ └──┐┌──┘ └┘·└────┐
│············││············│
│·┌──┐·┌───┐·││·┌───┐·┌──┐·│
│·└─┐│·······││·······│┌─┘·│
│●··││·┌┐·┌──────┐·┌┐·││··●│
└─┐·││·││·└──┐┌──┘·││·││·┌─┘
┌─┘·└┘·└┘····││····└┘·└┘·└─┐
│······┌──┐·O││·┌──┐·······│
│·┌────┘┌─┘··└┘··└─┐└────┐·│
│·└─────┘··········└─────┘·│
│··························│
└──────────────────────────┘";
