//! Tile grid model: coordinates, dimensions, and walkability oracles.
//!
//! Two read-only views exist over one flag map: the *collision* view
//! (blocked where a static obstacle tile sits, optionally overlaid
//! with an occupancy snapshot) used by pursuers, and the *road* view
//! (walkable only on road-tagged tiles) used by vehicles. Both views
//! answer [`TileGrid::is_blocked`] in O(1) and treat out-of-bounds
//! coordinates as blocked.

use std::fmt;

use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::context::OccupancySnapshot;

/// Discrete grid position expressed in tile coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// L1 distance, the heuristic used by the path search.
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// L-infinity distance, used for vision range and spawn spacing.
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// The four cardinal neighbors, unclamped.
    pub fn neighbors(self) -> ArrayVec<Position, 4> {
        let mut out = ArrayVec::new();
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            out.push(Self::new(self.x + dx, self.y + dy));
        }
        out
    }

    /// World-space center of this tile.
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Continuous world-space coordinate. One tile spans one world unit,
/// so tile `(x, y)` covers `[x, x+1) × [y, y+1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Tile containing this point, before any bounds clamping.
    pub fn tile(self) -> Position {
        Position::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Rectangular grid bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridDimensions {
    pub width: u32,
    pub height: u32,
}

impl GridDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }

    /// Clamps a coordinate into `[0, width) × [0, height)`.
    ///
    /// Agent positions are continuous and can momentarily round one
    /// tile outside the map, so every search entry point clamps first.
    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x.clamp(0, self.width.saturating_sub(1) as i32),
            position.y.clamp(0, self.height.saturating_sub(1) as i32),
        )
    }

    /// Valid tile under a world-space point.
    pub fn tile_at(&self, point: Vec2) -> Position {
        self.clamp(point.tile())
    }
}

bitflags! {
    /// Static per-tile flags supplied by the map collaborator.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u8 {
        /// Tile holds a static obstacle; pursuers cannot enter it.
        const BLOCKED = 1 << 0;
        /// Tile is drivable; vehicles may only ever occupy road tiles.
        const ROAD = 1 << 1;
    }
}

/// Walkability oracle over a rectangular grid.
///
/// Implementations must answer in O(1), be free of side effects, and
/// report every out-of-bounds coordinate as blocked.
pub trait TileGrid {
    fn dimensions(&self) -> GridDimensions;
    fn is_blocked(&self, position: Position) -> bool;

    fn is_walkable(&self, position: Position) -> bool {
        !self.is_blocked(position)
    }
}

/// Error raised when parsing a textual map sketch.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridParseError {
    #[error("row {row} is {found} tiles wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
}

/// Concrete flag map backing both grid views.
///
/// The scene owns one of these and hands the search fresh views each
/// tick; the core never mutates it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagGrid {
    dimensions: GridDimensions,
    flags: Vec<TileFlags>,
}

impl FlagGrid {
    /// Creates an all-open grid. Zero-sized grids are representable;
    /// searches over them simply return empty paths.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dimensions: GridDimensions::new(width, height),
            flags: vec![TileFlags::empty(); (width as usize) * (height as usize)],
        }
    }

    /// Parses a map sketch, one row per line, top row first.
    ///
    /// Glyphs: `.` open, `#` blocked, `r` road. Row `0` of the sketch
    /// becomes the highest `y` so sketches read the way maps render.
    pub fn parse(rows: &[&str]) -> Result<Self, GridParseError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut grid = Self::new(width as u32, height as u32);
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridParseError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            let y = (height - 1 - row) as i32;
            for (x, glyph) in line.chars().enumerate() {
                let flags = match glyph {
                    '.' => TileFlags::empty(),
                    '#' => TileFlags::BLOCKED,
                    'r' => TileFlags::ROAD,
                    _ => {
                        return Err(GridParseError::UnknownGlyph { glyph, x, y: row });
                    }
                };
                grid.set(Position::new(x as i32, y), flags);
            }
        }
        Ok(grid)
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.dimensions
            .contains(position)
            .then(|| position.y as usize * self.dimensions.width as usize + position.x as usize)
    }

    /// Flags at a tile; out-of-bounds reads as `BLOCKED`.
    pub fn flags(&self, position: Position) -> TileFlags {
        self.index(position)
            .map_or(TileFlags::BLOCKED, |i| self.flags[i])
    }

    /// Replaces the flags of an in-bounds tile. Out-of-bounds writes
    /// are ignored; the grid's contents come from a trusted map layer.
    pub fn set(&mut self, position: Position, flags: TileFlags) {
        if let Some(i) = self.index(position) {
            self.flags[i] = flags;
        }
    }

    /// All road tiles in row-major order. The scene caches this once
    /// per grid for random goal selection.
    pub fn road_tiles(&self) -> Vec<Position> {
        let mut tiles = Vec::new();
        for y in 0..self.dimensions.height as i32 {
            for x in 0..self.dimensions.width as i32 {
                let position = Position::new(x, y);
                if self.flags(position).contains(TileFlags::ROAD) {
                    tiles.push(position);
                }
            }
        }
        tiles
    }
}

impl TileGrid for FlagGrid {
    fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Bare grid walkability: static obstacles only, no occupancy.
    fn is_blocked(&self, position: Position) -> bool {
        self.flags(position).contains(TileFlags::BLOCKED)
    }
}

/// Pursuer-facing view: blocked on static obstacles and, when an
/// occupancy snapshot is supplied, on cells other entities occupy.
#[derive(Clone, Copy)]
pub struct CollisionView<'a> {
    grid: &'a FlagGrid,
    occupancy: Option<&'a OccupancySnapshot>,
}

impl<'a> CollisionView<'a> {
    pub fn new(grid: &'a FlagGrid, occupancy: Option<&'a OccupancySnapshot>) -> Self {
        Self { grid, occupancy }
    }
}

impl TileGrid for CollisionView<'_> {
    fn dimensions(&self) -> GridDimensions {
        self.grid.dimensions()
    }

    fn is_blocked(&self, position: Position) -> bool {
        if !self.grid.dimensions().contains(position) {
            return true;
        }
        self.grid.flags(position).contains(TileFlags::BLOCKED)
            || self.occupancy.is_some_and(|o| o.contains(position))
    }
}

/// Vehicle-facing view: only road tiles are walkable.
#[derive(Clone, Copy)]
pub struct RoadView<'a> {
    grid: &'a FlagGrid,
}

impl<'a> RoadView<'a> {
    pub fn new(grid: &'a FlagGrid) -> Self {
        Self { grid }
    }
}

impl TileGrid for RoadView<'_> {
    fn dimensions(&self) -> GridDimensions {
        self.grid.dimensions()
    }

    fn is_blocked(&self, position: Position) -> bool {
        !self.grid.flags(position).contains(TileFlags::ROAD)
    }
}
