// Spatial types shared by every part of the engine.
//
// `MapPos` is a tile coordinate with `z` as the vertical axis (z + 1 is the
// level above). `Cuboid` is an inclusive box of coordinates, the unit of work
// for a dig pass. `Direction` names the four orthogonal neighbours used by
// ramp validation, smooth-wall connectivity and track carving.
//
// Coordinates order by z, then y, then x. Every `BTreeMap`/`BTreeSet` keyed
// by `MapPos` therefore iterates level by level, which keeps passes
// deterministic without any extra sorting.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A tile coordinate. North is -y, east is +x, up is +z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl MapPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn above(self) -> Self {
        self.offset(0, 0, 1)
    }

    pub const fn below(self) -> Self {
        self.offset(0, 0, -1)
    }

    /// The orthogonal neighbour on the same level.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        self.offset(dx, dy, 0)
    }

    /// The eight neighbours sharing this level, in row-major order.
    pub fn level_neighbors(self) -> [MapPos; 8] {
        [
            self.offset(-1, -1, 0),
            self.offset(0, -1, 0),
            self.offset(1, -1, 0),
            self.offset(-1, 0, 0),
            self.offset(1, 0, 0),
            self.offset(-1, 1, 0),
            self.offset(0, 1, 0),
            self.offset(1, 1, 0),
        ]
    }
}

impl Ord for MapPos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.z
            .cmp(&other.z)
            .then_with(|| self.y.cmp(&other.y))
            .then_with(|| self.x.cmp(&other.x))
    }
}

impl PartialOrd for MapPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MapPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Extents of a loaded map, in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDims {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl MapDims {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    pub fn contains(&self, pos: MapPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && (pos.x as u32) < self.x
            && (pos.y as u32) < self.y
            && (pos.z as u32) < self.z
    }

    /// The box covering every tile. `None` for a map with a zero extent.
    pub fn full_region(&self) -> Option<Cuboid> {
        if self.x == 0 || self.y == 0 || self.z == 0 {
            return None;
        }
        Some(Cuboid::new(
            MapPos::new(0, 0, 0),
            MapPos::new(self.x as i32 - 1, self.y as i32 - 1, self.z as i32 - 1),
        ))
    }
}

/// An inclusive box of tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cuboid {
    pub min: MapPos,
    pub max: MapPos,
}

impl Cuboid {
    /// Build a box from any two opposite corners.
    pub fn new(a: MapPos, b: MapPos) -> Self {
        Self {
            min: MapPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: MapPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn single(pos: MapPos) -> Self {
        Self { min: pos, max: pos }
    }

    pub fn contains(&self, pos: MapPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    /// Intersect with the map. `None` if nothing of the box is on the map.
    pub fn clamp_to(&self, dims: MapDims) -> Option<Cuboid> {
        let full = dims.full_region()?;
        let min = MapPos::new(
            self.min.x.max(full.min.x),
            self.min.y.max(full.min.y),
            self.min.z.max(full.min.z),
        );
        let max = MapPos::new(
            self.max.x.min(full.max.x),
            self.max.y.min(full.max.y),
            self.max.z.min(full.max.z),
        );
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return None;
        }
        Some(Cuboid { min, max })
    }

    pub fn tile_count(&self) -> u64 {
        let span = |lo: i32, hi: i32| (hi - lo + 1) as u64;
        span(self.min.x, self.max.x) * span(self.min.y, self.max.y) * span(self.min.z, self.max.z)
    }

    /// Scan order for a dig pass: z from the top level down, then y and x
    /// ascending. A channel digs a ramp into the level below it, so the lower
    /// level must not have been visited yet when the channel resolves.
    pub fn iter_top_down(&self) -> impl Iterator<Item = MapPos> + use<> {
        let Cuboid { min, max } = *self;
        (min.z..=max.z).rev().flat_map(move |z| {
            (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| MapPos::new(x, y, z)))
        })
    }
}

/// One of the four orthogonal directions on a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}
