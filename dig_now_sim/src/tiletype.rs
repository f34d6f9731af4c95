// Composite tile types and the catalog of valid combinations.
//
// A `TileType` is the tuple (shape, material, variant, special, connectivity).
// Not every tuple names a real tile: a smoothed wall needs at least two
// connected sides, a carved track needs at least one, a grass wall does not
// exist, open space is always made of air. `TileType::find` is the single
// gate for building a composite, and `TileType::similar` is how every shape
// change (wall -> floor, wall -> ramp, ...) resolves its target.
//
// The predicates that interpret a tile (passability, diggability, yield
// eligibility) live in `classify.rs`.

use crate::types::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometric form of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileShape {
    /// Not a real tile (unallocated or placeholder).
    None,
    OpenSpace,
    Floor,
    Boulder,
    Pebbles,
    Wall,
    Fortification,
    StairUp,
    StairDown,
    StairUpDown,
    Ramp,
    RampTop,
    BrookBed,
    BrookTop,
    TrunkBranch,
    Branch,
    Twig,
    Sapling,
    Shrub,
    EndlessPit,
}

/// Coarse grouping of shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasicShape {
    None,
    Open,
    Floor,
    Wall,
    Stair,
    Ramp,
}

impl TileShape {
    pub fn basic(self) -> BasicShape {
        use TileShape::*;
        match self {
            None => BasicShape::None,
            OpenSpace | RampTop | EndlessPit | Twig => BasicShape::Open,
            Floor | Boulder | Pebbles | BrookTop | Branch | Sapling | Shrub => BasicShape::Floor,
            Wall | Fortification | BrookBed | TrunkBranch => BasicShape::Wall,
            StairUp | StairDown | StairUpDown => BasicShape::Stair,
            Ramp => BasicShape::Ramp,
        }
    }

    /// Whatever is above may pass down into this tile.
    pub fn is_low_passable(self) -> bool {
        matches!(
            self,
            TileShape::OpenSpace
                | TileShape::RampTop
                | TileShape::EndlessPit
                | TileShape::StairDown
                | TileShape::StairUpDown
        )
    }

    /// Creatures can stand on this tile.
    pub fn is_walkable(self) -> bool {
        matches!(
            self.basic(),
            BasicShape::Floor | BasicShape::Stair | BasicShape::Ramp
        )
    }

    fn is_floor_like(self) -> bool {
        matches!(
            self,
            TileShape::Floor
                | TileShape::Ramp
                | TileShape::RampTop
                | TileShape::Shrub
                | TileShape::Sapling
                | TileShape::Pebbles
                | TileShape::Boulder
        )
    }
}

/// Material kind of a tile. The concrete material (which stone, which ore)
/// is an index stored next to the tile type; see `grid::MapTile`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileMaterial {
    None,
    Air,
    Soil,
    Stone,
    Mineral,
    /// Material of a map feature (deep veins, cavern specials).
    Feature,
    LavaStone,
    FrozenLiquid,
    GrassLight,
    GrassDark,
    GrassDry,
    GrassDead,
    Plant,
    Driftwood,
    Ashes,
    Construction,
    Tree,
    Root,
    Pool,
    River,
    Brook,
    Magma,
    /// The hidden special-world material at the bottom of the map.
    Hfs,
    UnderworldGate,
    Campfire,
    Fire,
}

impl TileMaterial {
    /// Materials that can be smoothed and carved.
    pub fn is_stone_like(self) -> bool {
        matches!(
            self,
            TileMaterial::Stone
                | TileMaterial::Mineral
                | TileMaterial::Feature
                | TileMaterial::LavaStone
                | TileMaterial::FrozenLiquid
        )
    }

    fn is_surface_cover(self) -> bool {
        matches!(
            self,
            TileMaterial::GrassLight
                | TileMaterial::GrassDark
                | TileMaterial::GrassDry
                | TileMaterial::GrassDead
                | TileMaterial::Plant
                | TileMaterial::Driftwood
                | TileMaterial::Ashes
        )
    }
}

/// Graphical variant of a tile. Carried through transitions unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileVariant {
    #[default]
    None,
    Var1,
    Var2,
    Var3,
    Var4,
}

/// Surface finish of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileSpecial {
    #[default]
    Normal,
    Smooth,
    Track,
}

/// Which orthogonal sides a smoothed wall or a carved track connects to.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connectivity(u8);

impl Connectivity {
    pub const NONE: Connectivity = Connectivity(0);
    pub const ALL: Connectivity = Connectivity(0b1111);

    const fn bit(dir: Direction) -> u8 {
        match dir {
            Direction::North => 0b0001,
            Direction::East => 0b0010,
            Direction::South => 0b0100,
            Direction::West => 0b1000,
        }
    }

    pub fn from_directions(dirs: impl IntoIterator<Item = Direction>) -> Self {
        let mut conn = Connectivity::NONE;
        for dir in dirs {
            conn.insert(dir);
        }
        conn
    }

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & Self::bit(dir) != 0
    }

    pub fn insert(&mut self, dir: Direction) {
        self.0 |= Self::bit(dir);
    }

    pub fn remove(&mut self, dir: Direction) {
        self.0 &= !Self::bit(dir);
    }

    pub fn union(self, other: Connectivity) -> Connectivity {
        Connectivity(self.0 | other.0)
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |&d| self.contains(d))
    }
}

impl fmt::Debug for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: String = self
            .iter()
            .map(|d| match d {
                Direction::North => 'N',
                Direction::East => 'E',
                Direction::South => 'S',
                Direction::West => 'W',
            })
            .collect();
        write!(f, "Connectivity({letters})")
    }
}

/// A resolved composite tile type. Only obtainable through `find` (or the
/// helpers built on it), so a value in hand is always a valid combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileType {
    shape: TileShape,
    material: TileMaterial,
    variant: TileVariant,
    special: TileSpecial,
    connectivity: Connectivity,
}

impl TileType {
    /// Look up the composite for a tuple, or `None` if no such tile exists.
    pub fn find(
        shape: TileShape,
        material: TileMaterial,
        variant: TileVariant,
        special: TileSpecial,
        connectivity: Connectivity,
    ) -> Option<TileType> {
        is_valid(shape, material, special, connectivity).then_some(TileType {
            shape,
            material,
            variant,
            special,
            connectivity,
        })
    }

    /// Plain (normal finish, unconnected) tile of the given shape and material.
    pub fn plain(shape: TileShape, material: TileMaterial) -> Option<TileType> {
        Self::find(shape, material, TileVariant::None, TileSpecial::Normal, Connectivity::NONE)
    }

    pub fn open_space() -> TileType {
        TileType {
            shape: TileShape::OpenSpace,
            material: TileMaterial::Air,
            variant: TileVariant::None,
            special: TileSpecial::Normal,
            connectivity: Connectivity::NONE,
        }
    }

    pub fn shape(&self) -> TileShape {
        self.shape
    }

    pub fn material(&self) -> TileMaterial {
        self.material
    }

    pub fn variant(&self) -> TileVariant {
        self.variant
    }

    pub fn special(&self) -> TileSpecial {
        self.special
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn is_wall(&self) -> bool {
        self.shape == TileShape::Wall
    }

    /// The closest valid tile with a different shape: same material and
    /// variant, keeping the finish (and connections) when the new shape
    /// allows them, otherwise dropping back to a normal finish.
    pub fn similar(&self, shape: TileShape) -> Option<TileType> {
        if shape == TileShape::OpenSpace {
            return Some(Self::open_space());
        }
        Self::find(shape, self.material, self.variant, self.special, self.connectivity)
            .or_else(|| {
                Self::find(shape, self.material, self.variant, self.special, Connectivity::NONE)
            })
            .or_else(|| {
                Self::find(
                    shape,
                    self.material,
                    self.variant,
                    TileSpecial::Normal,
                    Connectivity::NONE,
                )
            })
    }

    /// Same tile with another material kind, if that combination exists.
    pub fn with_material(&self, material: TileMaterial) -> Option<TileType> {
        Self::find(self.shape, material, self.variant, self.special, self.connectivity)
    }

    /// Same tile with another finish and connection set.
    pub fn with_finish(&self, special: TileSpecial, connectivity: Connectivity) -> Option<TileType> {
        Self::find(self.shape, self.material, self.variant, special, connectivity)
    }
}

impl Default for TileType {
    fn default() -> Self {
        Self::open_space()
    }
}

fn is_valid(
    shape: TileShape,
    material: TileMaterial,
    special: TileSpecial,
    connectivity: Connectivity,
) -> bool {
    if shape == TileShape::None || material == TileMaterial::None {
        return false;
    }
    if shape == TileShape::OpenSpace {
        return material == TileMaterial::Air
            && special == TileSpecial::Normal
            && connectivity.is_empty();
    }
    if material == TileMaterial::Air
        && !matches!(shape, TileShape::RampTop | TileShape::EndlessPit)
    {
        return false;
    }
    if material.is_surface_cover() && !shape.is_floor_like() {
        return false;
    }
    match special {
        TileSpecial::Normal => connectivity.is_empty(),
        TileSpecial::Smooth => {
            material.is_stone_like()
                && match shape {
                    TileShape::Wall => connectivity.count() >= 2,
                    TileShape::Floor => connectivity.is_empty(),
                    _ => false,
                }
        }
        TileSpecial::Track => {
            material.is_stone_like()
                && matches!(shape, TileShape::Floor | TileShape::Ramp)
                && !connectivity.is_empty()
        }
    }
}
