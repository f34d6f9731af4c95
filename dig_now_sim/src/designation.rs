// Per-tile designation and occupancy bits.
//
// A `Designation` is what the player has asked for at a tile (dig kind,
// smoothing level) plus the visibility and environment flags that live in
// the same bitfield (hidden, light, outside, subterranean). An `Occupancy`
// carries the track-carving request, the "already marked" marker that holds
// a dig back, and whether units or items rest on the tile.
//
// Designation bits are cleared only after the matching transition has
// succeeded; see `scanner.rs`.

use crate::tiletype::{Connectivity, TileShape};
use serde::{Deserialize, Serialize};

/// Pending dig request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigKind {
    #[default]
    None,
    Default,
    Channel,
    UpStair,
    DownStair,
    UpDownStair,
    Ramp,
}

impl DigKind {
    /// Whether a tile of this shape can take this dig at all. The material
    /// check is separate (`classify::is_diggable`).
    pub fn accepts(self, shape: TileShape) -> bool {
        use TileShape as S;
        match self {
            DigKind::None => false,
            DigKind::Default => matches!(
                shape,
                S::Wall | S::Fortification | S::Ramp | S::StairUp | S::StairUpDown
            ),
            DigKind::Channel => !matches!(
                shape,
                S::OpenSpace | S::EndlessPit | S::None | S::RampTop | S::TrunkBranch
            ),
            DigKind::UpStair | DigKind::Ramp => matches!(shape, S::Wall | S::Fortification),
            DigKind::DownStair => matches!(
                shape,
                S::Boulder
                    | S::BrookBed
                    | S::BrookTop
                    | S::Floor
                    | S::Fortification
                    | S::Pebbles
                    | S::Ramp
                    | S::Sapling
                    | S::Shrub
                    | S::Twig
                    | S::Wall
            ),
            DigKind::UpDownStair => {
                matches!(shape, S::Wall | S::Fortification | S::StairUp)
            }
        }
    }
}

/// Pending smoothing request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmoothLevel {
    #[default]
    None,
    Smooth,
    Engrave,
}

/// Designation bitfield of one tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Designation {
    pub dig: DigKind,
    pub smooth: SmoothLevel,
    pub hidden: bool,
    pub light: bool,
    pub outside: bool,
    pub subterranean: bool,
}

impl Designation {
    /// The flags the vertical propagator copies down open shafts.
    pub fn environment(&self) -> EnvironmentFlags {
        EnvironmentFlags {
            light: self.light,
            outside: self.outside,
            subterranean: self.subterranean,
        }
    }

    pub fn set_environment(&mut self, env: EnvironmentFlags) {
        self.light = env.light;
        self.outside = env.outside;
        self.subterranean = env.subterranean;
    }
}

/// Light/weather state of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentFlags {
    pub light: bool,
    pub outside: bool,
    pub subterranean: bool,
}

impl EnvironmentFlags {
    /// A tile with nothing above it.
    pub const OPEN_SKY: EnvironmentFlags = EnvironmentFlags {
        light: true,
        outside: true,
        subterranean: false,
    };
}

/// Occupancy bitfield of one tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    /// Requested track directions; any set bit is a pending carve.
    pub carve_track: Connectivity,
    /// The dig is marked but not yet active; skipped by dig passes.
    pub dig_marked: bool,
    pub unit: bool,
    pub item: bool,
}
