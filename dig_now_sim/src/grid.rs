// The grid seam: the map storage the engine reads from and writes back to.
//
// Tile storage, block allocation and material raws belong to the host. The
// engine only sees them through `GridStore`, which is passed explicitly to
// every pass, so the whole engine runs against a synthetic grid in tests
// (`world::TileWorld`) exactly as it runs against a live map.
//
// Reads and writes during a pass go through `cache::TileCache`; the store is
// touched again only for the final write-back.

use crate::designation::{Designation, Occupancy};
use crate::tiletype::{TileMaterial, TileShape, TileType};
use crate::types::{MapDims, MapPos};
use serde::{Deserialize, Serialize};

/// Index of an inorganic material in the host's raws.
pub type MaterialIndex = u32;

/// How a tile's source material sits in the rock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VeinCategory {
    /// Plain layer stone or soil.
    #[default]
    Layer,
    Vein,
    Cluster,
    ClusterSmall,
    ClusterOne,
}

/// Map features that can own a tile's material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    /// The rare deep vein that can be mined.
    DeepSpecialTube,
    Cavern,
    MagmaPool,
    Volcano,
    Pit,
}

/// Kind of the layer a tile reverts to once dug.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Stone,
    Soil,
}

impl LayerKind {
    pub fn tile_material(self) -> TileMaterial {
        match self {
            LayerKind::Stone => TileMaterial::Stone,
            LayerKind::Soil => TileMaterial::Soil,
        }
    }
}

/// The geological layer material at a coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMaterial {
    pub kind: LayerKind,
    pub index: MaterialIndex,
}

/// Everything the engine tracks about one tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTile {
    pub tile_type: TileType,
    pub designation: Designation,
    pub occupancy: Occupancy,
    /// Concrete material of the tile, if it has one.
    pub material: Option<MaterialIndex>,
    pub vein: VeinCategory,
}

impl MapTile {
    /// A natural (normal finish) tile of the given shape and material kind,
    /// or `None` for a combination the catalog rejects.
    pub fn natural(
        shape: TileShape,
        kind: TileMaterial,
        material: Option<MaterialIndex>,
    ) -> Option<Self> {
        Some(Self {
            tile_type: TileType::plain(shape, kind)?,
            material,
            ..Self::default()
        })
    }

    pub fn open_space() -> Self {
        Self::default()
    }
}

/// Host-owned map storage.
pub trait GridStore {
    /// Whether a map is loaded at all.
    fn is_loaded(&self) -> bool;

    fn dimensions(&self) -> MapDims;

    /// In bounds and backed by an allocated block.
    fn block_exists(&self, pos: MapPos) -> bool;

    /// `None` when `block_exists(pos)` is false.
    fn read_tile(&self, pos: MapPos) -> Option<MapTile>;

    /// No-op when `block_exists(pos)` is false.
    fn write_tile(&mut self, pos: MapPos, tile: &MapTile);

    fn layer_material(&self, pos: MapPos) -> Option<LayerMaterial>;

    fn local_feature(&self, pos: MapPos) -> Option<FeatureKind>;

    /// Small clusters of gem material yield rough gems, not boulders.
    fn is_gem_material(&self, index: MaterialIndex) -> bool;

    /// Raise the host's "walkability changed" flag.
    fn request_pathing_recompute(&mut self);
}
