// Write-back overlay over a `GridStore`.
//
// A dig pass reads and mutates tiles freely through `TileCache`; the grid
// itself is untouched until `flush()`, which writes every modified tile back
// in one go. Dropping the cache without flushing discards the pass, so no
// other reader ever observes a half-applied pass.
//
// Tiles are loaded lazily on first access and kept in a `BTreeMap`, so the
// flush order is the coordinate order (z, y, x) and is deterministic.

use crate::designation::{Designation, Occupancy};
use crate::grid::{FeatureKind, GridStore, LayerMaterial, MapTile, MaterialIndex};
use crate::tiletype::TileType;
use crate::types::{MapDims, MapPos};
use std::collections::{BTreeMap, BTreeSet};

pub struct TileCache<'g> {
    grid: &'g mut dyn GridStore,
    tiles: BTreeMap<MapPos, MapTile>,
    dirty: BTreeSet<MapPos>,
}

impl<'g> TileCache<'g> {
    pub fn new(grid: &'g mut dyn GridStore) -> Self {
        Self {
            grid,
            tiles: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    pub fn dimensions(&self) -> MapDims {
        self.grid.dimensions()
    }

    pub fn block_exists(&self, pos: MapPos) -> bool {
        self.grid.block_exists(pos)
    }

    /// Current state of a tile, including unflushed changes.
    pub fn tile(&mut self, pos: MapPos) -> Option<MapTile> {
        if let Some(tile) = self.tiles.get(&pos) {
            return Some(*tile);
        }
        let tile = self.grid.read_tile(pos)?;
        self.tiles.insert(pos, tile);
        Some(tile)
    }

    /// Apply `f` to a tile and mark it for write-back. Returns `false` (and
    /// does nothing) where no block exists.
    pub fn update(&mut self, pos: MapPos, f: impl FnOnce(&mut MapTile)) -> bool {
        let Some(mut tile) = self.tile(pos) else {
            return false;
        };
        f(&mut tile);
        self.tiles.insert(pos, tile);
        self.dirty.insert(pos);
        true
    }

    pub fn tile_type(&mut self, pos: MapPos) -> Option<TileType> {
        self.tile(pos).map(|t| t.tile_type)
    }

    pub fn designation(&mut self, pos: MapPos) -> Option<Designation> {
        self.tile(pos).map(|t| t.designation)
    }

    pub fn occupancy(&mut self, pos: MapPos) -> Option<Occupancy> {
        self.tile(pos).map(|t| t.occupancy)
    }

    pub fn set_tile_type(&mut self, pos: MapPos, tile_type: TileType) -> bool {
        self.update(pos, |t| t.tile_type = tile_type)
    }

    pub fn set_designation(&mut self, pos: MapPos, designation: Designation) -> bool {
        self.update(pos, |t| t.designation = designation)
    }

    pub fn set_occupancy(&mut self, pos: MapPos, occupancy: Occupancy) -> bool {
        self.update(pos, |t| t.occupancy = occupancy)
    }

    pub fn layer_material(&self, pos: MapPos) -> Option<LayerMaterial> {
        self.grid.layer_material(pos)
    }

    pub fn local_feature(&self, pos: MapPos) -> Option<FeatureKind> {
        self.grid.local_feature(pos)
    }

    pub fn is_gem_material(&self, index: MaterialIndex) -> bool {
        self.grid.is_gem_material(index)
    }

    /// Number of tiles waiting for write-back.
    pub fn pending_writes(&self) -> usize {
        self.dirty.len()
    }

    /// Write every modified tile back to the grid. Returns how many tiles
    /// were written.
    pub fn flush(self) -> usize {
        let TileCache { grid, tiles, dirty } = self;
        for pos in &dirty {
            if let Some(tile) = tiles.get(pos) {
                grid.write_tile(*pos, tile);
            }
        }
        dirty.len()
    }
}
