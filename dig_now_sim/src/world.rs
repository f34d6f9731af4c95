// Dense in-memory map: the reference `GridStore`.
//
// Tiles live in a flat `Vec<MapTile>` indexed by
// `x + y * size_x + z * size_x * size_y`. Allocation is tracked per block of
// 16x16x1 tiles, the granularity at which a live map allocates, so tests can
// punch holes into the grid and check that every pass treats "no block" as
// "nothing here". Reads outside the map or in a deallocated block return
// `None`; writes there are no-ops.
//
// Layer materials are one per z-level, which is all the geology the engine
// needs: a dug tile reverts to whatever its level is made of.
//
// See also: `grid.rs` for the trait, `cache.rs` for the overlay that batches
// access to this store during a pass.

use crate::grid::{FeatureKind, GridStore, LayerKind, LayerMaterial, MapTile, MaterialIndex};
use crate::types::{Cuboid, MapDims, MapPos};
use std::collections::{BTreeMap, BTreeSet};

/// Edge length of an allocation block on a level.
pub const BLOCK_SIZE: u32 = 16;

/// Dense map grid with per-block allocation.
#[derive(Clone, Debug)]
pub struct TileWorld {
    /// Flat storage: index = x + y * size_x + z * size_x * size_y.
    tiles: Vec<MapTile>,
    /// One flag per block, same layout as `tiles` at block resolution.
    allocated: Vec<bool>,
    dims: MapDims,
    layers: Vec<LayerMaterial>,
    features: BTreeMap<MapPos, FeatureKind>,
    gem_materials: BTreeSet<MaterialIndex>,
    loaded: bool,
    pathing_dirty: bool,
}

impl TileWorld {
    /// A fully allocated map of open space over layer stone with index 0.
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = (size_x as usize) * (size_y as usize) * (size_z as usize);
        let blocks_x = size_x.div_ceil(BLOCK_SIZE) as usize;
        let blocks_y = size_y.div_ceil(BLOCK_SIZE) as usize;
        let stone = LayerMaterial {
            kind: LayerKind::Stone,
            index: 0,
        };
        Self {
            tiles: vec![MapTile::open_space(); total],
            allocated: vec![true; blocks_x * blocks_y * size_z as usize],
            dims: MapDims::new(size_x, size_y, size_z),
            layers: vec![stone; size_z as usize],
            features: BTreeMap::new(),
            gem_materials: BTreeSet::new(),
            loaded: true,
            pathing_dirty: false,
        }
    }

    /// A map that reports itself as not loaded.
    pub fn unloaded() -> Self {
        let mut world = Self::new(0, 0, 0);
        world.loaded = false;
        world
    }

    fn index(&self, pos: MapPos) -> Option<usize> {
        if !self.dims.contains(pos) {
            return None;
        }
        let sx = self.dims.x as usize;
        let sy = self.dims.y as usize;
        Some(pos.x as usize + pos.y as usize * sx + pos.z as usize * sx * sy)
    }

    fn block_index(&self, pos: MapPos) -> Option<usize> {
        if !self.dims.contains(pos) {
            return None;
        }
        let bx = (pos.x as u32 / BLOCK_SIZE) as usize;
        let by = (pos.y as u32 / BLOCK_SIZE) as usize;
        let blocks_x = self.dims.x.div_ceil(BLOCK_SIZE) as usize;
        let blocks_y = self.dims.y.div_ceil(BLOCK_SIZE) as usize;
        Some(bx + by * blocks_x + pos.z as usize * blocks_x * blocks_y)
    }

    pub fn tile(&self, pos: MapPos) -> Option<&MapTile> {
        if !self.block_exists(pos) {
            return None;
        }
        self.index(pos).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, pos: MapPos) -> Option<&mut MapTile> {
        if !self.block_exists(pos) {
            return None;
        }
        self.index(pos).map(|i| &mut self.tiles[i])
    }

    pub fn set(&mut self, pos: MapPos, tile: MapTile) {
        if let Some(slot) = self.tile_mut(pos) {
            *slot = tile;
        }
    }

    /// Overwrite every allocated tile in `region` with `tile`.
    pub fn fill(&mut self, region: Cuboid, tile: MapTile) {
        for pos in region.iter_top_down() {
            self.set(pos, tile);
        }
    }

    /// Drop the block containing `pos`. Its tiles become unreadable.
    pub fn deallocate_block(&mut self, pos: MapPos) {
        if let Some(b) = self.block_index(pos) {
            self.allocated[b] = false;
        }
    }

    pub fn set_layer(&mut self, z: i32, layer: LayerMaterial) {
        if let Some(slot) = usize::try_from(z).ok().and_then(|z| self.layers.get_mut(z)) {
            *slot = layer;
        }
    }

    pub fn add_feature(&mut self, pos: MapPos, kind: FeatureKind) {
        self.features.insert(pos, kind);
    }

    pub fn add_gem_material(&mut self, index: MaterialIndex) {
        self.gem_materials.insert(index);
    }

    pub fn pathing_recompute_requested(&self) -> bool {
        self.pathing_dirty
    }
}

impl GridStore for TileWorld {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn dimensions(&self) -> MapDims {
        self.dims
    }

    fn block_exists(&self, pos: MapPos) -> bool {
        self.block_index(pos).is_some_and(|b| self.allocated[b])
    }

    fn read_tile(&self, pos: MapPos) -> Option<MapTile> {
        self.tile(pos).copied()
    }

    fn write_tile(&mut self, pos: MapPos, tile: &MapTile) {
        self.set(pos, *tile);
    }

    fn layer_material(&self, pos: MapPos) -> Option<LayerMaterial> {
        if !self.dims.contains(pos) {
            return None;
        }
        self.layers.get(pos.z as usize).copied()
    }

    fn local_feature(&self, pos: MapPos) -> Option<FeatureKind> {
        self.features.get(&pos).copied()
    }

    fn is_gem_material(&self, index: MaterialIndex) -> bool {
        self.gem_materials.contains(&index)
    }

    fn request_pathing_recompute(&mut self) {
        self.pathing_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiletype::{TileMaterial, TileShape};

    fn wall() -> MapTile {
        MapTile::natural(TileShape::Wall, TileMaterial::Stone, Some(3)).unwrap()
    }

    #[test]
    fn new_world_is_open_space() {
        let world = TileWorld::new(4, 4, 4);
        for pos in world.dims.full_region().unwrap().iter_top_down() {
            assert_eq!(world.read_tile(pos), Some(MapTile::open_space()));
        }
    }

    #[test]
    fn set_and_read_back() {
        let mut world = TileWorld::new(8, 8, 8);
        let pos = MapPos::new(3, 5, 2);
        world.set(pos, wall());
        assert_eq!(world.read_tile(pos), Some(wall()));
        assert_eq!(world.read_tile(pos.above()), Some(MapTile::open_space()));
    }

    #[test]
    fn out_of_bounds_is_absent() {
        let mut world = TileWorld::new(4, 4, 4);
        assert!(world.read_tile(MapPos::new(-1, 0, 0)).is_none());
        assert!(world.read_tile(MapPos::new(0, 4, 0)).is_none());
        assert!(!world.block_exists(MapPos::new(0, 0, 4)));
        // Should not panic.
        world.write_tile(MapPos::new(100, 0, 0), &wall());
    }

    #[test]
    fn deallocated_block_hides_only_its_tiles() {
        let mut world = TileWorld::new(32, 16, 2);
        world.deallocate_block(MapPos::new(20, 3, 1));
        assert!(!world.block_exists(MapPos::new(16, 0, 1)));
        assert!(!world.block_exists(MapPos::new(31, 15, 1)));
        assert!(world.block_exists(MapPos::new(15, 0, 1)));
        assert!(world.block_exists(MapPos::new(20, 3, 0)));
        world.set(MapPos::new(20, 3, 1), wall());
        assert!(world.read_tile(MapPos::new(20, 3, 1)).is_none());
    }

    #[test]
    fn indexing_keeps_levels_apart() {
        let mut world = TileWorld::new(10, 8, 6);
        let pos = MapPos::new(5, 3, 4);
        world.set(pos, wall());
        assert_eq!(world.read_tile(MapPos::new(4, 3, 4)), Some(MapTile::open_space()));
        assert_eq!(world.read_tile(MapPos::new(5, 2, 4)), Some(MapTile::open_space()));
        assert_eq!(world.read_tile(MapPos::new(5, 3, 3)), Some(MapTile::open_space()));
    }

    #[test]
    fn layers_are_per_level() {
        let mut world = TileWorld::new(4, 4, 3);
        let soil = LayerMaterial {
            kind: LayerKind::Soil,
            index: 9,
        };
        world.set_layer(2, soil);
        assert_eq!(world.layer_material(MapPos::new(1, 1, 2)), Some(soil));
        assert_eq!(world.layer_material(MapPos::new(1, 1, 1)).unwrap().kind, LayerKind::Stone);
        assert!(world.layer_material(MapPos::new(1, 1, 3)).is_none());
    }

    #[test]
    fn unloaded_world_reports_it() {
        assert!(!TileWorld::unloaded().is_loaded());
        assert!(TileWorld::new(1, 1, 1).is_loaded());
    }
}
