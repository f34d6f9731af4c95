// Yield simulator.
//
// Every successful dig leaves a `DugTileRecord` captured before the tile
// changed. Records of rough stone-like walls may turn into items: the
// record's source category picks a percent from the config, one roll is
// drawn, and a hit files the tile's position under (item kind, material) in
// the `YieldBatch`. Items themselves are produced later, after the map
// changes are flushed (see `fall.rs`).
//
// Rolls come through `PercentRoll` so tests can script them; the engine uses
// the deterministic `DigRng`.

use crate::cache::TileCache;
use crate::config::BoulderPercents;
use crate::entities::ItemKind;
use crate::grid::{MaterialIndex, VeinCategory};
use crate::prng::DigRng;
use crate::tiletype::{TileMaterial, TileShape};
use crate::types::MapPos;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source of uniform rolls in `0..100`.
pub trait PercentRoll {
    fn roll_percent(&mut self) -> u32;
}

impl PercentRoll for DigRng {
    fn roll_percent(&mut self) -> u32 {
        DigRng::roll_percent(self)
    }
}

/// Config category a dug tile's odds come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YieldBucket {
    Layer,
    Vein,
    SmallCluster,
    Deep,
}

impl YieldBucket {
    pub const ALL: [YieldBucket; 4] = [
        YieldBucket::Layer,
        YieldBucket::Vein,
        YieldBucket::SmallCluster,
        YieldBucket::Deep,
    ];

    pub fn classify(material: TileMaterial, vein: VeinCategory) -> YieldBucket {
        if material == TileMaterial::Feature {
            return YieldBucket::Deep;
        }
        match vein {
            VeinCategory::Layer => YieldBucket::Layer,
            VeinCategory::Vein | VeinCategory::Cluster => YieldBucket::Vein,
            VeinCategory::ClusterSmall | VeinCategory::ClusterOne => YieldBucket::SmallCluster,
        }
    }
}

/// A tile as it was just before a dig changed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DugTileRecord {
    pub pos: MapPos,
    pub material: TileMaterial,
    pub vein: VeinCategory,
    pub item_kind: ItemKind,
    /// Set only for rough walls of stone, mineral or feature material; these
    /// are the only records that can yield an item.
    pub item_material: Option<MaterialIndex>,
}

impl DugTileRecord {
    /// Snapshot `pos` from the cache. `None` where no block exists.
    pub fn capture(cache: &mut TileCache<'_>, pos: MapPos) -> Option<DugTileRecord> {
        let tile = cache.tile(pos)?;
        let material = tile.tile_type.material();
        let is_rock_wall = tile.tile_type.shape() == TileShape::Wall
            && matches!(
                material,
                TileMaterial::Stone | TileMaterial::Mineral | TileMaterial::Feature
            );
        let item_material = if is_rock_wall { tile.material } else { None };
        let small_cluster = matches!(tile.vein, VeinCategory::ClusterSmall | VeinCategory::ClusterOne);
        let item_kind = match item_material {
            Some(index) if small_cluster && cache.is_gem_material(index) => ItemKind::RoughGem,
            _ => ItemKind::Boulder,
        };
        Some(DugTileRecord {
            pos,
            material,
            vein: tile.vein,
            item_kind,
            item_material,
        })
    }

    pub fn bucket(&self) -> YieldBucket {
        YieldBucket::classify(self.material, self.vein)
    }
}

/// Decide whether a dug tile leaves an item. Draws a roll only for records
/// that can yield at all.
pub fn rolls_item(
    percents: &BoulderPercents,
    rng: &mut dyn PercentRoll,
    record: &DugTileRecord,
) -> bool {
    if record.item_material.is_none() {
        return false;
    }
    let percent = percents.for_bucket(record.bucket());
    rng.roll_percent() < percent
}

/// Pending item production, grouped by what to make.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct YieldBatch {
    entries: BTreeMap<(ItemKind, MaterialIndex), Vec<MapPos>>,
}

impl YieldBatch {
    /// File `record` under its kind and material. Ignored for records that
    /// cannot yield.
    pub fn push(&mut self, record: &DugTileRecord) {
        if let Some(material) = record.item_material {
            self.entries
                .entry((record.item_kind, material))
                .or_default()
                .push(record.pos);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of items requested.
    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn positions(&self, kind: ItemKind, material: MaterialIndex) -> &[MapPos] {
        self.entries
            .get(&(kind, material))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, MaterialIndex, &[MapPos])> {
        self.entries
            .iter()
            .map(|((kind, material), positions)| (*kind, *material, positions.as_slice()))
    }
}

#[derive(Serialize)]
struct YieldEntry<'a> {
    kind: ItemKind,
    material: MaterialIndex,
    positions: &'a [MapPos],
}

// JSON maps need string keys, so the batch serializes as a list of entries.
impl Serialize for YieldBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (kind, material, positions) in self.iter() {
            seq.serialize_element(&YieldEntry {
                kind,
                material,
                positions,
            })?;
        }
        seq.end()
    }
}

/// Replays a fixed list of rolls, then keeps returning the last one.
#[cfg(test)]
pub(crate) struct ScriptedRolls {
    rolls: Vec<u32>,
    next: usize,
}

#[cfg(test)]
impl ScriptedRolls {
    pub(crate) fn new(rolls: &[u32]) -> Self {
        Self {
            rolls: rolls.to_vec(),
            next: 0,
        }
    }

    pub(crate) fn drawn(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
impl PercentRoll for ScriptedRolls {
    fn roll_percent(&mut self) -> u32 {
        let roll = self
            .rolls
            .get(self.next)
            .or(self.rolls.last())
            .copied()
            .unwrap_or(0);
        self.next += 1;
        roll
    }
}
