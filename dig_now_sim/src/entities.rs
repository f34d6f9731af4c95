// The entity seam: units, ground items and vermin colonies.
//
// A pass never looks inside the host's entity model. After the tile changes
// are flushed it asks `EntityStore` who is standing where, moves them, and
// requests new items attributed to a living agent. `EntityLedger` is a small
// in-memory implementation used by tests, benches and headless runs.

use crate::grid::MaterialIndex;
use crate::types::MapPos;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// What a dug wall can leave behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Boulder,
    RoughGem,
}

/// Host-owned units, items and vermin.
pub trait EntityStore {
    /// The agent new items are attributed to.
    fn first_living_agent(&self) -> Option<UnitId>;

    fn units_at(&self, pos: MapPos) -> Vec<UnitId>;

    fn move_unit(&mut self, unit: UnitId, to: MapPos) -> bool;

    fn items_on_ground_at(&self, pos: MapPos) -> Vec<ItemId>;

    fn move_item_to_ground(&mut self, item: ItemId, to: MapPos) -> bool;

    /// Create up to `count` items. May return fewer than asked for.
    fn produce_items(
        &mut self,
        agent: UnitId,
        kind: ItemKind,
        material: MaterialIndex,
        count: u32,
    ) -> Vec<ItemId>;

    /// Remove vermin colonies at `pos`, returning how many there were.
    fn destroy_vermin_colonies_at(&mut self, pos: MapPos) -> usize;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub pos: MapPos,
    pub alive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub material: MaterialIndex,
    /// `None` until the item is placed on the ground.
    pub pos: Option<MapPos>,
    pub maker: Option<UnitId>,
}

/// In-memory `EntityStore`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntityLedger {
    units: BTreeMap<UnitId, Unit>,
    items: BTreeMap<ItemId, Item>,
    colonies: BTreeMap<MapPos, usize>,
    next_unit: u32,
    next_item: u32,
    /// Caps how many items one `produce_items` call creates, to model a host
    /// that comes up short.
    production_cap: Option<u32>,
}

impl EntityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, pos: MapPos, alive: bool) -> UnitId {
        let id = UnitId(self.next_unit);
        self.next_unit += 1;
        self.units.insert(id, Unit { id, pos, alive });
        id
    }

    pub fn add_item_on_ground(
        &mut self,
        kind: ItemKind,
        material: MaterialIndex,
        pos: MapPos,
    ) -> ItemId {
        let id = self.alloc_item(kind, material, None);
        if let Some(item) = self.items.get_mut(&id) {
            item.pos = Some(pos);
        }
        id
    }

    pub fn add_vermin_colony(&mut self, pos: MapPos) {
        *self.colonies.entry(pos).or_default() += 1;
    }

    pub fn set_production_cap(&mut self, cap: Option<u32>) {
        self.production_cap = cap;
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn colony_sites(&self) -> BTreeSet<MapPos> {
        self.colonies.keys().copied().collect()
    }

    fn alloc_item(&mut self, kind: ItemKind, material: MaterialIndex, maker: Option<UnitId>) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        self.items.insert(
            id,
            Item {
                id,
                kind,
                material,
                pos: None,
                maker,
            },
        );
        id
    }
}

impl EntityStore for EntityLedger {
    fn first_living_agent(&self) -> Option<UnitId> {
        self.units.values().find(|u| u.alive).map(|u| u.id)
    }

    fn units_at(&self, pos: MapPos) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.pos == pos)
            .map(|u| u.id)
            .collect()
    }

    fn move_unit(&mut self, unit: UnitId, to: MapPos) -> bool {
        match self.units.get_mut(&unit) {
            Some(u) => {
                u.pos = to;
                true
            }
            None => false,
        }
    }

    fn items_on_ground_at(&self, pos: MapPos) -> Vec<ItemId> {
        self.items
            .values()
            .filter(|i| i.pos == Some(pos))
            .map(|i| i.id)
            .collect()
    }

    fn move_item_to_ground(&mut self, item: ItemId, to: MapPos) -> bool {
        match self.items.get_mut(&item) {
            Some(i) => {
                i.pos = Some(to);
                true
            }
            None => false,
        }
    }

    fn produce_items(
        &mut self,
        agent: UnitId,
        kind: ItemKind,
        material: MaterialIndex,
        count: u32,
    ) -> Vec<ItemId> {
        let count = self.production_cap.map_or(count, |cap| count.min(cap));
        (0..count)
            .map(|_| self.alloc_item(kind, material, Some(agent)))
            .collect()
    }

    fn destroy_vermin_colonies_at(&mut self, pos: MapPos) -> usize {
        self.colonies.remove(&pos).unwrap_or(0)
    }
}
