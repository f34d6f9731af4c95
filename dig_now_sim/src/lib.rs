// dig_now_sim: instant resolution of dig, smooth and track designations.
//
// Given a 3-D tile map with pending player designations, a single call to
// `dig::dig_now` carries out all of them at once: walls become floors,
// stairs and ramps, channels open shafts with ramps beneath them, rough
// stone is smoothed or carved with track, and dug rock may leave boulders
// or rough gems. Visibility, light flags, ramp validity and smooth-wall
// links are kept consistent along the way, and anything standing on a tile
// that lost its footing falls to the first solid tile below.
//
// Module overview:
// - `dig.rs`:          `dig_now` entry point and `DigReport`.
// - `scanner.rs`:      Region walk; picks dig > smooth > track per tile.
// - `transition.rs`:   `Excavator::dig_tile`, the per-kind dig rules.
// - `ramps.rs`:        Ramp consistency (ramps need a wall to lean on).
// - `flags.rs`:        Light/outside/subterranean propagation down shafts.
// - `reveal.rs`:       Worklist flood fill that unhides newly visible tiles.
// - `connectivity.rs`: Smooth-wall links and track directions.
// - `yields.rs`:       Dug-tile records, boulder odds, `YieldBatch`.
// - `fall.rs`:         Post-pass reveal, falling entities, item placement.
// - `classify.rs`:     Pure predicates: diggable, smoothable, footing.
// - `tiletype.rs`:     Tile shape/material/finish catalog and `TileType`.
// - `designation.rs`:  Per-tile designation and occupancy bits.
// - `grid.rs`:         `GridStore` trait and `MapTile`.
// - `cache.rs`:        `TileCache` write-back overlay used during a pass.
// - `world.rs`:        `TileWorld`, the in-memory `GridStore`.
// - `entities.rs`:     `EntityStore` trait and the in-memory `EntityLedger`.
// - `config.rs`:       `DigConfig`, boulder odds and batch limits (JSON).
// - `error.rs`:        Fatal `DigError` and per-tile `Diagnostic`s.
// - `types.rs`:        `MapPos`, `Cuboid`, `Direction`.
// - `prng`:            Re-exported from `dig_now_prng` (xoshiro256++).
//
// The map and the entities are never owned here; they are reached through
// the `GridStore` and `EntityStore` traits passed into every call, so the
// whole engine runs headless against `TileWorld` and `EntityLedger`.
//
// **Critical constraint: determinism.** Same map, same designations, same
// seed: same result. All iteration is over `BTreeMap`/`BTreeSet` or in
// fixed coordinate order, and the only randomness is the seeded `DigRng`.

pub mod cache;
pub mod classify;
pub mod config;
pub mod connectivity;
pub mod designation;
pub mod dig;
pub mod entities;
pub mod error;
pub mod fall;
pub mod flags;
pub mod grid;
pub use dig_now_prng as prng;
pub mod ramps;
pub mod reveal;
pub mod scanner;
pub mod tiletype;
pub mod transition;
pub mod types;
pub mod world;
pub mod yields;

pub use config::{BoulderPercents, DigConfig};
pub use dig::{dig_now, dig_now_seeded, DigReport};
pub use error::{DigError, Diagnostic};
