// Errors and diagnostics.
//
// `DigError` covers the few conditions that stop an invocation outright:
// no map, nobody to attribute produced items to, or a config that cannot be
// honoured. All are detected before the first tile is touched.
//
// Everything else that can go wrong during a pass is local to a tile or an
// item batch and does not stop the pass. Those are `Diagnostic`s: logged
// through `tracing` when raised and handed back in the pass report.

use crate::designation::DigKind;
use crate::entities::{ItemId, ItemKind, UnitId};
use crate::grid::MaterialIndex;
use crate::types::MapPos;
use crate::yields::YieldBucket;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum DigError {
    #[error("map is not available")]
    MapUnavailable,
    #[error("no living unit available to produce items")]
    NoLivingAgent,
    #[error("{bucket:?} boulder percent must be within 0..=100, got {value}")]
    PercentOutOfRange { bucket: YieldBucket, value: u32 },
    #[error("max_items_per_batch must be positive")]
    ZeroBatchSize,
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A non-fatal problem met during a pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum Diagnostic {
    #[error("unhandled dig designation for tile {pos}: {kind:?}")]
    UnhandledDesignation { pos: MapPos, kind: DigKind },
    #[error("invalid dump tile coordinates {pos}; ensure the dump position is an open, non-wall tile")]
    InvalidDumpPosition { pos: MapPos },
    #[error("unexpected number of {kind:?} (material {material}) produced: expected {expected}, got {produced}")]
    ItemCountMismatch {
        kind: ItemKind,
        material: MaterialIndex,
        expected: usize,
        produced: usize,
    },
    #[error("unable to place {kind:?} from {source_pos}")]
    ItemPlacementFailed { kind: ItemKind, source_pos: MapPos },
    #[error("no valid tile beneath {pos}; can't move units and items")]
    NoSupportBeneath { pos: MapPos },
    #[error("unable to move unit {unit:?} from {from} to {to}")]
    UnitMoveFailed { unit: UnitId, from: MapPos, to: MapPos },
    #[error("unable to move item {item:?} from {from} to {to}")]
    ItemMoveFailed { item: ItemId, from: MapPos, to: MapPos },
}

/// Collector for diagnostics raised during one invocation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
