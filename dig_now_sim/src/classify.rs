// Tile classifier: pure predicates over tile types.
//
// Which tiles a dig may touch, which a smoothing or carving may touch, and
// whether a tile gives footing. Shape-level passability lives on
// `TileShape` itself; this module combines shape, material and the local
// map feature.

use crate::grid::FeatureKind;
use crate::tiletype::{BasicShape, TileMaterial, TileSpecial, TileShape, TileType};

/// Whether a dig may change a tile of this material.
///
/// Constructions, liquids, molten and lava-derived material, trees and the
/// special-world materials are out of reach. Feature material is diggable
/// only inside the deep special tube. Open air counts as diggable: a channel
/// over an open cavern still opens the floor above it.
pub fn is_diggable(tile_type: TileType, feature: Option<FeatureKind>) -> bool {
    match tile_type.material() {
        TileMaterial::Feature => feature == Some(FeatureKind::DeepSpecialTube),
        TileMaterial::None
        | TileMaterial::Construction
        | TileMaterial::Tree
        | TileMaterial::Root
        | TileMaterial::Pool
        | TileMaterial::River
        | TileMaterial::Brook
        | TileMaterial::Magma
        | TileMaterial::LavaStone
        | TileMaterial::Hfs
        | TileMaterial::UnderworldGate => false,
        TileMaterial::Air
        | TileMaterial::Campfire
        | TileMaterial::Fire
        | TileMaterial::Soil
        | TileMaterial::Stone
        | TileMaterial::Mineral
        | TileMaterial::FrozenLiquid
        | TileMaterial::GrassLight
        | TileMaterial::GrassDark
        | TileMaterial::GrassDry
        | TileMaterial::GrassDead
        | TileMaterial::Plant
        | TileMaterial::Driftwood
        | TileMaterial::Ashes => true,
    }
}

/// Rough stone-like walls and floors can be smoothed.
pub fn is_smoothable(tile_type: TileType) -> bool {
    tile_type.material().is_stone_like()
        && tile_type.special() == TileSpecial::Normal
        && matches!(tile_type.shape(), TileShape::Wall | TileShape::Floor)
}

/// Tracks go into stone-like floors and ramps, rough, smooth or already tracked.
pub fn is_trackable(tile_type: TileType) -> bool {
    tile_type.material().is_stone_like()
        && matches!(tile_type.shape(), TileShape::Floor | TileShape::Ramp)
}

/// A smoothed wall, the only kind that takes part in wall connectivity.
pub fn is_smooth_wall(tile_type: TileType) -> bool {
    tile_type.is_wall() && tile_type.special() == TileSpecial::Smooth
}

/// Units and items can come to rest here.
pub fn gives_footing(tile_type: TileType) -> bool {
    tile_type.shape().is_walkable() && tile_type.shape().basic() != BasicShape::Open
}

/// The flood fill stops spreading at solid walls; tree walls let it through.
pub fn blocks_reveal(tile_type: TileType) -> bool {
    tile_type.is_wall() && tile_type.material() != TileMaterial::Tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(shape: TileShape, material: TileMaterial) -> TileType {
        TileType::plain(shape, material).unwrap()
    }

    #[test]
    fn stone_and_soil_are_diggable() {
        assert!(is_diggable(plain(TileShape::Wall, TileMaterial::Stone), None));
        assert!(is_diggable(plain(TileShape::Wall, TileMaterial::Soil), None));
        assert!(is_diggable(plain(TileShape::Floor, TileMaterial::GrassLight), None));
        assert!(is_diggable(TileType::open_space(), None));
    }

    #[test]
    fn constructions_liquids_and_magma_are_not() {
        for material in [
            TileMaterial::Construction,
            TileMaterial::Pool,
            TileMaterial::River,
            TileMaterial::Magma,
            TileMaterial::LavaStone,
            TileMaterial::Hfs,
        ] {
            let tt = plain(TileShape::Wall, material);
            assert!(!is_diggable(tt, None), "{material:?}");
        }
    }

    #[test]
    fn feature_material_needs_deep_tube() {
        let tt = plain(TileShape::Wall, TileMaterial::Feature);
        assert!(!is_diggable(tt, None));
        assert!(!is_diggable(tt, Some(FeatureKind::Cavern)));
        assert!(is_diggable(tt, Some(FeatureKind::DeepSpecialTube)));
    }

    #[test]
    fn smoothing_needs_rough_stone() {
        assert!(is_smoothable(plain(TileShape::Wall, TileMaterial::Mineral)));
        assert!(is_smoothable(plain(TileShape::Floor, TileMaterial::Stone)));
        assert!(!is_smoothable(plain(TileShape::Floor, TileMaterial::Soil)));
        assert!(!is_smoothable(plain(TileShape::Ramp, TileMaterial::Stone)));
        let smooth = plain(TileShape::Floor, TileMaterial::Stone)
            .with_finish(TileSpecial::Smooth, Default::default())
            .unwrap();
        assert!(!is_smoothable(smooth));
        assert!(is_trackable(smooth));
    }

    #[test]
    fn footing_excludes_open_and_walls() {
        assert!(gives_footing(plain(TileShape::Floor, TileMaterial::Stone)));
        assert!(gives_footing(plain(TileShape::StairDown, TileMaterial::Stone)));
        assert!(!gives_footing(TileType::open_space()));
        assert!(!gives_footing(plain(TileShape::RampTop, TileMaterial::Stone)));
        assert!(!gives_footing(plain(TileShape::Wall, TileMaterial::Stone)));
    }

    #[test]
    fn tree_walls_do_not_block_reveal() {
        assert!(blocks_reveal(plain(TileShape::Wall, TileMaterial::Stone)));
        assert!(!blocks_reveal(plain(TileShape::Wall, TileMaterial::Tree)));
        assert!(!blocks_reveal(plain(TileShape::Floor, TileMaterial::Stone)));
    }
}
