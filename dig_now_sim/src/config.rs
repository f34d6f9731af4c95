// Pass configuration.
//
// Everything an invocation can tune lives in `DigConfig`, loadable from JSON.
// Missing fields fall back to their defaults, so `{}` is a valid config that
// digs the whole map with the stock boulder odds.

use crate::error::DigError;
use crate::types::{Cuboid, MapPos};
use crate::yields::YieldBucket;
use serde::{Deserialize, Serialize};

/// Chance, in percent, that a dug wall leaves an item, per source category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoulderPercents {
    /// Plain layer stone.
    pub layer: u32,
    /// Veins and large clusters.
    pub vein: u32,
    /// Small clusters and single-tile clusters.
    pub small_cluster: u32,
    /// Deep feature material.
    pub deep: u32,
}

impl Default for BoulderPercents {
    fn default() -> Self {
        Self {
            layer: 25,
            vein: 33,
            small_cluster: 100,
            deep: 100,
        }
    }
}

impl BoulderPercents {
    /// Same odds for every category.
    pub fn uniform(percent: u32) -> Self {
        Self {
            layer: percent,
            vein: percent,
            small_cluster: percent,
            deep: percent,
        }
    }

    pub fn for_bucket(&self, bucket: YieldBucket) -> u32 {
        match bucket {
            YieldBucket::Layer => self.layer,
            YieldBucket::Vein => self.vein,
            YieldBucket::SmallCluster => self.small_cluster,
            YieldBucket::Deep => self.deep,
        }
    }

    fn validate(&self) -> Result<(), DigError> {
        for bucket in YieldBucket::ALL {
            let value = self.for_bucket(bucket);
            if value > 100 {
                return Err(DigError::PercentOutOfRange { bucket, value });
            }
        }
        Ok(())
    }
}

/// Options for one dig-now invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigConfig {
    pub boulder_percents: BoulderPercents,
    /// Region to resolve. `None` means the whole map.
    pub region: Option<Cuboid>,
    /// Where produced items go. `None` leaves each item at its source tile.
    pub dump_pos: Option<MapPos>,
    /// Largest item count a single production request may ask for.
    pub max_items_per_batch: u32,
    /// Seed for the yield roll stream when the caller supplies none.
    pub seed: u64,
}

impl Default for DigConfig {
    fn default() -> Self {
        Self {
            boulder_percents: BoulderPercents::default(),
            region: None,
            dump_pos: None,
            max_items_per_batch: i16::MAX as u32,
            seed: 0,
        }
    }
}

impl DigConfig {
    pub fn validate(&self) -> Result<(), DigError> {
        self.boulder_percents.validate()?;
        if self.max_items_per_batch == 0 {
            return Err(DigError::ZeroBatchSize);
        }
        Ok(())
    }

    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, DigError> {
        let config: DigConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, DigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
