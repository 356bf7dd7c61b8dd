use crate::errors::InvalidConfigurationError;
use anyhow::Context;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Cursor, Read};

/// This module holds the table of purchasable cooling tower units.

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CoolingTowerCatalogEntry {
    #[serde(rename = "CT")]
    pub id: String,
    #[serde(rename = "Capacity [kW]")]
    pub capacity: f64,
    #[serde(rename = "Fan diameter [m]")]
    pub fan_diameter: f64,
    #[serde(rename = "Design air flow [kg/s]")]
    pub design_air_flow: f64,
    #[serde(rename = "Design water flow [kg/s]")]
    pub design_water_flow: f64,
    #[serde(rename = "Design range [K]")]
    pub design_range: f64,
    #[serde(rename = "Design approach [K]")]
    pub design_approach: f64,
    #[serde(rename = "Fan power [kW]")]
    pub fan_power: f64,
}

/// Cooling tower catalog, sorted by ascending capacity. Capacities are strictly positive and unique.
#[derive(Clone, Debug)]
pub struct CoolingTowerCatalog {
    entries: Vec<CoolingTowerCatalogEntry>,
}

impl CoolingTowerCatalog {
    pub fn new(entries: Vec<CoolingTowerCatalogEntry>) -> Result<Self, InvalidConfigurationError> {
        if entries.is_empty() {
            return Err(InvalidConfigurationError::EmptyCatalog);
        }
        if let Some(entry) = entries
            .iter()
            .find(|entry| entry.capacity.is_nan() || entry.capacity <= 0.)
        {
            return Err(InvalidConfigurationError::NonPositiveCapacity {
                id: entry.id.clone(),
                capacity: entry.capacity,
            });
        }

        let entries = entries
            .into_iter()
            .sorted_by_key(|entry| OrderedFloat(entry.capacity))
            .collect_vec();
        if let Some((_, duplicate)) = entries
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.capacity == b.capacity)
        {
            return Err(InvalidConfigurationError::DuplicateCapacity {
                capacity: duplicate.capacity,
            });
        }

        Ok(Self { entries })
    }

    pub fn from_csv(csv: impl Read) -> anyhow::Result<Self> {
        let entries = csv::Reader::from_reader(csv)
            .deserialize::<CoolingTowerCatalogEntry>()
            .collect::<Result<Vec<_>, _>>()
            .context("Could not read cooling tower catalog")?;

        Ok(Self::new(entries)?)
    }

    /// The catalog shipped with the crate.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_csv(BufReader::new(Cursor::new(include_str!(
            "../data/catalog.csv"
        ))))
    }

    pub fn entries(&self) -> &[CoolingTowerCatalogEntry] {
        &self.entries
    }

    pub fn capacities(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.capacity).collect()
    }

    pub fn min_capacity(&self) -> f64 {
        self.entries[0].capacity
    }

    pub fn max_capacity(&self) -> f64 {
        self.entries[self.entries.len() - 1].capacity
    }

    /// Smallest catalog entry whose capacity is at least `size`, if any.
    pub fn smallest_at_least(&self, size: f64) -> Option<&CoolingTowerCatalogEntry> {
        let idx = self.entries.partition_point(|entry| entry.capacity < size);
        self.entries.get(idx)
    }

    pub fn entry_for_capacity(&self, capacity: f64) -> Option<&CoolingTowerCatalogEntry> {
        self.entries
            .binary_search_by_key(&OrderedFloat(capacity), |entry| OrderedFloat(entry.capacity))
            .ok()
            .map(|idx| &self.entries[idx])
    }
}

#[cfg(test)]
pub(crate) fn catalog_with_capacities(capacities: &[f64]) -> CoolingTowerCatalog {
    CoolingTowerCatalog::new(
        capacities
            .iter()
            .enumerate()
            .map(|(i, &capacity)| CoolingTowerCatalogEntry {
                id: format!("CT{:02}", i + 1),
                capacity,
                fan_diameter: 1.,
                design_air_flow: capacity / 25.,
                design_water_flow: capacity / (4.186 * 5.5),
                design_range: 5.5,
                design_approach: 4.,
                fan_power: capacity * 0.0085,
            })
            .collect(),
    )
    .unwrap()
}
