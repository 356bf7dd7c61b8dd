use crate::core::catalog::CoolingTowerCatalog;
use crate::core::demand::GroupLoads;
use crate::errors::UnsatisfiableSizingError;
use crate::statistics::{mean_of_positive, peak};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use strum_macros::{Display, EnumIter};

/// This module sizes a three unit cooling tower fleet for each group from its annual load profile.

#[derive(Clone, Copy, Debug, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum FleetTier {
    Peak,
    Intermediate,
    Base,
}

/// Catalog capacities (kW) selected for a group's three units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FleetSizing {
    pub peak: f64,
    pub intermediate: f64,
    pub base: f64,
}

impl FleetSizing {
    pub fn capacity(&self, tier: FleetTier) -> f64 {
        match tier {
            FleetTier::Peak => self.peak,
            FleetTier::Intermediate => self.intermediate,
            FleetTier::Base => self.base,
        }
    }
}

/// Split of a load profile into the theoretical sizes of peak, intermediate and base units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadDecomposition {
    pub peak: f64,
    /// mean over the hours with non-zero load
    pub average: f64,
    pub baseload: f64,
}

impl LoadDecomposition {
    pub fn new(load: &[f64], base_threshold_fraction: f64) -> Self {
        let peak = peak(load);
        Self {
            peak,
            // a profile without load has no operating point, so every unit size collapses to zero
            average: mean_of_positive(load).unwrap_or(0.),
            baseload: base_threshold_fraction * peak,
        }
    }

    pub fn unit_size(&self, tier: FleetTier) -> f64 {
        match tier {
            FleetTier::Peak => self.peak - self.average,
            FleetTier::Intermediate => self.average - self.baseload,
            FleetTier::Base => self.baseload,
        }
    }
}

/// Round a theoretical unit size up to an available catalog capacity.
///
/// Sizes at or below the smallest capacity get the smallest capacity; an exact match is preferred
/// over the next larger capacity. Returns `None` when the size exceeds every capacity.
pub fn match_to_catalog(size: f64, catalog: &CoolingTowerCatalog) -> Option<f64> {
    if size <= catalog.min_capacity() {
        return Some(catalog.min_capacity());
    }

    catalog.smallest_at_least(size).map(|entry| entry.capacity)
}

#[derive(Clone, Copy, Debug)]
pub struct FleetSizingEngine<'a> {
    catalog: &'a CoolingTowerCatalog,
    base_threshold_fraction: f64,
}

impl<'a> FleetSizingEngine<'a> {
    /// Arguments:
    /// * `catalog` - the cooling tower units that can be selected
    /// * `base_threshold_fraction` - fraction of the peak load treated as continuously running base load
    pub fn new(catalog: &'a CoolingTowerCatalog, base_threshold_fraction: f64) -> Self {
        Self {
            catalog,
            base_threshold_fraction,
        }
    }

    pub fn size_group(
        &self,
        group: &str,
        load: &[f64],
    ) -> Result<FleetSizing, UnsatisfiableSizingError> {
        let decomposition = LoadDecomposition::new(load, self.base_threshold_fraction);
        let select = |tier: FleetTier| {
            let size = decomposition.unit_size(tier);
            match_to_catalog(size, self.catalog).ok_or_else(|| UnsatisfiableSizingError {
                group: group.to_string(),
                tier,
                size,
                max_capacity: self.catalog.max_capacity(),
            })
        };

        Ok(FleetSizing {
            peak: select(FleetTier::Peak)?,
            intermediate: select(FleetTier::Intermediate)?,
            base: select(FleetTier::Base)?,
        })
    }

    /// Size every group, keeping group order. Fails on the first group that the catalog cannot serve.
    pub fn size_fleet(
        &self,
        group_loads: &GroupLoads,
    ) -> Result<IndexMap<String, FleetSizing>, UnsatisfiableSizingError> {
        group_loads
            .iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(group, load)| {
                self.size_group(group, load)
                    .map(|sizing| (group.clone(), sizing))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|sized| sized.into_iter().collect())
    }
}
