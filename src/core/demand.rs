use crate::core::building_groups::BuildingGroup;
use crate::errors::{HeatRejectionError, InvalidConfigurationError, MissingInputError};
use crate::input::DemandComponents;
use crate::statistics::{min_of_positive, peak};
use indexmap::IndexMap;

/// Hourly cooling demand per building, in kWh.
pub type BuildingDemands = IndexMap<String, Vec<f64>>;
/// Hourly heat rejection demand per group, in kWh, in group table order.
pub type GroupLoads = IndexMap<String, Vec<f64>>;

fn magnitude(component: Option<f64>) -> f64 {
    match component {
        Some(value) if value.is_finite() => value.abs(),
        _ => 0.,
    }
}

/// Hourly heat to be rejected for a building: the sum of the magnitudes of its cooling demand
/// components, so that differing sign conventions do not cancel out.
pub fn building_demand_series(components: &[DemandComponents]) -> Vec<f64> {
    components
        .iter()
        .map(|hour| {
            magnitude(hour.district_cooling)
                + magnitude(hour.electricity_for_cooling)
                + magnitude(hour.cooling_load)
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingLoadProperties {
    /// peak hourly load, in kWh
    pub max_load: f64,
    /// smallest non-zero load as a fraction of the peak; `None` if the building never has load
    pub min_part_load_ratio: Option<f64>,
}

pub fn building_load_properties(series: &[f64]) -> BuildingLoadProperties {
    let max_load = peak(series);
    BuildingLoadProperties {
        max_load,
        min_part_load_ratio: min_of_positive(series).map(|min_load| min_load / max_load),
    }
}

/// Sum the hourly demand of each group's member buildings. Every building series must cover
/// exactly `horizon` hours.
pub fn aggregate_group_loads<'a>(
    groups: impl IntoIterator<Item = &'a BuildingGroup>,
    building_demands: &BuildingDemands,
    horizon: usize,
) -> Result<GroupLoads, HeatRejectionError> {
    let mut group_loads = GroupLoads::new();

    for group in groups {
        let mut load = vec![0.; horizon];
        for building in &group.buildings {
            let demand = building_demands.get(building).ok_or_else(|| {
                MissingInputError::BuildingDemand {
                    building: building.clone(),
                }
            })?;
            if demand.len() != horizon {
                return Err(InvalidConfigurationError::HorizonMismatch {
                    building: building.clone(),
                    expected: horizon,
                    actual: demand.len(),
                }
                .into());
            }
            for (total, value) in load.iter_mut().zip(demand) {
                if value.is_finite() {
                    *total += value;
                }
            }
        }
        group_loads.insert(group.id.clone(), load);
    }

    Ok(group_loads)
}
