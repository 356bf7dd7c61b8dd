use crate::core::fleet_sizing::FleetTier;
use crate::core::psychrometrics::{AirState, AirStateSplitter, HeatSplit};
use crate::core::simulation_adapter::SimulatedFleet;
use anyhow::{anyhow, bail};
use indexmap::IndexMap;
use rayon::prelude::*;
use strum::IntoEnumIterator;

/// Hourly sensible and latent fractions of the heat rejected by a group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupFractions {
    pub sensible: Vec<f64>,
    pub latent: Vec<f64>,
}

/// Hourly heat rejected by a group, in kWh, split into sensible and latent parts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeatRejectionSeries {
    pub total: Vec<f64>,
    pub sensible: Vec<f64>,
    pub latent: Vec<f64>,
}

impl HeatRejectionSeries {
    /// Heat rejected without a cooling tower, e.g. by air-cooled chillers, is sensible only.
    pub fn all_sensible(total: &[f64]) -> Self {
        Self {
            total: total.to_vec(),
            sensible: total.to_vec(),
            latent: vec![0.; total.len()],
        }
    }

    pub fn apportion(total: &[f64], fractions: &GroupFractions) -> Self {
        Self {
            total: total.to_vec(),
            sensible: total
                .iter()
                .zip(&fractions.sensible)
                .map(|(q, fraction)| q * fraction)
                .collect(),
            latent: total
                .iter()
                .zip(&fractions.latent)
                .map(|(q, fraction)| q * fraction)
                .collect(),
        }
    }
}

/// Sensible/latent split of every simulated unit for every hour, keyed by unit id.
pub fn unit_fractions(
    fleet: &SimulatedFleet,
    ambient: &[AirState],
    splitter: &impl AirStateSplitter,
) -> anyhow::Result<IndexMap<String, Vec<HeatSplit>>> {
    fleet
        .units
        .par_iter()
        .map(|unit| -> anyhow::Result<_> {
            let simulation = fleet
                .results
                .unit(&unit.id)
                .ok_or_else(|| anyhow!("No simulation results for unit {}", unit.id))?;
            let splits = ambient
                .iter()
                .zip(&simulation.exit_air)
                .map(|(inlet, outlet)| splitter.sensible_latent_split(inlet, outlet))
                .collect();
            Ok((unit.id.clone(), splits))
        })
        .collect::<anyhow::Result<Vec<_>>>()
        .map(|fractions| fractions.into_iter().collect())
}

/// Average, hour by hour, the fractions of each group's units. Units are assigned to groups
/// through their group reference, and every group must own one unit per fleet tier.
pub fn group_fractions(
    fleet: &SimulatedFleet,
    unit_fractions: &IndexMap<String, Vec<HeatSplit>>,
    hours: usize,
) -> anyhow::Result<IndexMap<String, GroupFractions>> {
    let mut units_by_group: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for unit in &fleet.units {
        units_by_group
            .entry(unit.group.as_str())
            .or_default()
            .push(unit.id.as_str());
    }

    let tiers = FleetTier::iter().count();
    let mut fractions = IndexMap::with_capacity(units_by_group.len());
    for (group, unit_ids) in units_by_group {
        if unit_ids.len() != tiers {
            bail!(
                "Group {group} has {} cooling tower units rather than {tiers}",
                unit_ids.len()
            );
        }

        let mut sensible = vec![0.; hours];
        let mut latent = vec![0.; hours];
        for unit_id in &unit_ids {
            let splits = unit_fractions
                .get(*unit_id)
                .filter(|splits| splits.len() == hours)
                .ok_or_else(|| anyhow!("No hourly fractions for unit {unit_id}"))?;
            for (hour, split) in splits.iter().enumerate() {
                sensible[hour] += split.sensible / tiers as f64;
                latent[hour] += split.latent / tiers as f64;
            }
        }

        fractions.insert(group.to_string(), GroupFractions { sensible, latent });
    }

    Ok(fractions)
}
