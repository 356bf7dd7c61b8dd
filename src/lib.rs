pub mod core;
pub mod errors;
pub mod input;
pub mod output;
pub mod read_weather_file;
pub mod simulation_time;
mod statistics;

pub use crate::core::catalog::CoolingTowerCatalog;
pub use crate::core::cooling_tower::CoolingTowerSimulator;
pub use crate::core::psychrometrics::EnthalpySplitter;
pub use crate::errors::HeatRejectionError;
pub use crate::input::{ingest_config, HeatRejectionConfig, ScenarioLocator};

use crate::core::apportionment::{group_fractions, unit_fractions, HeatRejectionSeries};
use crate::core::building_groups::{classify_building_groups, GroupTable};
use crate::core::demand::{
    aggregate_group_loads, building_demand_series, building_load_properties, BuildingDemands,
    BuildingLoadProperties,
};
use crate::core::fleet_sizing::FleetSizingEngine;
use crate::core::psychrometrics::AirStateSplitter;
use crate::core::results::HeatRejectionRecord;
use crate::core::simulation_adapter::{
    AmbientConditions, DataQualityWarning, SimulationAdapter, ThermalSimulator,
};
use crate::core::supply_validation::validate_group_supply;
use crate::errors::MissingInputError;
use crate::input::{
    read_building_demand, read_building_supply, read_district_supply_codes, BuildingSupply,
};
use crate::output::Output;
use crate::read_weather_file::{weather_data_from_epw, WeatherData};
use crate::simulation_time::hourly_timestamps;
use anyhow::Context;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info, warn};

fn open_file(path: &Path) -> anyhow::Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).with_context(|| {
        format!("Could not open {}", path.display())
    })?))
}

/// Partition the scenario's buildings into heat rejection groups and write the group table,
/// replacing any existing one.
pub fn create_building_groups(
    locator: &ScenarioLocator,
    config: &HeatRejectionConfig,
) -> anyhow::Result<GroupTable> {
    let building_supply = read_building_supply(open_file(&locator.building_supply())?)?;

    let mut shared_systems: HashSet<String> =
        config.district_cooling_systems.iter().cloned().collect();
    let assemblies = locator.supply_assemblies();
    if assemblies.exists() {
        shared_systems.extend(read_district_supply_codes(open_file(&assemblies)?)?);
    }

    let groups_path = locator.groups();
    if groups_path.exists() {
        warn!(
            "Existing building groups at {} will be replaced",
            groups_path.display()
        );
    }

    let table = classify_building_groups(&building_supply, &shared_systems);
    if let Some(groups_folder) = groups_path.parent() {
        std::fs::create_dir_all(groups_folder)?;
    }
    table.write_csv(BufWriter::new(File::create(&groups_path)?))?;
    info!(
        "Wrote {} building groups to {}",
        table.len(),
        groups_path.display()
    );

    Ok(table)
}

/// Everything read from a scenario for one heat rejection run.
#[derive(Clone, Debug)]
pub struct HeatRejectionInputs {
    pub group_table: GroupTable,
    pub building_supply: BuildingSupply,
    /// hourly cooling demand per building, in kWh
    pub building_demands: BuildingDemands,
    pub weather: WeatherData,
}

#[derive(Clone, Debug)]
pub struct HeatRejectionResults {
    /// one record per group, in group table order
    pub records: Vec<HeatRejectionRecord>,
    pub building_properties: IndexMap<String, BuildingLoadProperties>,
    pub warnings: Vec<DataQualityWarning>,
}

/// Size cooling tower fleets, simulate them and split every group's rejected heat into its
/// sensible and latent parts.
pub fn calculate_heat_rejection(
    inputs: &HeatRejectionInputs,
    config: &HeatRejectionConfig,
    catalog: &CoolingTowerCatalog,
    simulator: &impl ThermalSimulator,
    splitter: &impl AirStateSplitter,
) -> Result<HeatRejectionResults, HeatRejectionError> {
    let cooling_tower_systems: HashSet<String> =
        config.cooling_tower_systems.iter().cloned().collect();
    let validated = validate_group_supply(
        &inputs.group_table,
        &inputs.building_supply,
        &cooling_tower_systems,
    )?;

    let ambient = AmbientConditions::from_weather(
        &inputs.weather.air_temperatures,
        &inputs.weather.relative_humidities,
    )?;
    let hours = ambient.hours();

    let building_properties = inputs
        .building_demands
        .iter()
        .map(|(building, series)| (building.clone(), building_load_properties(series)))
        .collect::<IndexMap<_, _>>();
    for (building, properties) in &building_properties {
        debug!(
            "Building {building}: maximum load {} kWh, minimum part load ratio {:?}",
            properties.max_load, properties.min_part_load_ratio
        );
    }

    let cooling_tower_loads = aggregate_group_loads(
        validated.with_cooling_tower.iter().map(|c| &c.group),
        &inputs.building_demands,
        hours,
    )?;
    let other_loads = aggregate_group_loads(
        validated.without_cooling_tower.iter().map(|c| &c.group),
        &inputs.building_demands,
        hours,
    )?;

    let (fleet, fractions) = if cooling_tower_loads.is_empty() {
        info!("No building group rejects heat through cooling towers; skipping the cooling tower heat rejection calculation");
        (IndexMap::new(), IndexMap::new())
    } else {
        let fleet = FleetSizingEngine::new(catalog, config.base_threshold_fraction)
            .size_fleet(&cooling_tower_loads)?;
        let simulated = SimulationAdapter::new(simulator, config.pump_control, config.fan_control)
            .simulate_fleet(&fleet, catalog, &cooling_tower_loads, &ambient)?;
        let unit_fractions = unit_fractions(&simulated, &ambient.air_states, splitter)?;
        let fractions = group_fractions(&simulated, &unit_fractions, hours)?;
        (fleet, fractions)
    };

    let timestamps = hourly_timestamps(inputs.weather.year, hours)?;
    let mut records = Vec::with_capacity(inputs.group_table.len());
    for classified in validated.all_in_order(&inputs.group_table) {
        let id = &classified.group.id;
        let heat_rejection = match (cooling_tower_loads.get(id), fractions.get(id)) {
            (Some(load), Some(group_fractions)) => {
                HeatRejectionSeries::apportion(load, group_fractions)
            }
            _ => {
                let load = other_loads.get(id).with_context(|| {
                    format!("No aggregated load for group {id}")
                })?;
                HeatRejectionSeries::all_sensible(load)
            }
        };
        records.push(HeatRejectionRecord {
            group: classified.group.clone(),
            supply_system: classified.supply_system.clone(),
            timestamps: timestamps.clone(),
            heat_rejection,
            fleet: fleet.get(id).copied(),
        });
    }

    Ok(HeatRejectionResults {
        records,
        building_properties,
        warnings: ambient.warnings,
    })
}

/// Read a scenario's group table, supply systems, demand results and weather, run the heat
/// rejection calculation and write one record per group to the output.
pub fn run_heat_rejection(
    locator: &ScenarioLocator,
    config: &HeatRejectionConfig,
    catalog: &CoolingTowerCatalog,
    simulator: &impl ThermalSimulator,
    splitter: &impl AirStateSplitter,
    output: impl Output,
) -> Result<HeatRejectionResults, HeatRejectionError> {
    let groups_path = locator.groups();
    if !groups_path.exists() {
        return Err(MissingInputError::GroupTable {
            path: groups_path.display().to_string(),
        }
        .into());
    }
    let group_table = GroupTable::from_csv(open_file(&groups_path)?)?;
    let building_supply = read_building_supply(open_file(&locator.building_supply())?)?;

    let mut building_demands = BuildingDemands::new();
    for building in group_table.groups().iter().flat_map(|group| &group.buildings) {
        let demand_path = locator.demand_results(building);
        if !demand_path.exists() {
            return Err(MissingInputError::BuildingDemand {
                building: building.clone(),
            }
            .into());
        }
        let components = read_building_demand(open_file(&demand_path)?)
            .with_context(|| format!("Could not read demand of building {building}"))?;
        building_demands.insert(building.clone(), building_demand_series(&components));
    }

    let weather = weather_data_from_epw(open_file(&locator.weather())?)?;

    let results = calculate_heat_rejection(
        &HeatRejectionInputs {
            group_table,
            building_supply,
            building_demands,
            weather,
        },
        config,
        catalog,
        simulator,
        splitter,
    )?;

    if !output.is_noop() {
        for record in &results.records {
            record.write(&output)?;
        }
        info!("Wrote heat rejection for {} groups", results.records.len());
    }

    Ok(results)
}
