use crate::core::catalog::{CoolingTowerCatalog, CoolingTowerCatalogEntry};
use crate::core::demand::GroupLoads;
use crate::core::fleet_sizing::{FleetSizing, FleetTier};
use crate::core::psychrometrics::AirState;
use crate::core::units::{celsius_to_kelvin, percent_to_fraction_clipped};
use crate::input::PumpControl;
use anyhow::{anyhow, bail};
use indexmap::IndexMap;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

/// Non-fatal problems found in the input data, which were corrected before the calculation.
#[derive(Clone, Debug, PartialEq)]
pub enum DataQualityWarning {
    /// Relative humidity above 100% was clamped to 100%
    RelativeHumidityClamped { hours: usize, max_percent: f64 },
}

/// Hourly state of the air entering the cooling towers.
#[derive(Clone, Debug)]
pub struct AmbientConditions {
    pub air_states: Vec<AirState>,
    pub warnings: Vec<DataQualityWarning>,
}

impl AmbientConditions {
    /// Arguments:
    /// * `dry_bulb_temperatures` - hourly dry-bulb temperatures, in deg C
    /// * `relative_humidities` - hourly relative humidities, in percent
    pub fn from_weather(
        dry_bulb_temperatures: &[f64],
        relative_humidities: &[f64],
    ) -> anyhow::Result<Self> {
        if dry_bulb_temperatures.len() != relative_humidities.len() {
            bail!(
                "Weather has {} dry-bulb temperatures but {} relative humidities",
                dry_bulb_temperatures.len(),
                relative_humidities.len()
            );
        }

        let mut warnings = vec![];
        let over_saturated = relative_humidities
            .iter()
            .filter(|rh| **rh > 100.)
            .copied()
            .collect::<Vec<_>>();
        if !over_saturated.is_empty() {
            let max_percent = over_saturated.iter().copied().fold(f64::MIN, f64::max);
            warn!(
                "Weather has relative humidity above 100% in {} hours (maximum {max_percent}%). A maximum of 100% will be considered.",
                over_saturated.len()
            );
            warnings.push(DataQualityWarning::RelativeHumidityClamped {
                hours: over_saturated.len(),
                max_percent,
            });
        }

        let air_states = dry_bulb_temperatures
            .iter()
            .zip(relative_humidities)
            .map(|(dry_bulb, rh_percent)| -> anyhow::Result<_> {
                celsius_to_kelvin(*dry_bulb)?;
                let (rh, _) = percent_to_fraction_clipped(*rh_percent);
                Ok(AirState::from_relative_humidity(*dry_bulb, rh))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            air_states,
            warnings,
        })
    }

    pub fn hours(&self) -> usize {
        self.air_states.len()
    }
}

/// A sized cooling tower unit, carrying a reference to the group it serves.
#[derive(Clone, Debug, PartialEq)]
pub struct CoolingTowerUnit {
    pub id: String,
    pub group: String,
    pub tier: FleetTier,
    pub model: CoolingTowerCatalogEntry,
}

/// Flatten the fleet into one list of units, three per group, ordered peak/intermediate/base
/// within each group and numbered sequentially.
pub fn flatten_fleet(
    fleet: &IndexMap<String, FleetSizing>,
    catalog: &CoolingTowerCatalog,
) -> anyhow::Result<Vec<CoolingTowerUnit>> {
    let mut units = Vec::with_capacity(fleet.len() * 3);
    for (group, sizing) in fleet {
        for tier in FleetTier::iter() {
            let capacity = sizing.capacity(tier);
            let model = catalog.entry_for_capacity(capacity).ok_or_else(|| {
                anyhow!("No catalog entry with capacity {capacity} kW for the {tier} unit of group {group}")
            })?;
            units.push(CoolingTowerUnit {
                id: format!("CT{}", units.len()),
                group: group.clone(),
                tier,
                model: model.clone(),
            });
        }
    }

    Ok(units)
}

/// Share an hourly group load between the fleet's units: the base unit is loaded first, then the
/// intermediate unit, and the peak unit takes the remainder.
///
/// Returns one series per tier, in peak/intermediate/base order.
pub fn dispatch_group_load(group: &str, load: &[f64], sizing: &FleetSizing) -> [Vec<f64>; 3] {
    let mut peak = Vec::with_capacity(load.len());
    let mut intermediate = Vec::with_capacity(load.len());
    let mut base = Vec::with_capacity(load.len());
    let mut overloaded_hours = 0;

    for &hour_load in load {
        let base_share = hour_load.min(sizing.base);
        let intermediate_share = (hour_load - base_share).min(sizing.intermediate);
        let peak_share = hour_load - base_share - intermediate_share;
        if peak_share > sizing.peak {
            overloaded_hours += 1;
        }
        base.push(base_share);
        intermediate.push(intermediate_share);
        peak.push(peak_share);
    }

    if overloaded_hours > 0 {
        warn!("Load of group {group} exceeds the capacity of its cooling towers in {overloaded_hours} hours; the excess is assigned to the peak unit");
    }

    [peak, intermediate, base]
}

/// Everything the thermal simulator needs for one run over the whole horizon.
#[derive(Debug)]
pub struct SimulationRequest<'a> {
    pub units: &'a [CoolingTowerUnit],
    /// hourly heat load per unit, in kW, in the same order as `units`
    pub unit_loads: &'a [Vec<f64>],
    pub ambient: &'a [AirState],
    pub pump_control: PumpControl,
    pub fan_control: bool,
}

/// Hourly simulated operation of one cooling tower unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitSimulation {
    /// air mass flow, in kg/s
    pub air_flow: Vec<f64>,
    /// water mass flow, in kg/s
    pub water_flow: Vec<f64>,
    /// hot water temperature, in deg C
    pub hot_water_temperature: Vec<f64>,
    /// water mass flow returning after evaporation losses, in kg/s
    pub return_water_flow: Vec<f64>,
    pub exit_air: Vec<AirState>,
}

impl UnitSimulation {
    fn hours(&self) -> [usize; 5] {
        [
            self.air_flow.len(),
            self.water_flow.len(),
            self.hot_water_temperature.len(),
            self.return_water_flow.len(),
            self.exit_air.len(),
        ]
    }
}

/// Simulation output keyed by unit identifier.
#[derive(Clone, Debug, Default)]
pub struct SimulationResults {
    units: IndexMap<String, UnitSimulation>,
}

impl SimulationResults {
    pub fn new(units: IndexMap<String, UnitSimulation>) -> Self {
        Self { units }
    }

    pub fn unit(&self, unit_id: &str) -> Option<&UnitSimulation> {
        self.units.get(unit_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UnitSimulation)> {
        self.units.iter()
    }
}

pub trait ThermalSimulator: Sync {
    fn simulate(&self, request: &SimulationRequest) -> anyhow::Result<SimulationResults>;
}

/// Sized units together with their simulated operation.
#[derive(Clone, Debug)]
pub struct SimulatedFleet {
    pub units: Vec<CoolingTowerUnit>,
    pub results: SimulationResults,
}

pub struct SimulationAdapter<'a, S: ThermalSimulator> {
    simulator: &'a S,
    pump_control: PumpControl,
    fan_control: bool,
}

impl<'a, S: ThermalSimulator> SimulationAdapter<'a, S> {
    pub fn new(simulator: &'a S, pump_control: PumpControl, fan_control: bool) -> Self {
        Self {
            simulator,
            pump_control,
            fan_control,
        }
    }

    /// Run the simulator once for every unit of the fleet over the whole horizon.
    pub fn simulate_fleet(
        &self,
        fleet: &IndexMap<String, FleetSizing>,
        catalog: &CoolingTowerCatalog,
        group_loads: &GroupLoads,
        ambient: &AmbientConditions,
    ) -> anyhow::Result<SimulatedFleet> {
        let units = flatten_fleet(fleet, catalog)?;

        let mut unit_loads = Vec::with_capacity(units.len());
        for (group, sizing) in fleet {
            let load = group_loads
                .get(group)
                .ok_or_else(|| anyhow!("No load series for sized group {group}"))?;
            unit_loads.extend(dispatch_group_load(group, load, sizing));
        }

        debug!(
            "Simulating {} cooling tower units over {} hours with pump control '{}' and fan control {}",
            units.len(),
            ambient.hours(),
            self.pump_control,
            self.fan_control
        );
        let results = self.simulator.simulate(&SimulationRequest {
            units: &units,
            unit_loads: &unit_loads,
            ambient: &ambient.air_states,
            pump_control: self.pump_control,
            fan_control: self.fan_control,
        })?;

        for unit in &units {
            let simulation = results
                .unit(&unit.id)
                .ok_or_else(|| anyhow!("Simulator returned no results for unit {}", unit.id))?;
            if simulation.hours().iter().any(|hours| *hours != ambient.hours()) {
                bail!(
                    "Simulator results for unit {} do not cover the {} hour horizon",
                    unit.id,
                    ambient.hours()
                );
            }
        }

        Ok(SimulatedFleet { units, results })
    }
}
