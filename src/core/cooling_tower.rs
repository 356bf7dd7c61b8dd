/// A steady-state cooling tower model, evaluated hour by hour for every unit of a fleet.
///
/// The exit air is taken to leave the tower near saturation, carrying the rejected heat as a rise
/// in enthalpy. Flows follow the load according to the pump and fan control strategies.
use crate::core::catalog::CoolingTowerCatalogEntry;
use crate::core::psychrometrics::AirState;
use crate::core::simulation_adapter::{
    SimulationRequest, SimulationResults, ThermalSimulator, UnitSimulation,
};
use crate::core::units::SPECIFIC_HEAT_WATER;
use crate::input::PumpControl;
use anyhow::bail;
use indexmap::IndexMap;
use rayon::prelude::*;

const EXIT_AIR_RELATIVE_HUMIDITY: f64 = 0.95;
const MIN_FAN_FLOW_FRACTION: f64 = 0.2;
const MIN_WATER_FLOW_FRACTION: f64 = 0.3;

#[derive(Clone, Copy, Debug)]
pub struct CoolingTowerSimulator {
    exit_relative_humidity: f64,
    min_fan_flow_fraction: f64,
    min_water_flow_fraction: f64,
}

impl Default for CoolingTowerSimulator {
    fn default() -> Self {
        Self {
            exit_relative_humidity: EXIT_AIR_RELATIVE_HUMIDITY,
            min_fan_flow_fraction: MIN_FAN_FLOW_FRACTION,
            min_water_flow_fraction: MIN_WATER_FLOW_FRACTION,
        }
    }
}

/// Operating point of one unit in one hour.
#[derive(Clone, Copy, Debug, PartialEq)]
struct HourlyOperation {
    air_flow: f64,
    water_flow: f64,
    hot_water_temperature: f64,
    return_water_flow: f64,
    exit_air: AirState,
}

impl CoolingTowerSimulator {
    pub fn new() -> Self {
        Default::default()
    }

    /// Arguments:
    /// * `model` - catalog data of the unit
    /// * `load` - heat rejected by the unit in this hour, in kW
    /// * `inlet` - ambient air entering the tower
    /// * `wet_bulb` - wet-bulb temperature of the inlet air, in deg C
    fn operate(
        &self,
        model: &CoolingTowerCatalogEntry,
        load: f64,
        inlet: &AirState,
        wet_bulb: f64,
        pump_control: PumpControl,
        fan_control: bool,
    ) -> anyhow::Result<HourlyOperation> {
        let load = load.max(0.);
        let part_load = load / model.capacity;

        let air_flow = if fan_control {
            model.design_air_flow * part_load.max(self.min_fan_flow_fraction)
        } else {
            model.design_air_flow
        };
        let water_flow = match pump_control {
            PumpControl::RangeLimit => {
                model.design_water_flow * part_load.max(self.min_water_flow_fraction)
            }
            PumpControl::ConstantFlow => model.design_water_flow,
        };

        let cold_water_temperature = wet_bulb + model.design_approach * part_load.min(1.);
        let hot_water_temperature =
            cold_water_temperature + load / (water_flow * SPECIFIC_HEAT_WATER);

        let exit_air = if load > 0. {
            AirState::from_enthalpy_and_relative_humidity(
                inlet.enthalpy() + load / air_flow,
                inlet.relative_humidity.max(self.exit_relative_humidity),
            )?
        } else {
            *inlet
        };
        let evaporation = air_flow * (exit_air.humidity_ratio - inlet.humidity_ratio).max(0.);

        Ok(HourlyOperation {
            air_flow,
            water_flow,
            hot_water_temperature,
            return_water_flow: water_flow - evaporation,
            exit_air,
        })
    }
}

impl ThermalSimulator for CoolingTowerSimulator {
    fn simulate(&self, request: &SimulationRequest) -> anyhow::Result<SimulationResults> {
        if request.unit_loads.len() != request.units.len() {
            bail!(
                "Got load series for {} units but {} units to simulate",
                request.unit_loads.len(),
                request.units.len()
            );
        }

        let wet_bulbs = request
            .ambient
            .par_iter()
            .map(AirState::wet_bulb)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let simulations = request
            .units
            .par_iter()
            .zip(request.unit_loads.par_iter())
            .map(|(unit, loads)| -> anyhow::Result<_> {
                if loads.len() != request.ambient.len() {
                    bail!(
                        "Load series of unit {} covers {} hours rather than {}",
                        unit.id,
                        loads.len(),
                        request.ambient.len()
                    );
                }
                let mut simulation = UnitSimulation::default();
                for ((load, inlet), wet_bulb) in loads.iter().zip(request.ambient).zip(&wet_bulbs) {
                    let operation = self.operate(
                        &unit.model,
                        *load,
                        inlet,
                        *wet_bulb,
                        request.pump_control,
                        request.fan_control,
                    )?;
                    simulation.air_flow.push(operation.air_flow);
                    simulation.water_flow.push(operation.water_flow);
                    simulation
                        .hot_water_temperature
                        .push(operation.hot_water_temperature);
                    simulation.return_water_flow.push(operation.return_water_flow);
                    simulation.exit_air.push(operation.exit_air);
                }
                Ok((unit.id.clone(), simulation))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(SimulationResults::new(
            simulations.into_iter().collect::<IndexMap<_, _>>(),
        ))
    }
}
