/// Moist air properties at standard atmospheric pressure, and the sensible/latent split of the
/// heat carried between two air states.
use crate::core::solvers::root_in_bracket;
use crate::core::units::{
    ATMOSPHERIC_PRESSURE_KPA, LATENT_HEAT_VAPORISATION, MOLAR_MASS_RATIO_WATER_AIR,
    SPECIFIC_HEAT_DRY_AIR, SPECIFIC_HEAT_WATER, SPECIFIC_HEAT_WATER_VAPOUR,
};
use serde::Serialize;

// Bracket used when solving for a dry-bulb temperature, in deg C
const SOLVER_TEMP_MIN: f64 = -60.;
const SOLVER_TEMP_MAX: f64 = 80.;

// Below this change in enthalpy (kJ/kg) the split between two states is not meaningful
const NEGLIGIBLE_ENTHALPY_CHANGE: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AirState {
    /// dry-bulb temperature, in deg C
    pub dry_bulb: f64,
    /// relative humidity, as a fraction in [0, 1]
    pub relative_humidity: f64,
    /// humidity ratio, in kg water vapour per kg dry air
    pub humidity_ratio: f64,
}

impl AirState {
    pub fn from_relative_humidity(dry_bulb: f64, relative_humidity: f64) -> Self {
        Self {
            dry_bulb,
            relative_humidity,
            humidity_ratio: humidity_ratio(dry_bulb, relative_humidity),
        }
    }

    pub fn from_humidity_ratio(dry_bulb: f64, humidity_ratio: f64) -> Self {
        let vapour_pressure =
            humidity_ratio * ATMOSPHERIC_PRESSURE_KPA / (MOLAR_MASS_RATIO_WATER_AIR + humidity_ratio);
        Self {
            dry_bulb,
            relative_humidity: vapour_pressure / saturation_pressure(dry_bulb),
            humidity_ratio,
        }
    }

    /// Specific enthalpy of the moist air, in kJ per kg dry air
    pub fn enthalpy(&self) -> f64 {
        enthalpy(self.dry_bulb, self.humidity_ratio)
    }

    /// Thermodynamic wet-bulb temperature, in deg C
    pub fn wet_bulb(&self) -> anyhow::Result<f64> {
        if self.relative_humidity >= 1. {
            return Ok(self.dry_bulb);
        }
        let target = self.enthalpy();
        let w = self.humidity_ratio;
        let residual = |t_wb: f64| {
            let w_sat = humidity_ratio(t_wb, 1.);
            enthalpy(t_wb, w_sat) - (w_sat - w) * SPECIFIC_HEAT_WATER * t_wb - target
        };
        if residual(self.dry_bulb) <= 0. {
            return Ok(self.dry_bulb);
        }

        root_in_bracket(residual, SOLVER_TEMP_MIN, self.dry_bulb, None)
    }

    /// Find the air state with the given enthalpy (kJ/kg) and relative humidity.
    pub fn from_enthalpy_and_relative_humidity(
        enthalpy_target: f64,
        relative_humidity: f64,
    ) -> anyhow::Result<Self> {
        let dry_bulb = root_in_bracket(
            |t| enthalpy(t, humidity_ratio(t, relative_humidity)) - enthalpy_target,
            SOLVER_TEMP_MIN,
            SOLVER_TEMP_MAX,
            None,
        )?;

        Ok(Self::from_relative_humidity(dry_bulb, relative_humidity))
    }
}

/// Saturation vapour pressure over water (Magnus formula), in kPa
pub fn saturation_pressure(dry_bulb: f64) -> f64 {
    0.61094 * (17.625 * dry_bulb / (dry_bulb + 243.04)).exp()
}

/// Humidity ratio in kg/kg for a dry-bulb temperature (deg C) and relative humidity (fraction)
pub fn humidity_ratio(dry_bulb: f64, relative_humidity: f64) -> f64 {
    let vapour_pressure = relative_humidity * saturation_pressure(dry_bulb);
    MOLAR_MASS_RATIO_WATER_AIR * vapour_pressure / (ATMOSPHERIC_PRESSURE_KPA - vapour_pressure)
}

pub fn enthalpy(dry_bulb: f64, humidity_ratio: f64) -> f64 {
    SPECIFIC_HEAT_DRY_AIR * dry_bulb
        + humidity_ratio * (LATENT_HEAT_VAPORISATION + SPECIFIC_HEAT_WATER_VAPOUR * dry_bulb)
}

/// Fractions of a heat flow carried as sensible and as latent heat. They always sum to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatSplit {
    pub sensible: f64,
    pub latent: f64,
}

impl HeatSplit {
    pub fn all_sensible() -> Self {
        Self {
            sensible: 1.,
            latent: 0.,
        }
    }
}

/// Computes the sensible/latent split of the heat picked up by air going from one state to another.
pub trait AirStateSplitter: Sync {
    fn sensible_latent_split(&self, inlet: &AirState, outlet: &AirState) -> HeatSplit;
}

/// Splits the enthalpy rise between two states into the latent part carried by the added
/// moisture and the sensible remainder.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnthalpySplitter;

impl AirStateSplitter for EnthalpySplitter {
    fn sensible_latent_split(&self, inlet: &AirState, outlet: &AirState) -> HeatSplit {
        let total = outlet.enthalpy() - inlet.enthalpy();
        if total.abs() < NEGLIGIBLE_ENTHALPY_CHANGE {
            return HeatSplit::all_sensible();
        }

        let latent = (outlet.humidity_ratio - inlet.humidity_ratio)
            * (LATENT_HEAT_VAPORISATION + SPECIFIC_HEAT_WATER_VAPOUR * outlet.dry_bulb);
        let latent_fraction = latent / total;

        HeatSplit {
            sensible: 1. - latent_fraction,
            latent: latent_fraction,
        }
    }
}
