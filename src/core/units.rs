use thiserror::Error;

pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_YEAR: u32 = 365;
pub const HOURS_PER_YEAR: usize = (HOURS_PER_DAY * DAYS_PER_YEAR) as usize;
pub const PERCENT: f64 = 100.;

/// Standard atmospheric pressure, in kPa
pub const ATMOSPHERIC_PRESSURE_KPA: f64 = 101.325;
/// Ratio of molar masses of water vapour and dry air
pub const MOLAR_MASS_RATIO_WATER_AIR: f64 = 0.621945;
/// Specific heat capacity of dry air, in kJ/(kg.K)
pub const SPECIFIC_HEAT_DRY_AIR: f64 = 1.006;
/// Specific heat capacity of water vapour, in kJ/(kg.K)
pub const SPECIFIC_HEAT_WATER_VAPOUR: f64 = 1.86;
/// Specific heat capacity of liquid water, in kJ/(kg.K)
pub const SPECIFIC_HEAT_WATER: f64 = 4.186;
/// Latent heat of vaporisation of water at 0 deg C, in kJ/kg
pub const LATENT_HEAT_VAPORISATION: f64 = 2501.;

pub(crate) fn celsius_to_kelvin(temp_c: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_c < -273.15 {
        Err(BelowAbsoluteZeroError::from_c(temp_c))
    } else {
        Ok(temp_c + 273.15)
    }
}

/// Convert a relative humidity in percent to a fraction in [0, 1].
///
/// Returns the fraction and whether the input had to be clipped.
pub(crate) fn percent_to_fraction_clipped(value_percent: f64) -> (f64, bool) {
    let fraction = value_percent / PERCENT;
    let clipped = fraction.clamp(0., 1.);
    (clipped, clipped != fraction)
}

#[derive(Debug, Error)]
#[error("A temperature of {k}ºK/{}ºC was encountered, which is less than absolute zero", k - 273.15)]
pub(crate) struct BelowAbsoluteZeroError {
    k: f64,
}

impl BelowAbsoluteZeroError {
    fn from_c(c: f64) -> Self {
        Self { k: c + 273.15 }
    }
}
