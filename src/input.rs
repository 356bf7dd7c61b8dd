use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::io::Read;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};

pub const DEFAULT_BASE_THRESHOLD_FRACTION: f64 = 0.2;

pub fn ingest_config(json: impl Read) -> anyhow::Result<HeatRejectionConfig> {
    let config: HeatRejectionConfig =
        serde_json::from_reader(json).context("Could not parse heat rejection config")?;
    config
        .validate()
        .map_err(|e| anyhow!("Heat rejection config is invalid: {e}"))?;

    Ok(config)
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct HeatRejectionConfig {
    /// Cooling supply system codes that reject heat through wet cooling towers
    pub cooling_tower_systems: Vec<String>,
    /// Cooling supply system codes whose buildings all share one heat rejection group
    pub district_cooling_systems: Vec<String>,
    /// Fraction of the peak load treated as continuously running base load
    #[validate(minimum = 0.)]
    #[validate(maximum = 1.)]
    pub base_threshold_fraction: f64,
    pub pump_control: PumpControl,
    /// Whether fans run at variable speed to follow the load
    pub fan_control: bool,
}

impl Default for HeatRejectionConfig {
    fn default() -> Self {
        Self {
            cooling_tower_systems: vec!["HVAC_COOLING_AS3".into(), "HVAC_COOLING_AS4".into()],
            district_cooling_systems: vec!["HVAC_COOLING_AS4".into()],
            base_threshold_fraction: DEFAULT_BASE_THRESHOLD_FRACTION,
            pump_control: Default::default(),
            fan_control: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, PartialEq, Serialize)]
pub enum PumpControl {
    /// Water flow follows the load so that the temperature range stays at its design value
    #[default]
    #[serde(rename = "Range limit")]
    #[strum(serialize = "Range limit")]
    RangeLimit,
    #[serde(rename = "Constant flow")]
    #[strum(serialize = "Constant flow")]
    ConstantFlow,
}

/// Resolves the locations of scenario inputs and outputs below a scenario directory.
#[derive(Clone, Debug)]
pub struct ScenarioLocator {
    scenario: PathBuf,
    weather_file: Option<PathBuf>,
}

impl ScenarioLocator {
    pub fn new(scenario: impl Into<PathBuf>) -> Self {
        Self {
            scenario: scenario.into(),
            weather_file: None,
        }
    }

    /// Use a weather file from outside the scenario.
    pub fn with_weather_file(mut self, weather_file: impl Into<PathBuf>) -> Self {
        self.weather_file = Some(weather_file.into());
        self
    }

    pub fn scenario(&self) -> &Path {
        &self.scenario
    }

    pub fn building_supply(&self) -> PathBuf {
        self.scenario
            .join("inputs")
            .join("building-properties")
            .join("supply_systems.csv")
    }

    pub fn supply_assemblies(&self) -> PathBuf {
        self.scenario
            .join("inputs")
            .join("technology")
            .join("assemblies")
            .join("SUPPLY_COOLING.csv")
    }

    pub fn groups(&self) -> PathBuf {
        self.scenario.join("inputs").join("groups").join("groups.csv")
    }

    pub fn weather(&self) -> PathBuf {
        match &self.weather_file {
            Some(weather_file) => weather_file.clone(),
            None => self.scenario.join("inputs").join("weather").join("weather.epw"),
        }
    }

    pub fn demand_results(&self, building: &str) -> PathBuf {
        self.scenario
            .join("outputs")
            .join("data")
            .join("demand")
            .join(format!("{building}.csv"))
    }

    pub fn heat_rejection_folder(&self) -> PathBuf {
        self.scenario
            .join("outputs")
            .join("data")
            .join("heat_rejection")
    }
}

#[derive(Debug, Deserialize)]
struct BuildingSupplyRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "type_cs")]
    cooling_supply: String,
}

/// Cooling supply system code per building, in file order.
pub type BuildingSupply = IndexMap<String, String>;

pub fn read_building_supply(csv: impl Read) -> anyhow::Result<BuildingSupply> {
    let mut supply = BuildingSupply::new();
    for row in csv::Reader::from_reader(csv).deserialize::<BuildingSupplyRow>() {
        let row = row.context("Could not read building supply systems")?;
        if supply.insert(row.name.clone(), row.cooling_supply).is_some() {
            anyhow::bail!("Building {} has more than one supply system entry", row.name);
        }
    }

    Ok(supply)
}

#[derive(Clone, Debug, Deserialize)]
pub struct SupplyAssembly {
    pub code: String,
    pub scale: String,
}

pub const DISTRICT_SCALE: &str = "DISTRICT";

/// Codes of the cooling supply assemblies that operate at district scale.
pub fn read_district_supply_codes(csv: impl Read) -> anyhow::Result<Vec<String>> {
    csv::Reader::from_reader(csv)
        .deserialize::<SupplyAssembly>()
        .filter_map_ok(|assembly| (assembly.scale == DISTRICT_SCALE).then_some(assembly.code))
        .collect::<Result<_, _>>()
        .context("Could not read cooling supply assemblies")
}

/// The three additive cooling demand components of a building for one hour, in kWh. Sign
/// conventions vary between sources, so they are normalised before being summed.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct DemandComponents {
    #[serde(rename = "DC_cs_kWh", default)]
    pub district_cooling: Option<f64>,
    #[serde(rename = "E_cs_kWh", default)]
    pub electricity_for_cooling: Option<f64>,
    #[serde(rename = "Qcs_kWh", default)]
    pub cooling_load: Option<f64>,
}

pub fn read_building_demand(csv: impl Read) -> anyhow::Result<Vec<DemandComponents>> {
    csv::Reader::from_reader(csv)
        .deserialize::<DemandComponents>()
        .collect::<Result<_, _>>()
        .context("Could not read building demand results")
}
