use crate::core::fleet_sizing::FleetTier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeatRejectionError {
    #[error("Missing input data: {0}")]
    MissingInput(#[from] MissingInputError),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] InvalidConfigurationError),
    #[error("Unsatisfiable cooling tower sizing: {0}")]
    UnsatisfiableSizing(#[from] UnsatisfiableSizingError),
    #[error("Error identified during heat rejection calculation: {0}")]
    FailureInCalculation(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum MissingInputError {
    #[error("Missing building groups data in scenario (expected at {path}). Consider running the building groups helper first.")]
    GroupTable { path: String },
    #[error("No demand results found for building {building}")]
    BuildingDemand { building: String },
}

#[derive(Debug, Error)]
pub enum InvalidConfigurationError {
    #[error("Buildings from the same group must have the same supply system. Please check type_cs for group {group}: buildings {buildings:?} have supply systems {supply_systems:?}")]
    MixedSupplySystems {
        group: String,
        buildings: Vec<String>,
        supply_systems: Vec<String>,
    },
    #[error("Building {building} in group {group} has no supply system defined")]
    UnknownBuilding { group: String, building: String },
    #[error("Building {building} is a member of both group {first_group} and group {second_group}")]
    DuplicateBuilding {
        building: String,
        first_group: String,
        second_group: String,
    },
    #[error("Group {group} appears more than once in the building groups table")]
    DuplicateGroup { group: String },
    #[error("Group {group} has no member buildings")]
    EmptyGroup { group: String },
    #[error("Demand series for building {building} has {actual} hours but the horizon has {expected}")]
    HorizonMismatch {
        building: String,
        expected: usize,
        actual: usize,
    },
    #[error("Cooling tower catalog has no entries")]
    EmptyCatalog,
    #[error("Cooling tower catalog entry {id} has a non-positive capacity of {capacity} kW")]
    NonPositiveCapacity { id: String, capacity: f64 },
    #[error("Cooling tower catalog has more than one entry with a capacity of {capacity} kW")]
    DuplicateCapacity { capacity: f64 },
}

#[derive(Debug, Error)]
#[error("the theoretical {tier} unit size of {size:.3} kW for group {group} exceeds the largest catalog capacity of {max_capacity} kW; a larger catalog is required")]
pub struct UnsatisfiableSizingError {
    pub group: String,
    pub tier: FleetTier,
    pub size: f64,
    pub max_capacity: f64,
}
