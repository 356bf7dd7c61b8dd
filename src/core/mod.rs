pub mod apportionment;
pub mod building_groups;
pub mod catalog;
pub mod cooling_tower;
pub mod demand;
pub mod fleet_sizing;
pub mod psychrometrics;
pub mod results;
pub mod simulation_adapter;
pub(crate) mod solvers;
pub mod supply_validation;
pub mod units;
