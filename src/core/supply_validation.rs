use crate::core::building_groups::{BuildingGroup, GroupTable};
use crate::errors::InvalidConfigurationError;
use crate::input::BuildingSupply;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::info;

/// A group that passed validation, with the one supply system code shared by all its buildings.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedGroup {
    pub group: BuildingGroup,
    pub supply_system: String,
}

/// Groups split by whether their heat is rejected through cooling towers, each in group table order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidatedGroups {
    pub with_cooling_tower: Vec<ClassifiedGroup>,
    pub without_cooling_tower: Vec<ClassifiedGroup>,
}

impl ValidatedGroups {
    /// All groups in table order.
    pub fn all_in_order<'a>(&'a self, table: &'a GroupTable) -> impl Iterator<Item = &'a ClassifiedGroup> {
        let by_id: IndexMap<&str, &ClassifiedGroup> = self
            .with_cooling_tower
            .iter()
            .chain(self.without_cooling_tower.iter())
            .map(|classified| (classified.group.id.as_str(), classified))
            .collect();
        table
            .groups()
            .iter()
            .filter_map(move |group| by_id.get(group.id.as_str()).copied())
    }
}

/// Check every group is a uniquely named, non-empty set of buildings sharing one supply system,
/// that no building belongs to two groups, and split the groups by cooling tower use.
pub fn validate_group_supply(
    table: &GroupTable,
    building_supply: &BuildingSupply,
    cooling_tower_systems: &HashSet<String>,
) -> Result<ValidatedGroups, InvalidConfigurationError> {
    let mut owner: IndexMap<&str, &str> = IndexMap::new();
    let mut group_ids = HashSet::with_capacity(table.len());
    let mut validated = ValidatedGroups::default();

    for group in table.groups() {
        if !group_ids.insert(group.id.as_str()) {
            return Err(InvalidConfigurationError::DuplicateGroup {
                group: group.id.clone(),
            });
        }
        if group.buildings.is_empty() {
            return Err(InvalidConfigurationError::EmptyGroup {
                group: group.id.clone(),
            });
        }

        let mut supply_systems = Vec::with_capacity(group.buildings.len());
        for building in &group.buildings {
            if let Some(first_group) = owner.insert(building.as_str(), group.id.as_str()) {
                return Err(InvalidConfigurationError::DuplicateBuilding {
                    building: building.clone(),
                    first_group: first_group.to_string(),
                    second_group: group.id.clone(),
                });
            }
            let supply_system = building_supply.get(building).ok_or_else(|| {
                InvalidConfigurationError::UnknownBuilding {
                    group: group.id.clone(),
                    building: building.clone(),
                }
            })?;
            supply_systems.push(supply_system.clone());
        }

        let supply_system = supply_systems[0].clone();
        if supply_systems.iter().any(|code| *code != supply_system) {
            return Err(InvalidConfigurationError::MixedSupplySystems {
                group: group.id.clone(),
                buildings: group.buildings.clone(),
                supply_systems,
            });
        }

        let classified = ClassifiedGroup {
            group: group.clone(),
            supply_system,
        };
        if cooling_tower_systems.contains(&classified.supply_system) {
            validated.with_cooling_tower.push(classified);
        } else {
            validated.without_cooling_tower.push(classified);
        }
    }

    info!(
        "{} of {} building groups reject heat through cooling towers",
        validated.with_cooling_tower.len(),
        table.len()
    );

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn building_supply() -> BuildingSupply {
        BuildingSupply::from([
            ("B1".to_string(), "CT".to_string()),
            ("B2".to_string(), "AIR".to_string()),
            ("B3".to_string(), "DC".to_string()),
            ("B4".to_string(), "DC".to_string()),
        ])
    }

    #[fixture]
    fn cooling_tower_systems() -> HashSet<String> {
        HashSet::from(["CT".to_string(), "DC".to_string()])
    }

    fn table(groups: &[(&str, Vec<&str>)]) -> GroupTable {
        GroupTable::new(
            groups
                .iter()
                .map(|(id, buildings)| {
                    BuildingGroup::new(*id, buildings.iter().map(|b| b.to_string()).collect())
                })
                .collect(),
        )
    }

    #[rstest]
    fn should_split_groups_by_cooling_tower_use(
        building_supply: BuildingSupply,
        cooling_tower_systems: HashSet<String>,
    ) {
        let table = table(&[("G1000", vec!["B1"]), ("G1001", vec!["B2"]), ("G1002", vec!["B3", "B4"])]);
        let validated =
            validate_group_supply(&table, &building_supply, &cooling_tower_systems).unwrap();

        assert_eq!(
            validated
                .with_cooling_tower
                .iter()
                .map(|c| (c.group.id.as_str(), c.supply_system.as_str()))
                .collect::<Vec<_>>(),
            vec![("G1000", "CT"), ("G1002", "DC")]
        );
        assert_eq!(
            validated
                .without_cooling_tower
                .iter()
                .map(|c| c.group.id.as_str())
                .collect::<Vec<_>>(),
            vec!["G1001"]
        );
        assert_eq!(
            validated
                .all_in_order(&table)
                .map(|c| c.group.id.as_str())
                .collect::<Vec<_>>(),
            vec!["G1000", "G1001", "G1002"]
        );
    }

    #[rstest]
    fn should_assign_every_member_the_group_supply_system(
        building_supply: BuildingSupply,
        cooling_tower_systems: HashSet<String>,
    ) {
        let table = table(&[("G1000", vec!["B1"]), ("G1001", vec!["B2"]), ("G1002", vec!["B3", "B4"])]);
        let validated =
            validate_group_supply(&table, &building_supply, &cooling_tower_systems).unwrap();
        for classified in validated.all_in_order(&table) {
            for building in &classified.group.buildings {
                assert_eq!(building_supply[building], classified.supply_system);
            }
        }
    }

    #[rstest]
    fn should_reject_mixed_supply_systems(
        building_supply: BuildingSupply,
        cooling_tower_systems: HashSet<String>,
    ) {
        let table = table(&[("G1000", vec!["B1", "B3"])]);
        let err = validate_group_supply(&table, &building_supply, &cooling_tower_systems)
            .unwrap_err();
        match err {
            InvalidConfigurationError::MixedSupplySystems {
                group,
                buildings,
                supply_systems,
            } => {
                assert_eq!(group, "G1000");
                assert_eq!(buildings, vec!["B1".to_string(), "B3".to_string()]);
                assert_eq!(supply_systems, vec!["CT".to_string(), "DC".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[rstest]
    fn should_reject_unknown_building(
        building_supply: BuildingSupply,
        cooling_tower_systems: HashSet<String>,
    ) {
        let table = table(&[("G1000", vec!["B9"])]);
        assert!(matches!(
            validate_group_supply(&table, &building_supply, &cooling_tower_systems),
            Err(InvalidConfigurationError::UnknownBuilding { .. })
        ));
    }

    #[rstest]
    fn should_reject_building_in_two_groups(
        building_supply: BuildingSupply,
        cooling_tower_systems: HashSet<String>,
    ) {
        let table = table(&[("G1000", vec!["B3"]), ("G1001", vec!["B3", "B4"])]);
        assert!(matches!(
            validate_group_supply(&table, &building_supply, &cooling_tower_systems),
            Err(InvalidConfigurationError::DuplicateBuilding { building, .. }) if building == "B3"
        ));
    }

    #[rstest]
    #[case(&[("G1000", vec!["B1"]), ("G1000", vec!["B2"])])]
    #[case(&[("G1000", vec!["B3"]), ("G1001", vec!["B2"]), ("G1000", vec!["B4"])])]
    fn should_reject_repeated_group_id(
        #[case] groups: &[(&str, Vec<&str>)],
        building_supply: BuildingSupply,
        cooling_tower_systems: HashSet<String>,
    ) {
        assert!(matches!(
            validate_group_supply(&table(groups), &building_supply, &cooling_tower_systems),
            Err(InvalidConfigurationError::DuplicateGroup { group }) if group == "G1000"
        ));
    }

    #[rstest]
    fn should_reject_empty_group(
        building_supply: BuildingSupply,
        cooling_tower_systems: HashSet<String>,
    ) {
        let table = table(&[("G1000", vec![])]);
        assert!(matches!(
            validate_group_supply(&table, &building_supply, &cooling_tower_systems),
            Err(InvalidConfigurationError::EmptyGroup { .. })
        ));
    }
}
