use crate::input::BuildingSupply;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};

/// This module partitions buildings into heat rejection groups and reads/writes the group table.

const BUILDING_SEPARATOR: char = ',';

#[derive(Clone, Debug, PartialEq)]
pub struct BuildingGroup {
    pub id: String,
    pub buildings: Vec<String>,
}

impl BuildingGroup {
    pub fn new(id: impl Into<String>, buildings: Vec<String>) -> Self {
        Self {
            id: id.into(),
            buildings,
        }
    }

    /// Member buildings joined the way they are stored in the group table.
    pub fn joined_buildings(&self) -> String {
        self.buildings.join(&BUILDING_SEPARATOR.to_string())
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct GroupRow {
    #[serde(rename = "Group")]
    group: String,
    #[serde(rename = "Buildings")]
    buildings: String,
}

/// Ordered set of building groups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupTable {
    groups: Vec<BuildingGroup>,
}

impl GroupTable {
    pub fn new(groups: Vec<BuildingGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[BuildingGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, group_id: &str) -> Option<&BuildingGroup> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    pub fn from_csv(csv: impl Read) -> anyhow::Result<Self> {
        let groups = csv::Reader::from_reader(csv)
            .deserialize::<GroupRow>()
            .map(|row| {
                row.map(|GroupRow { group, buildings }| {
                    BuildingGroup::new(
                        group,
                        buildings
                            .split(BUILDING_SEPARATOR)
                            .map(str::trim)
                            .filter(|building| !building.is_empty())
                            .map(String::from)
                            .collect(),
                    )
                })
            })
            .collect::<Result<_, _>>()
            .context("Could not read building groups")?;

        Ok(Self { groups })
    }

    pub fn write_csv(&self, writer: impl Write) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for group in &self.groups {
            writer.serialize(GroupRow {
                group: group.id.clone(),
                buildings: group.joined_buildings(),
            })?;
        }
        writer.flush()?;

        Ok(())
    }
}

pub(crate) fn group_id(counter: usize) -> String {
    format!("G1{counter:03}")
}

/// Assign each building that is not on a shared (district) cooling system to its own group, and
/// all buildings on shared systems to a single combined group placed last.
pub fn classify_building_groups(
    building_supply: &BuildingSupply,
    shared_systems: &HashSet<String>,
) -> GroupTable {
    let (centralised, decentralised): (Vec<_>, Vec<_>) = building_supply
        .iter()
        .partition(|(_, supply_code)| shared_systems.contains(supply_code.as_str()));

    let mut groups: Vec<BuildingGroup> = decentralised
        .into_iter()
        .enumerate()
        .map(|(counter, (building, _))| BuildingGroup::new(group_id(counter), vec![building.clone()]))
        .collect();

    if !centralised.is_empty() {
        groups.push(BuildingGroup::new(
            group_id(groups.len()),
            centralised
                .into_iter()
                .map(|(building, _)| building.clone())
                .collect(),
        ));
    }

    GroupTable::new(groups)
}
