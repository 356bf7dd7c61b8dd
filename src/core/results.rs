use crate::core::apportionment::HeatRejectionSeries;
use crate::core::building_groups::BuildingGroup;
use crate::core::fleet_sizing::FleetSizing;
use crate::output::Output;
use crate::simulation_time::TIMESTAMP_FORMAT;
use anyhow::bail;
use chrono::NaiveDateTime;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

/// Hourly heat rejection of one building group.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatRejectionRecord {
    pub group: BuildingGroup,
    pub supply_system: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub heat_rejection: HeatRejectionSeries,
    /// the sized cooling tower fleet; `None` for groups that reject heat without cooling towers
    pub fleet: Option<FleetSizing>,
}

#[derive(Serialize)]
struct HeatRejectionRow<'a> {
    #[serde(rename = "Buildings")]
    buildings: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Q_reject_kWh")]
    total: f64,
    #[serde(rename = "Q_reject_sens_kWh")]
    sensible: f64,
    #[serde(rename = "Q_reject_lat_kWh")]
    latent: f64,
}

impl HeatRejectionRecord {
    /// Write the record as CSV to the output's location for the group id.
    pub fn write(&self, output: &impl Output) -> anyhow::Result<()> {
        let series = &self.heat_rejection;
        let hours = self.timestamps.len();
        if [series.total.len(), series.sensible.len(), series.latent.len()]
            .iter()
            .any(|len| *len != hours)
        {
            bail!(
                "Heat rejection series of group {} do not cover the {hours} hour horizon",
                self.group.id
            );
        }

        let buildings = self.group.joined_buildings();
        let mut writer =
            WriterBuilder::new().from_writer(output.writer_for_location_key(&self.group.id)?);
        for (hour, timestamp) in self.timestamps.iter().enumerate() {
            writer.serialize(HeatRejectionRow {
                buildings: &buildings,
                date: timestamp.format(TIMESTAMP_FORMAT).to_string(),
                total: series.total[hour],
                sensible: series.sensible[hour],
                latent: series.latent[hour],
            })?;
        }
        writer.flush()?;

        debug!("Wrote {hours} hours of heat rejection for group {}", self.group.id);

        Ok(())
    }
}
