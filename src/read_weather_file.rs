use crate::core::units::HOURS_PER_YEAR;
use anyhow::{anyhow, bail, Context};
use csv::ReaderBuilder as CsvReaderBuilder;
use std::io::Read;
use tracing::warn;

const COLUMN_YEAR: usize = 0;
const COLUMN_AIR_TEMP: usize = 6; // dry bulb temp in degrees
const COLUMN_RELATIVE_HUMIDITY: usize = 8; // relative humidity in percent
const HEADER_LINES: usize = 8;

#[derive(Clone, Debug, PartialEq)]
pub struct WeatherData {
    /// calendar year of the first data row
    pub year: i32,
    pub air_temperatures: Vec<f64>,
    /// relative humidity in percent, as recorded (values above 100 are kept)
    pub relative_humidities: Vec<f64>,
}

impl WeatherData {
    pub fn hours(&self) -> usize {
        self.air_temperatures.len()
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    column: usize,
    line: usize,
) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    record
        .get(column)
        .ok_or_else(|| anyhow!("Weather file line {line} has no column {column}"))?
        .trim()
        .parse()
        .with_context(|| format!("Could not parse column {column} on weather file line {line}"))
}

/// Read hourly dry-bulb temperature and relative humidity from an EPW weather file.
pub fn weather_data_from_epw(file: impl Read) -> anyhow::Result<WeatherData> {
    let mut reader = CsvReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(file);

    let mut year: Option<i32> = None;
    let mut air_temperatures = Vec::with_capacity(HOURS_PER_YEAR);
    let mut relative_humidities = Vec::with_capacity(HOURS_PER_YEAR);

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let line = i + 1;
        if i >= HEADER_LINES {
            if year.is_none() {
                year = Some(parse_field(&record, COLUMN_YEAR, line)?);
            }
            air_temperatures.push(parse_field(&record, COLUMN_AIR_TEMP, line)?);
            relative_humidities.push(parse_field(&record, COLUMN_RELATIVE_HUMIDITY, line)?);
        }
    }

    let Some(year) = year else {
        bail!("Weather file contains no hourly data");
    };
    if air_temperatures.len() != HOURS_PER_YEAR {
        warn!(
            "Weather file has {} hourly rows rather than {HOURS_PER_YEAR}",
            air_temperatures.len()
        );
    }

    Ok(WeatherData {
        year,
        air_temperatures,
        relative_humidities,
    })
}
