use approx::assert_relative_eq;
use heat_rejection::core::building_groups::{BuildingGroup, GroupTable};
use heat_rejection::core::simulation_adapter::{
    DataQualityWarning, SimulationRequest, SimulationResults, ThermalSimulator,
};
use heat_rejection::errors::{HeatRejectionError, InvalidConfigurationError, MissingInputError};
use heat_rejection::input::{BuildingSupply, PumpControl};
use heat_rejection::output::{FileOutput, MemoryOutput, SinkOutput};
use heat_rejection::read_weather_file::WeatherData;
use heat_rejection::{
    calculate_heat_rejection, create_building_groups, run_heat_rejection, CoolingTowerCatalog, CoolingTowerSimulator,
    EnthalpySplitter, HeatRejectionConfig, HeatRejectionInputs, ScenarioLocator,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use rstest::*;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

const HOURS: usize = 48;

/// Delegates to the cooling tower model, counting how often it is called.
#[derive(Default)]
struct CountingSimulator {
    calls: AtomicUsize,
    simulator: CoolingTowerSimulator,
}

impl ThermalSimulator for CountingSimulator {
    fn simulate(&self, request: &SimulationRequest) -> anyhow::Result<SimulationResults> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.simulator.simulate(request)
    }
}

fn weather() -> WeatherData {
    WeatherData {
        year: 2005,
        air_temperatures: (0..HOURS)
            .map(|hour| 24. + 8. * ((hour % 24) as f64 / 24. * std::f64::consts::PI).sin())
            .collect(),
        relative_humidities: (0..HOURS)
            .map(|hour| if hour % 24 == 5 { 105. } else { 55. })
            .collect(),
    }
}

fn daily_profile(peak: f64) -> Vec<f64> {
    (0..HOURS)
        .map(|hour| match hour % 24 {
            8..=18 => peak * (1. - ((hour % 24) as f64 - 13.).abs() / 6.),
            _ => 0.,
        })
        .collect()
}

#[fixture]
fn inputs() -> HeatRejectionInputs {
    HeatRejectionInputs {
        group_table: GroupTable::new(vec![
            BuildingGroup::new("G1000", vec!["B1000".into()]),
            BuildingGroup::new("G1001", vec!["B1002".into()]),
            BuildingGroup::new("G1002", vec!["B1001".into(), "B1003".into()]),
        ]),
        building_supply: BuildingSupply::from([
            ("B1000".to_string(), "HVAC_COOLING_AS3".to_string()),
            ("B1001".to_string(), "HVAC_COOLING_AS4".to_string()),
            ("B1002".to_string(), "HVAC_COOLING_AS1".to_string()),
            ("B1003".to_string(), "HVAC_COOLING_AS4".to_string()),
        ]),
        building_demands: IndexMap::from([
            ("B1000".to_string(), daily_profile(180.)),
            ("B1001".to_string(), daily_profile(900.)),
            ("B1002".to_string(), daily_profile(60.)),
            ("B1003".to_string(), daily_profile(400.)),
        ]),
        weather: weather(),
    }
}

#[fixture]
fn catalog() -> CoolingTowerCatalog {
    CoolingTowerCatalog::embedded().unwrap()
}

#[rstest]
fn should_apportion_heat_rejection_for_every_group(
    inputs: HeatRejectionInputs,
    catalog: CoolingTowerCatalog,
) {
    let simulator = CountingSimulator::default();
    let results = calculate_heat_rejection(
        &inputs,
        &HeatRejectionConfig::default(),
        &catalog,
        &simulator,
        &EnthalpySplitter,
    )
    .unwrap();

    assert_eq!(simulator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        results
            .records
            .iter()
            .map(|record| record.group.id.as_str())
            .collect::<Vec<_>>(),
        vec!["G1000", "G1001", "G1002"]
    );

    for record in &results.records {
        let series = &record.heat_rejection;
        assert_eq!(series.total.len(), HOURS);
        assert_eq!(record.timestamps.len(), HOURS);
        for hour in 0..HOURS {
            assert_relative_eq!(
                series.sensible[hour] + series.latent[hour],
                series.total[hour],
                epsilon = 1e-9,
                max_relative = 1e-9
            );
        }
    }

    // air-cooled group has no fleet and only sensible heat
    let air_cooled = &results.records[1];
    assert!(air_cooled.fleet.is_none());
    assert!(air_cooled.heat_rejection.latent.iter().all(|q| *q == 0.));

    // the district group rejects the summed demand of its members, mostly as latent heat
    let district = &results.records[2];
    assert!(district.fleet.is_some());
    assert_relative_eq!(district.heat_rejection.total[13], 1300.);
    assert!(district.heat_rejection.latent[13] > district.heat_rejection.sensible[13]);

    assert_eq!(
        results.warnings,
        vec![DataQualityWarning::RelativeHumidityClamped {
            hours: 2,
            max_percent: 105.
        }]
    );
    assert_eq!(results.building_properties["B1001"].max_load, 900.);
}

#[rstest]
fn should_skip_simulation_without_cooling_tower_groups(
    inputs: HeatRejectionInputs,
    catalog: CoolingTowerCatalog,
) {
    let config = HeatRejectionConfig {
        cooling_tower_systems: vec![],
        ..Default::default()
    };
    let simulator = CountingSimulator::default();
    let results =
        calculate_heat_rejection(&inputs, &config, &catalog, &simulator, &EnthalpySplitter)
            .unwrap();

    assert_eq!(simulator.calls.load(Ordering::SeqCst), 0);
    for record in &results.records {
        assert!(record.fleet.is_none());
        assert!(record.heat_rejection.latent.iter().all(|q| *q == 0.));
        assert_eq!(record.heat_rejection.sensible, record.heat_rejection.total);
    }
}

#[rstest]
fn should_follow_pump_control_without_changing_totals(
    inputs: HeatRejectionInputs,
    catalog: CoolingTowerCatalog,
) {
    let config = HeatRejectionConfig {
        pump_control: PumpControl::ConstantFlow,
        fan_control: false,
        ..Default::default()
    };
    let results = calculate_heat_rejection(
        &inputs,
        &config,
        &catalog,
        &CoolingTowerSimulator::new(),
        &EnthalpySplitter,
    )
    .unwrap();
    assert_eq!(
        results.records[2].heat_rejection.total,
        inputs.building_demands["B1001"]
            .iter()
            .zip(&inputs.building_demands["B1003"])
            .map(|(a, b)| a + b)
            .collect::<Vec<_>>()
    );
}

#[rstest]
fn should_fail_for_group_with_mixed_supply_systems(
    mut inputs: HeatRejectionInputs,
    catalog: CoolingTowerCatalog,
) {
    inputs
        .building_supply
        .insert("B1003".to_string(), "HVAC_COOLING_AS3".to_string());
    let result = calculate_heat_rejection(
        &inputs,
        &HeatRejectionConfig::default(),
        &catalog,
        &CoolingTowerSimulator::new(),
        &EnthalpySplitter,
    );
    assert!(matches!(
        result,
        Err(HeatRejectionError::InvalidConfiguration(
            InvalidConfigurationError::MixedSupplySystems { group, .. }
        )) if group == "G1002"
    ));
}

#[rstest]
fn should_fail_when_catalog_is_too_small(mut inputs: HeatRejectionInputs) {
    inputs
        .building_demands
        .insert("B1001".to_string(), daily_profile(50_000.));
    let result = calculate_heat_rejection(
        &inputs,
        &HeatRejectionConfig::default(),
        &CoolingTowerCatalog::embedded().unwrap(),
        &CoolingTowerSimulator::new(),
        &EnthalpySplitter,
    );
    assert!(matches!(
        result,
        Err(HeatRejectionError::UnsatisfiableSizing(err)) if err.group == "G1002"
    ));
}

#[rstest]
fn should_require_group_table_before_running(catalog: CoolingTowerCatalog) {
    let result = run_heat_rejection(
        &ScenarioLocator::new("/nonexistent/scenario"),
        &HeatRejectionConfig::default(),
        &catalog,
        &CoolingTowerSimulator::new(),
        &EnthalpySplitter,
        SinkOutput,
    );
    assert!(matches!(
        result,
        Err(HeatRejectionError::MissingInput(MissingInputError::GroupTable { .. }))
    ));
}

#[rstest]
fn should_write_one_file_per_group(inputs: HeatRejectionInputs, catalog: CoolingTowerCatalog) {
    let results = calculate_heat_rejection(
        &inputs,
        &HeatRejectionConfig::default(),
        &catalog,
        &CoolingTowerSimulator::new(),
        &EnthalpySplitter,
    )
    .unwrap();
    let output = MemoryOutput::new();
    for record in &results.records {
        record.write(&output).unwrap();
    }

    assert_eq!(output.location_keys(), vec!["G1000", "G1001", "G1002"]);
    let district = output.contents("G1002").unwrap();
    let mut lines = district.lines();
    assert_eq!(
        lines.next(),
        Some("Buildings,Date,Q_reject_kWh,Q_reject_sens_kWh,Q_reject_lat_kWh")
    );
    assert!(lines
        .next()
        .unwrap()
        .starts_with("\"B1001,B1003\",2005-01-01 00:00:00,0.0,"));
    assert_eq!(district.lines().count(), HOURS + 1);
}

const EPW_HEADER: &str = "LOCATION,Zurich,ZH,CHE,IWEC,066600,47.38,8.57,1.0,413.0
DESIGN CONDITIONS,0
TYPICAL/EXTREME PERIODS,0
GROUND TEMPERATURES,0
HOLIDAYS/DAYLIGHT SAVINGS,No,0,0,0
COMMENTS 1,test
COMMENTS 2,test
DATA PERIODS,1,1,Data,Sunday, 1/ 1,12/31
";

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A one-day scenario: B1 on its own cooling towers, B2 and B3 on a district system declared
/// only in the supply assemblies, and B4 air-cooled.
fn write_scenario(locator: &ScenarioLocator) {
    write_file(
        &locator.building_supply(),
        "Name,type_cs\nB1,HVAC_COOLING_AS3\nB2,HVAC_COOLING_AS4\nB3,HVAC_COOLING_AS4\nB4,HVAC_COOLING_AS0\n",
    );
    write_file(
        &locator.supply_assemblies(),
        "code,scale\nHVAC_COOLING_AS3,BUILDING\nHVAC_COOLING_AS4,DISTRICT\n",
    );

    let mut epw = EPW_HEADER.to_string();
    for hour in 0..24 {
        let relative_humidity = if hour == 5 { 104 } else { 60 };
        epw.push_str(&format!(
            "2005,1,1,{},60,?,{}.0,15.0,{relative_humidity},97300\n",
            hour + 1,
            20 + hour / 3
        ));
    }
    write_file(&locator.weather(), &epw);

    let demands = [("B1", 3, 50.), ("B2", 1, 200.), ("B3", 2, -30.), ("B4", 3, 10.)];
    for (building, column, load) in demands {
        let mut demand = "Date,DC_cs_kWh,E_cs_kWh,Qcs_kWh\n".to_string();
        for hour in 0..24 {
            let mut values = [0.; 3];
            if (8..=18).contains(&hour) {
                values[column - 1] = load;
            }
            demand.push_str(&format!(
                "2005-01-01 {hour:02}:00:00,{},{},{}\n",
                values[0], values[1], values[2]
            ));
        }
        write_file(&locator.demand_results(building), &demand);
    }
}

#[rstest]
fn should_create_groups_and_run_scenario_from_files(catalog: CoolingTowerCatalog) {
    let scenario = tempfile::tempdir().unwrap();
    let locator = ScenarioLocator::new(scenario.path());
    write_scenario(&locator);
    let config = HeatRejectionConfig {
        district_cooling_systems: vec![],
        ..Default::default()
    };

    write_file(&locator.groups(), "Group,Buildings\nG9999,B1\n");
    let table = create_building_groups(&locator, &config).unwrap();
    assert_eq!(
        table,
        GroupTable::new(vec![
            BuildingGroup::new("G1000", vec!["B1".into()]),
            BuildingGroup::new("G1001", vec!["B4".into()]),
            BuildingGroup::new("G1002", vec!["B2".into(), "B3".into()]),
        ])
    );
    let written = fs::read_to_string(locator.groups()).unwrap();
    assert_eq!(GroupTable::from_csv(written.as_bytes()).unwrap(), table);

    assert_eq!(create_building_groups(&locator, &config).unwrap(), table);
    assert_eq!(fs::read_to_string(locator.groups()).unwrap(), written);

    let output = FileOutput::new(locator.heat_rejection_folder(), "{}.csv".to_string());
    let results = run_heat_rejection(
        &locator,
        &config,
        &catalog,
        &CoolingTowerSimulator::new(),
        &EnthalpySplitter,
        &output,
    )
    .unwrap();
    assert_eq!(
        results.warnings,
        vec![DataQualityWarning::RelativeHumidityClamped {
            hours: 1,
            max_percent: 104.
        }]
    );

    for (group, noon) in [
        ("G1000", "B1,2005-01-01 12:00:00,50.0,"),
        ("G1001", "B4,2005-01-01 12:00:00,10.0,10.0,0.0"),
        ("G1002", "\"B2,B3\",2005-01-01 12:00:00,230.0,"),
    ] {
        let contents = fs::read_to_string(output.file_path(group).unwrap()).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 25);
        assert_eq!(
            lines[0],
            "Buildings,Date,Q_reject_kWh,Q_reject_sens_kWh,Q_reject_lat_kWh"
        );
        assert!(lines[13].starts_with(noon), "{group}: {}", lines[13]);
    }
}
