use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use pretty_assertions::assert_eq;
use station_regrid::cli::{run, Cli};
use station_regrid::models::{CanonicalColumn, OutputVariables};
use station_regrid::processors::{MappingTable, StationConverter};
use station_regrid::writers::ParquetWriter;
use station_regrid::{ConverterConfig, ProcessingError, Result};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "year mon day hour min mcp9808 vis_light uv_light";

fn hour(h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 7, 15)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn write_log(dir: &Path, name: &str, rows: &[&str]) {
    let mut content = String::from(HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(dir.join(name), content).unwrap();
}

fn write_blueprint(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("blueprint.json");
    let lat: Vec<f64> = (0..8).map(|i| 47.40 + i as f64 * 0.01).collect();
    let lon: Vec<f64> = (0..8).map(|i| 10.95 + i as f64 * 0.01).collect();
    fs::write(
        &path,
        serde_json::json!({ "lat": lat, "lon": lon }).to_string(),
    )
    .unwrap();
    path
}

/// Minutes 0 and 30 in one file, minute 45 in another: two distinct temperatures
fn example_station() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_log(
        dir.path(),
        "2023-07-15_a.dat",
        &["2023 7 15 10 0 20.00 5 1", "2023 7 15 10 30 22.00 6 1"],
    );
    write_log(dir.path(), "2023-07-15_b.dat", &["2023 7 15 10 45 20.00 7 1"]);
    fs::write(
        dir.path().join("station.rtf"),
        "{\\rtf1 Location: 47.42 deg Lat, 10.98 deg Lon\\par Elevation: 2956 m}",
    )
    .unwrap();
    dir
}

fn config_for(dir: &TempDir, hourly: bool) -> ConverterConfig {
    let mut config = ConverterConfig::new("Example");
    config.source_directory = Some(dir.path().to_path_buf());
    config.target_directory = Some(dir.path().join("out"));
    config.hourly = hourly;
    if !hourly {
        config.grid_blueprint = Some(write_blueprint(dir.path()));
    }
    config
}

#[test]
fn test_end_to_end_scalar_two_distinct_is_missing() -> Result<()> {
    let dir = example_station();
    let mut config = config_for(&dir, true);
    config.keep_original = true;

    let result = StationConverter::new(config)?.execute()?;

    // The only hour aggregates to missing and is dropped by projection
    let original = result.original.as_ref().expect("kept");
    assert_eq!(original.series("tas").unwrap().values, vec![None]);
    assert!(result.output.is_empty());
    assert_eq!(result.report.dropped_rows, 1);

    assert_eq!(result.metadata.latitude, Some(47.42));
    assert_eq!(result.metadata.longitude, Some(10.98));
    assert_eq!(result.metadata.elevation, Some(2956));
    Ok(())
}

#[test]
fn test_end_to_end_grid_placement() -> Result<()> {
    let dir = example_station();
    let result = StationConverter::new(config_for(&dir, false))?.execute()?;

    let path = result.output_path.expect("written");
    assert_eq!(path, dir.path().join("out").join("example.parquet"));

    let table = ParquetWriter::new().read_station(&path)?;
    assert_eq!(table.hours, vec![hour(10)]);

    let grids = match &table.variables {
        OutputVariables::Grid { tas } => tas,
        OutputVariables::Scalar(_) => panic!("expected gridded output"),
    };
    let mapping = MappingTable::standard();
    let grid = &grids[0];

    let expected = [(0, 293.15), (30, 295.15), (45, 293.15)];
    for (minute, kelvin) in expected {
        let (row, col) = mapping.cell(minute);
        let value = grid.get(row, col).expect("cell filled");
        assert!((value - kelvin).abs() < 1e-9, "minute {}", minute);
    }
    assert_eq!(grid.filled_count(), 3);

    let info = ParquetWriter::new().get_file_info(&path)?;
    assert_eq!(info.attributes.get("mode").map(String::as_str), Some("grid"));
    assert_eq!(info.attributes.get("elevation").map(String::as_str), Some("2956"));
    Ok(())
}

#[test]
fn test_grid_axis_is_contiguous_across_gaps() -> Result<()> {
    let dir = TempDir::new().unwrap();
    write_log(
        dir.path(),
        "day.dat",
        &[
            "2023 7 15 0 5 10.00 0 0",
            "2023 7 15 1 5 11.00 0 0",
            "2023 7 15 3 5 13.00 0 0",
        ],
    );

    let result = StationConverter::new(config_for(&dir, false))?.convert()?;

    assert_eq!(result.output.hours, vec![hour(0), hour(1), hour(2), hour(3)]);
    match &result.output.variables {
        OutputVariables::Grid { tas } => {
            assert!(tas[2].is_empty());
            assert_eq!(tas[3].filled_count(), 1);
        }
        OutputVariables::Scalar(_) => panic!("expected gridded output"),
    }
    assert_eq!(result.report.hours_with_data, 3);
    Ok(())
}

#[test]
fn test_hour_spanning_two_files_is_one_row() -> Result<()> {
    let dir = TempDir::new().unwrap();
    write_log(
        dir.path(),
        "a.dat",
        &["2023 7 15 9 0 18.00 1 1", "2023 7 15 9 10 19.00 2 1"],
    );
    write_log(
        dir.path(),
        "b.dat",
        &["2023 7 15 9 20 20.00 3 1", "2023 7 15 9 30 -999.99 4 1"],
    );

    let result = StationConverter::new(config_for(&dir, true))?.execute()?;

    assert_eq!(result.output.hours, vec![hour(9)]);
    let tas = result.output.scalar(CanonicalColumn::Tas).unwrap();
    assert!((tas[0].unwrap() - 292.15).abs() < 1e-9);
    let vis = result.output.scalar(CanonicalColumn::VisLight).unwrap();
    assert_eq!(vis, &[Some(2.5)]);
    // uv_light repeats one value, which is not enough dispersion
    assert_eq!(
        result.output.scalar(CanonicalColumn::UvLight).unwrap(),
        &[None]
    );
    assert_eq!(result.report.missing_readings, 1);
    Ok(())
}

#[test]
fn test_malformed_row_fails_whole_run() {
    let dir = TempDir::new().unwrap();
    write_log(
        dir.path(),
        "bad.dat",
        &["2023 7 15 9 0 18.00 1 1", "2023 7 15 9 1 warm 1 1"],
    );

    let converter = StationConverter::new(config_for(&dir, true)).unwrap();
    match converter.execute() {
        Err(ProcessingError::Parse { file, row, .. }) => {
            assert!(file.ends_with("bad.dat"));
            assert_eq!(row, 3);
        }
        other => panic!("expected parse error, got {:?}", other.map(|r| r.output)),
    }
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_grid_without_blueprint_fails_before_reading() {
    let dir = example_station();
    let mut config = config_for(&dir, false);
    config.grid_blueprint = None;

    assert!(matches!(
        StationConverter::new(config),
        Err(ProcessingError::Config(_))
    ));
}

#[test]
fn test_missing_metadata_is_soft() -> Result<()> {
    let dir = TempDir::new().unwrap();
    write_log(
        dir.path(),
        "a.dat",
        &[
            "2023 7 15 9 0 18.00 1 1",
            "2023 7 15 9 10 19.00 2 1",
            "2023 7 15 9 20 20.00 3 1",
        ],
    );

    let result = StationConverter::new(config_for(&dir, true))?.execute()?;
    assert_eq!(result.metadata.latitude, None);
    assert_eq!(result.metadata.elevation, None);

    let info = ParquetWriter::new().get_file_info(&result.output_path.unwrap())?;
    assert!(!info.attributes.contains_key("lat"));
    assert_eq!(info.total_rows, 1);
    Ok(())
}

#[tokio::test]
async fn test_cli_convert_and_info() -> Result<()> {
    let dir = example_station();
    let source = dir.path().to_string_lossy().to_string();
    let target = dir.path().join("cli_out");
    let blueprint = write_blueprint(dir.path());

    let cli = Cli::try_parse_from([
        "station-regrid",
        "convert",
        "Example",
        "--source-directory",
        source.as_str(),
        "--target-directory",
        target.to_str().unwrap(),
        "--grid-blueprint",
        blueprint.to_str().unwrap(),
        "--max-workers",
        "2",
    ])
    .unwrap();
    run(cli).await?;

    let output = target.join("example.parquet");
    assert!(output.is_file());

    let cli = Cli::try_parse_from([
        "station-regrid",
        "info",
        "--file",
        output.to_str().unwrap(),
    ])
    .unwrap();
    run(cli).await?;
    Ok(())
}

#[tokio::test]
async fn test_cli_grid_flag_overrides_hourly_settings() -> Result<()> {
    let dir = example_station();
    let source = dir.path().to_string_lossy().to_string();
    let target = dir.path().join("grid_out");
    let blueprint = write_blueprint(dir.path());
    let settings = dir.path().join("settings.toml");
    fs::write(&settings, "station_name = \"Example\"\nhourly = true\n")?;

    let cli = Cli::try_parse_from([
        "station-regrid",
        "convert",
        "Example",
        "--config",
        settings.to_str().unwrap(),
        "--source-directory",
        source.as_str(),
        "--target-directory",
        target.to_str().unwrap(),
        "--grid-blueprint",
        blueprint.to_str().unwrap(),
        "--grid",
    ])
    .unwrap();
    run(cli).await?;

    let info = ParquetWriter::new().get_file_info(&target.join("example.parquet"))?;
    assert_eq!(info.attributes.get("mode").map(String::as_str), Some("grid"));
    Ok(())
}

#[tokio::test]
async fn test_cli_export_round_trip() -> Result<()> {
    let dir = example_station();
    let source = dir.path().to_string_lossy().to_string();
    let exported = dir.path().join("export").join("example.dat");

    let cli = Cli::try_parse_from([
        "station-regrid",
        "export",
        "Example",
        "--source-directory",
        source.as_str(),
        "--output-file",
        exported.to_str().unwrap(),
    ])
    .unwrap();
    run(cli).await?;

    let text = fs::read_to_string(&exported)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines[1], "2023 7 15 10 0 20.00 5.00 1.00");
    assert_eq!(lines[3], "2023 7 15 10 45 20.00 7.00 1.00");
    Ok(())
}
