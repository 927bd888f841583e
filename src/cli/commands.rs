use crate::cli::args::{Cli, Commands, StationArgs};
use crate::config::{ConverterConfig, Separator};
use crate::error::Result;
use crate::models::{CanonicalColumn, OutputTable, OutputVariables};
use crate::processors::{ConversionResult, StationConverter};
use crate::utils::constants::DATA_FILE_EXTENSION;
use crate::utils::filename::station_file;
use crate::writers::{LogWriter, ParquetWriter};

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            station,
            target_directory,
            hourly,
            grid,
            grid_blueprint,
            mapping_table,
            compression,
            keep_original,
            dry_run,
        } => {
            let mut config = station_config(&station)?;
            if target_directory.is_some() {
                config.target_directory = target_directory;
            }
            if grid_blueprint.is_some() {
                config.grid_blueprint = grid_blueprint;
            }
            if mapping_table.is_some() {
                config.mapping_table = mapping_table;
            }
            if let Some(compression) = compression {
                config.compression = compression;
            }
            if hourly {
                config.hourly = true;
            } else if grid {
                config.hourly = false;
            }
            config.keep_original |= keep_original;

            println!("Converting station {}...", config.station_name);
            println!("Source directory: {}", config.source_directory()?.display());
            println!(
                "Mode: {}",
                if config.hourly { "hourly scalar" } else { "8x8 grid" }
            );

            let converter = StationConverter::new(config)?.with_progress(!cli.verbose);
            let result = tokio::task::spawn_blocking(move || {
                if dry_run {
                    converter.convert()
                } else {
                    converter.execute()
                }
            })
            .await??;

            print_conversion(&result);

            match &result.output_path {
                Some(path) => {
                    let file_info = ParquetWriter::new().get_file_info(path)?;
                    println!("\n{}", file_info.summary());
                    println!("Conversion complete!");
                }
                None => println!("Dry run - no output file written"),
            }
        }

        Commands::Export {
            station,
            output_file,
        } => {
            let mut config = station_config(&station)?;
            let output_file = match output_file {
                Some(path) => path,
                None => station_file(
                    &std::env::current_dir()?,
                    &config.station_name,
                    DATA_FILE_EXTENSION,
                ),
            };

            println!("Exporting station {}...", config.station_name);
            let writer = LogWriter::new(&config.format);
            // Export never grids, so no blueprint is required
            config.hourly = true;
            let converter = StationConverter::new(config)?.with_progress(!cli.verbose);

            let table = tokio::task::spawn_blocking(move || converter.export()).await??;

            if let Some(parent) = output_file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            writer.write(&table, &output_file)?;
            println!(
                "Wrote {} rows ({} columns) to {}",
                table.len(),
                table.columns.len(),
                output_file.display()
            );
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;
            println!("\n{}", file_info.summary());

            if sample > 0 {
                let table = writer.read_station(&file)?;
                print_sample(&table, sample);
            }
        }
    }

    Ok(())
}

/// Layer the settings file and environment, then the command-line flags
fn station_config(args: &StationArgs) -> Result<ConverterConfig> {
    let mut config = ConverterConfig::load(args.config.as_deref(), Some(&args.station_name))?;

    if args.source_directory.is_some() {
        config.source_directory = args.source_directory.clone();
    }
    if !args.tas_sensor.is_empty() {
        config.tas_sensors = args.tas_sensor.clone();
    }
    if let Some(separator) = &args.separator {
        config.format.separator = Separator::parse(separator)?;
    }
    if let Some(precision) = args.rounding_precision {
        config.format.rounding_precision = precision;
    }
    if args.first_n_files.is_some() {
        config.first_n_files = args.first_n_files;
    }
    if let Some(workers) = args.max_workers {
        config.max_workers = workers;
    }
    config.use_mmap |= args.use_mmap;

    config.check()?;
    Ok(config)
}

fn print_conversion(result: &ConversionResult) {
    let station = &result.metadata;
    println!("\nStation: {}", station.name);
    match (station.latitude, station.longitude) {
        (Some(lat), Some(lon)) => println!("Location: {:.4}, {:.4}", lat, lon),
        _ => println!("Location: unknown"),
    }
    if let Some(elevation) = station.elevation {
        println!("Elevation: {} m", elevation);
    }

    println!("\n{}", result.report.summary());

    if let Some(original) = &result.original {
        println!(
            "Pre-projection table: {} hours ({})",
            original.len(),
            if original.is_grid() { "grid" } else { "scalar" }
        );
    }
    println!("Output hours: {}", result.output.len());
}

fn print_sample(table: &OutputTable, sample: usize) {
    println!("\nFirst {} hours:", sample.min(table.len()));
    for (i, hour) in table.hours.iter().take(sample).enumerate() {
        match &table.variables {
            OutputVariables::Scalar(_) => {
                let line = table
                    .columns()
                    .into_iter()
                    .map(|column| format!("{}={}", column, scalar_text(table, column, i)))
                    .collect::<Vec<_>>()
                    .join("  ");
                println!("  {}  {}", hour, line);
            }
            OutputVariables::Grid { tas } => {
                println!("  {}  {}/64 cells filled", hour, tas[i].filled_count());
            }
        }
    }
}

fn scalar_text(table: &OutputTable, column: CanonicalColumn, index: usize) -> String {
    match table.scalar(column).and_then(|values| values[index]) {
        Some(value) => format!("{:.2}", value),
        None => "NA".to_string(),
    }
}
