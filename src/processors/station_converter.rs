use crate::config::ConverterConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{GridBlueprint, HourlyTable, LogTable, OutputTable, StationMetadata, WorkingTable};
use crate::processors::coverage::{CoverageChecker, CoverageReport};
use crate::processors::exporter::Exporter;
use crate::processors::mapping::MappingTable;
use crate::processors::normalizer::SentinelNormalizer;
use crate::processors::projection::ColumnProjection;
use crate::processors::resampler::{ResampleMode, TemporalResampler};
use crate::processors::sensor_selector::SensorSelector;
use crate::readers::{discover_data_files, read_blueprint, LogReader, MetadataReader};
use crate::utils::filename::output_path;
use crate::utils::progress::ProgressReporter;
use crate::writers::ParquetWriter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of one station conversion
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub output: OutputTable,
    pub metadata: StationMetadata,
    pub report: CoverageReport,
    /// Hourly table before projection, kept when `keep_original` is set
    pub original: Option<HourlyTable>,
    pub output_path: Option<PathBuf>,
}

/// Extract, transform and load one station's log directory
pub struct StationConverter {
    config: ConverterConfig,
    mapping: MappingTable,
    blueprint: Option<GridBlueprint>,
    selector: SensorSelector,
    show_progress: bool,
}

impl StationConverter {
    /// Validates the configuration and loads reference data before any file is touched
    pub fn new(config: ConverterConfig) -> Result<Self> {
        config.check()?;
        config.validate_mode()?;

        let mapping = match &config.mapping_table {
            Some(path) => MappingTable::from_json_file(path)?,
            None => MappingTable::standard().clone(),
        };
        if !mapping.is_injective() {
            warn!("Mapping table sends several minutes to one cell; later readings overwrite earlier ones");
        }

        let blueprint = match (&config.grid_blueprint, config.hourly) {
            (Some(path), false) => Some(read_blueprint(path)?),
            _ => None,
        };

        let selector = SensorSelector::new(config.tas_sensors.clone())?;

        Ok(Self {
            config,
            mapping,
            blueprint,
            selector,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn mode(&self) -> ResampleMode {
        ResampleMode::from_hourly(self.config.hourly)
    }

    /// Sorted data files of the station, truncated to `first_n_files`
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        discover_data_files(&self.config.source_directory()?, self.config.first_n_files)
    }

    pub fn extract_metadata(&self) -> Result<StationMetadata> {
        let reader = MetadataReader::new()?;
        Ok(reader.read_directory(&self.config.source_directory()?, &self.config.station_name))
    }

    /// Parse, normalize and select one file
    pub fn process_file(&self, path: &Path) -> Result<WorkingTable> {
        let reader = LogReader::new(self.config.format.clone()).with_mmap(self.config.use_mmap);
        let raw = reader.read_file(path)?;
        let observations = SentinelNormalizer::new().normalize(raw);
        self.selector.select(observations)
    }

    /// Process every file on a worker pool and concatenate in file-list order
    pub fn extract(&self, files: &[PathBuf]) -> Result<WorkingTable> {
        let progress = ProgressReporter::new(
            files.len() as u64,
            &format!("Parsing {} station logs...", files.len()),
            !self.show_progress,
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        // collect() on an indexed parallel iterator keeps input order
        let tables: Result<Vec<WorkingTable>> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let result = self.process_file(path);
                    progress.increment(1);
                    result
                })
                .collect()
        });

        let table = WorkingTable::concat(tables?);
        progress.finish_with_message(&format!("Parsed {} readings", table.len()));
        Ok(table)
    }

    /// Resample and project; also returns the pre-projection table and coverage
    pub fn transform(
        &self,
        working: &WorkingTable,
    ) -> Result<(OutputTable, HourlyTable, CoverageReport)> {
        let resampler = TemporalResampler::new(self.mode(), &self.mapping);
        let hourly = resampler.resample(working);
        let output = ColumnProjection::new().project(hourly.clone())?;

        let checker = match self.mode() {
            ResampleMode::Scalar => CoverageChecker::scalar(),
            ResampleMode::Grid => CoverageChecker::grid(&self.mapping),
        };
        let report = checker.check(working, &hourly, &output);

        Ok((output, hourly, report))
    }

    /// Write the output, replacing any existing file for the station
    pub fn load(&self, output: &OutputTable, metadata: &StationMetadata) -> Result<PathBuf> {
        let target = self.config.target_directory()?;
        std::fs::create_dir_all(&target)?;

        let path = output_path(&target, &self.config.station_name);
        if path.is_file() {
            warn!(path = %path.display(), "Replacing existing output file");
            std::fs::remove_file(&path)?;
        }

        ParquetWriter::new()
            .with_compression(&self.config.compression)?
            .write_station(output, metadata, self.blueprint.as_ref(), &path)?;

        info!(path = %path.display(), hours = output.len(), "Wrote station output");
        Ok(path)
    }

    /// Run the full conversion, writing the output file
    pub fn execute(&self) -> Result<ConversionResult> {
        let mut result = self.convert()?;
        result.output_path = Some(self.load(&result.output, &result.metadata)?);
        Ok(result)
    }

    /// Run extract and transform without writing anything
    pub fn convert(&self) -> Result<ConversionResult> {
        let files = self.discover()?;
        let metadata = self.extract_metadata()?;
        let working = self.extract(&files)?;
        let (output, hourly, report) = self.transform(&working)?;

        Ok(ConversionResult {
            output,
            metadata,
            report,
            original: self.config.keep_original.then_some(hourly),
            output_path: None,
        })
    }

    /// Parse the station's files and map them back to the log schema
    pub fn export(&self) -> Result<LogTable> {
        let files = self.discover()?;
        let working = self.extract(&files)?;
        let exporter = Exporter::new(
            self.config.primary_sensor(),
            self.config.format.rounding_precision,
        );
        Ok(exporter.export_working(&working))
    }
}
