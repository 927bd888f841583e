use crate::error::{ProcessingError, Result};
use crate::models::{
    CanonicalColumn, CellGrid, GridBlueprint, OutputTable, OutputVariables, StationMetadata,
};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE, GRID_CELLS, GRID_COLS,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub const META_STATION: &str = "station";
pub const META_MODE: &str = "mode";
pub const META_DIMS: &str = "dims";
pub const META_LAT: &str = "lat";
pub const META_LON: &str = "lon";
pub const META_ELEVATION: &str = "elevation";

const ARROW_SCHEMA_KEY: &str = "ARROW:schema";

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write one station's hourly output with its metadata attached to the schema.
    ///
    /// Grid output requires the blueprint; it supplies the `lat`/`lon` coordinates.
    pub fn write_station(
        &self,
        table: &OutputTable,
        metadata: &StationMetadata,
        blueprint: Option<&GridBlueprint>,
        path: &Path,
    ) -> Result<()> {
        if table.is_grid() && blueprint.is_none() {
            return Err(ProcessingError::Config(
                "Gridded output needs a grid blueprint for its coordinates".to_string(),
            ));
        }

        let schema = self.create_schema(table, metadata, blueprint)?;
        let batch = self.table_to_batch(table, schema.clone())?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        tracing::debug!(path = %path.display(), rows = table.len(), "Wrote parquet file");
        Ok(())
    }

    fn create_schema(
        &self,
        table: &OutputTable,
        metadata: &StationMetadata,
        blueprint: Option<&GridBlueprint>,
    ) -> Result<Arc<Schema>> {
        let mut fields = vec![Field::new(
            "time",
            DataType::Timestamp(TimeUnit::Second, None),
            false,
        )];

        let grid = match (&table.variables, blueprint) {
            (OutputVariables::Scalar(columns), _) => {
                for (column, _) in columns {
                    fields.push(variable_field(*column, DataType::Float64));
                }
                None
            }
            (OutputVariables::Grid { .. }, Some(blueprint)) => {
                fields.push(variable_field(CanonicalColumn::Tas, grid_data_type()));
                Some(blueprint)
            }
            (OutputVariables::Grid { .. }, None) => None,
        };

        let mut schema_metadata = HashMap::new();
        schema_metadata.insert(META_STATION.to_string(), metadata.name.clone());

        match grid {
            Some(blueprint) => {
                schema_metadata.insert(META_MODE.to_string(), "grid".to_string());
                schema_metadata.insert(META_DIMS.to_string(), "time,lat,lon".to_string());
                schema_metadata.insert(META_LAT.to_string(), serde_json::to_string(&blueprint.lat)?);
                schema_metadata.insert(META_LON.to_string(), serde_json::to_string(&blueprint.lon)?);
            }
            None => {
                schema_metadata.insert(META_MODE.to_string(), "scalar".to_string());
                schema_metadata.insert(META_DIMS.to_string(), "time".to_string());
                if let Some(lat) = metadata.latitude {
                    schema_metadata.insert(META_LAT.to_string(), serde_json::to_string(&[lat])?);
                }
                if let Some(lon) = metadata.longitude {
                    schema_metadata.insert(META_LON.to_string(), serde_json::to_string(&[lon])?);
                }
            }
        }

        if let Some(elevation) = metadata.elevation {
            schema_metadata.insert(META_ELEVATION.to_string(), elevation.to_string());
        }

        Ok(Arc::new(Schema::new_with_metadata(fields, schema_metadata)))
    }

    fn table_to_batch(&self, table: &OutputTable, schema: Arc<Schema>) -> Result<RecordBatch> {
        let times: Vec<i64> = table
            .hours
            .iter()
            .map(|hour| hour.and_utc().timestamp())
            .collect();

        let mut columns: Vec<ArrayRef> = vec![Arc::new(TimestampSecondArray::from(times))];

        match &table.variables {
            OutputVariables::Scalar(variables) => {
                for (_, values) in variables {
                    columns.push(Arc::new(Float64Array::from(values.clone())));
                }
            }
            OutputVariables::Grid { tas } => {
                let mut builder = FixedSizeListBuilder::new(Float64Builder::new(), GRID_CELLS as i32)
                    .with_field(grid_item_field());
                for grid in tas {
                    for value in grid.iter_row_major() {
                        builder.values().append_option(value);
                    }
                    builder.append(true);
                }
                columns.push(Arc::new(builder.finish()));
            }
        }

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Read a station file written by `write_station` back into memory
    pub fn read_station(&self, path: &Path) -> Result<OutputTable> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut hours = Vec::new();
        let mut scalar: Vec<(CanonicalColumn, Vec<Option<f64>>)> = Vec::new();
        let mut grids: Option<Vec<CellGrid>> = None;

        for batch_result in reader {
            let batch = batch_result?;
            let schema = batch.schema();

            let times = batch
                .column_by_name("time")
                .and_then(|c| c.as_any().downcast_ref::<TimestampSecondArray>())
                .ok_or_else(|| ProcessingError::InvalidFormat("Invalid time column".to_string()))?;
            for i in 0..times.len() {
                hours.push(from_epoch_seconds(times.value(i))?);
            }

            for field in schema.fields().iter().skip(1) {
                let column = batch
                    .column_by_name(field.name())
                    .ok_or_else(|| ProcessingError::InvalidFormat(field.name().to_string()))?;

                if let Some(lists) = column.as_any().downcast_ref::<FixedSizeListArray>() {
                    let target = grids.get_or_insert_with(Vec::new);
                    for i in 0..lists.len() {
                        target.push(read_grid(lists.value(i))?);
                    }
                    continue;
                }

                let canonical = CanonicalColumn::ALL
                    .into_iter()
                    .find(|c| c.output_name() == field.name())
                    .ok_or_else(|| {
                        ProcessingError::InvalidFormat(format!("Unknown column: {}", field.name()))
                    })?;
                let values = column
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| {
                        ProcessingError::InvalidFormat(format!(
                            "Invalid {} column type",
                            field.name()
                        ))
                    })?;

                match scalar.iter_mut().find(|(c, _)| *c == canonical) {
                    Some((_, existing)) => existing.extend(values.iter()),
                    None => scalar.push((canonical, values.iter().collect())),
                }
            }
        }

        let variables = match grids {
            Some(tas) => OutputVariables::Grid { tas },
            None => OutputVariables::Scalar(scalar),
        };

        Ok(OutputTable { hours, variables })
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let metadata = builder.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = metadata.row_groups().iter().map(|rg| rg.num_rows()).collect();
        let compression = metadata
            .row_groups()
            .first()
            .filter(|rg| rg.num_columns() > 0)
            .map(|rg| rg.column(0).compression())
            .unwrap_or(Compression::UNCOMPRESSED);

        let columns = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();

        let attributes = builder
            .schema()
            .metadata()
            .iter()
            .filter(|(k, _)| k.as_str() != ARROW_SCHEMA_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
            columns,
            attributes,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn variable_field(column: CanonicalColumn, data_type: DataType) -> Field {
    let field = Field::new(column.output_name(), data_type, true);
    match column.units() {
        Some(units) => field.with_metadata(HashMap::from([(
            "units".to_string(),
            units.to_string(),
        )])),
        None => field,
    }
}

fn grid_item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float64, true))
}

fn grid_data_type() -> DataType {
    DataType::FixedSizeList(grid_item_field(), GRID_CELLS as i32)
}

fn read_grid(values: ArrayRef) -> Result<CellGrid> {
    let values = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ProcessingError::InvalidFormat("Invalid grid cell type".to_string()))?;
    if values.len() != GRID_CELLS {
        return Err(ProcessingError::InvalidFormat(format!(
            "Grid row holds {} cells",
            values.len()
        )));
    }

    let mut grid = CellGrid::new();
    for (k, value) in values.iter().enumerate() {
        grid.set(k / GRID_COLS, k % GRID_COLS, value);
    }
    Ok(grid)
}

fn from_epoch_seconds(seconds: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid timestamp: {}", seconds)))
}

#[derive(Debug, Clone)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
    pub columns: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Columns: {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            self.columns.join(", ")
        );
        for (key, value) in &self.attributes {
            summary.push_str(&format!("\n- {}: {}", key, value));
        }
        summary
    }
}
