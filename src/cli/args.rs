use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "station-regrid")]
#[command(about = "Regularize minute-resolution station logs into hourly scalar or gridded series")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

/// Options shared by every command that reads a station directory
#[derive(Args, Debug, Clone)]
pub struct StationArgs {
    /// Station name; also names the default source directory and the output file
    pub station_name: String,

    #[arg(long, help = "Settings file (TOML/JSON) layered under the flags")]
    pub config: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Directory of .dat logs [default: ./station_data_as_dat/<Station>]"
    )]
    pub source_directory: Option<PathBuf>,

    #[arg(long, help = "Temperature sensor column(s) averaged into tas")]
    pub tas_sensor: Vec<String>,

    #[arg(long, help = "Field delimiter: 'whitespace' or a single character")]
    pub separator: Option<String>,

    #[arg(long, help = "Rounding precision for exported values")]
    pub rounding_precision: Option<u32>,

    #[arg(long, help = "Only process the first N files (sorted by name)")]
    pub first_n_files: Option<usize>,

    #[arg(long)]
    pub max_workers: Option<usize>,

    #[arg(long, help = "Memory-map log files while parsing")]
    pub use_mmap: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a station's logs into an hourly Parquet file
    Convert {
        #[command(flatten)]
        station: StationArgs,

        #[arg(short, long, help = "Output directory [default: ./station_data_as_parquet]")]
        target_directory: Option<PathBuf>,

        #[arg(long, help = "One aggregate per hour instead of the 8x8 grid")]
        hourly: bool,

        #[arg(long, conflicts_with = "hourly", help = "Force the 8x8 grid over a configured hourly mode")]
        grid: bool,

        #[arg(short, long, help = "JSON file with the 8 grid latitudes and longitudes")]
        grid_blueprint: Option<PathBuf>,

        #[arg(long, help = "JSON file with 60 [row, col] pairs replacing the standard mapping")]
        mapping_table: Option<PathBuf>,

        #[arg(short, long)]
        compression: Option<String>,

        #[arg(long, help = "Keep and summarize the hourly table before projection")]
        keep_original: bool,

        #[arg(long, help = "Convert and report without writing the output file")]
        dry_run: bool,
    },

    /// Re-export a station's logs in the log layout after unit conversion
    Export {
        #[command(flatten)]
        station: StationArgs,

        #[arg(short, long, help = "Output file [default: <station>.dat in the current directory]")]
        output_file: Option<PathBuf>,
    },

    /// Display information about a converted Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "5")]
        sample: usize,
    },
}
