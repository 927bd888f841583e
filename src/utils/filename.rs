use crate::utils::constants::OUTPUT_FILE_EXTENSION;
use std::path::{Path, PathBuf};

/// `{target}/{station_lowercase}.{extension}`
pub fn station_file(target: &Path, station_name: &str, extension: &str) -> PathBuf {
    target.join(format!("{}.{}", station_name.to_lowercase(), extension))
}

/// Default serialized output path for a station
pub fn output_path(target: &Path, station_name: &str) -> PathBuf {
    station_file(target, station_name, OUTPUT_FILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_is_lowercase() {
        let path = output_path(Path::new("station_data_as_parquet"), "Zugspitze");
        assert_eq!(path, PathBuf::from("station_data_as_parquet/zugspitze.parquet"));
    }

    #[test]
    fn test_station_file_extension() {
        let path = station_file(Path::new("/tmp/out"), "HOHENPEISSENBERG", "dat");
        assert_eq!(path, PathBuf::from("/tmp/out/hohenpeissenberg.dat"));
    }
}
