use crate::error::Result;
use crate::models::StationMetadata;
use crate::readers::discovery::find_metadata_file;
use regex::Regex;
use std::path::Path;
use validator::Validate;

const LOCATION_PATTERN: &str = r"Location: ([\d.-]+) deg Lat, ([\d.-]+) deg Lon";
const ELEVATION_PATTERN: &str = r"Elevation: (\d+) m";

/// Extracts station location and elevation from the station's description file.
///
/// Every failure here is soft: it is logged and the affected fields stay `None`.
pub struct MetadataReader {
    location: Regex,
    elevation: Regex,
}

impl MetadataReader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            location: Regex::new(LOCATION_PATTERN)?,
            elevation: Regex::new(ELEVATION_PATTERN)?,
        })
    }

    pub fn read_directory(&self, dir: &Path, station_name: &str) -> StationMetadata {
        let path = match find_metadata_file(dir) {
            Ok(Some(path)) => path,
            Ok(None) => {
                tracing::warn!(directory = %dir.display(), "No .rtf metadata file found");
                return StationMetadata::without_location(station_name.to_string());
            }
            Err(e) => {
                tracing::warn!(directory = %dir.display(), error = %e, "Could not scan for metadata");
                return StationMetadata::without_location(station_name.to_string());
            }
        };

        match read_text(&path) {
            Ok(content) => self.parse_text(&content, station_name),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Could not read metadata file");
                StationMetadata::without_location(station_name.to_string())
            }
        }
    }

    pub fn parse_text(&self, content: &str, station_name: &str) -> StationMetadata {
        let mut metadata = StationMetadata::without_location(station_name.to_string());

        if let Some(caps) = self.location.captures(content) {
            match (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
                (Ok(lat), Ok(lon)) => {
                    metadata.latitude = Some(lat);
                    metadata.longitude = Some(lon);
                }
                _ => tracing::warn!(
                    location = &caps[0],
                    "Unparseable station location, omitting coordinates"
                ),
            }
        } else {
            tracing::warn!(station = station_name, "Station location not found in metadata");
        }

        if let Some(caps) = self.elevation.captures(content) {
            metadata.elevation = caps[1].parse::<i32>().ok();
        } else {
            tracing::warn!(station = station_name, "Station elevation not found in metadata");
        }

        if let Err(errors) = metadata.validate() {
            let fields = errors.field_errors();
            if fields.contains_key("latitude") || fields.contains_key("longitude") {
                tracing::warn!(
                    station = station_name,
                    latitude = ?metadata.latitude,
                    longitude = ?metadata.longitude,
                    "Station location out of range, omitting coordinates"
                );
                metadata.latitude = None;
                metadata.longitude = None;
            }
        }

        metadata
    }
}

/// Read the description file, falling back to Windows-1252 for non-UTF-8 content
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(text.into_owned())
        }
    }
}
