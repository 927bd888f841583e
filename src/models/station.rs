use crate::error::{ProcessingError, Result};
use crate::utils::constants::{GRID_COLS, GRID_ROWS};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Station description; fields the metadata file does not provide stay `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationMetadata {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub elevation: Option<i32>,
}

impl StationMetadata {
    pub fn new(
        name: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        elevation: Option<i32>,
    ) -> Self {
        Self {
            name,
            latitude,
            longitude,
            elevation,
        }
    }

    pub fn without_location(name: String) -> Self {
        Self::new(name, None, None, None)
    }

    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Latitude/longitude axes of the 8x8 output lattice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridBlueprint {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl GridBlueprint {
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> Result<Self> {
        let blueprint = Self { lat, lon };
        blueprint.check()?;
        Ok(blueprint)
    }

    pub fn check(&self) -> Result<()> {
        if self.lat.len() != GRID_ROWS || self.lon.len() != GRID_COLS {
            return Err(ProcessingError::Config(format!(
                "Grid blueprint must provide {} latitudes and {} longitudes, got {} and {}",
                GRID_ROWS,
                GRID_COLS,
                self.lat.len(),
                self.lon.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_validation() {
        let station = StationMetadata::new(
            "Zugspitze".to_string(),
            Some(47.42),
            Some(10.98),
            Some(2956),
        );

        assert!(station.validate().is_ok());
        assert!(station.has_location());
    }

    #[test]
    fn test_invalid_coordinates() {
        let station = StationMetadata::new("Invalid".to_string(), Some(91.0), Some(10.0), None);
        assert!(station.validate().is_err());
    }

    #[test]
    fn test_partial_metadata_is_valid() {
        let station = StationMetadata::without_location("Zugspitze".to_string());
        assert!(station.validate().is_ok());
        assert!(!station.has_location());
    }

    #[test]
    fn test_blueprint_dimensions() {
        assert!(GridBlueprint::new(vec![0.0; 8], vec![0.0; 8]).is_ok());
        assert!(matches!(
            GridBlueprint::new(vec![0.0; 7], vec![0.0; 8]),
            Err(ProcessingError::Config(_))
        ));
    }
}
