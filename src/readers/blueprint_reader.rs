use crate::error::Result;
use crate::models::GridBlueprint;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load the lat/lon axes of the output lattice from a JSON document `{"lat": [...], "lon": [...]}`
pub fn read_blueprint(path: &Path) -> Result<GridBlueprint> {
    let file = File::open(path)?;
    let blueprint: GridBlueprint = serde_json::from_reader(BufReader::new(file))?;
    blueprint.check()?;
    Ok(blueprint)
}
