//! `surveykml transform` - one-shot coordinate conversions.

use clap::Subcommand;
use surveykml::geodesy::{GeodeticTransform, GeographicPoint, GridPoint};

use crate::error::CliError;

/// Transform subcommands.
#[derive(Debug, Subcommand)]
pub enum TransformCommands {
    /// SLD99 grid (meters) to WGS84 latitude/longitude
    ToWgs84 {
        /// Easting in meters
        #[arg(allow_hyphen_values = true)]
        easting: f64,
        /// Northing in meters
        #[arg(allow_hyphen_values = true)]
        northing: f64,
    },

    /// WGS84 latitude/longitude to SLD99 grid
    ToGrid {
        /// Latitude in decimal degrees
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
        /// Longitude in decimal degrees
        #[arg(allow_hyphen_values = true)]
        longitude: f64,
    },
}

pub fn run(command: TransformCommands) -> Result<(), CliError> {
    let transform = GeodeticTransform::sld99();
    match command {
        TransformCommands::ToWgs84 { easting, northing } => {
            let geo = transform.forward(GridPoint::new(easting, northing))?;
            println!("Latitude:  {:.7}", geo.latitude);
            println!("Longitude: {:.7}", geo.longitude);
        }
        TransformCommands::ToGrid {
            latitude,
            longitude,
        } => {
            let grid = transform.inverse(GeographicPoint::new(longitude, latitude))?;
            println!("Northing: {:.3}", grid.northing);
            println!("Easting:  {:.3}", grid.easting);
        }
    }
    Ok(())
}
