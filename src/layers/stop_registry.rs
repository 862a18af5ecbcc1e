use std::collections::{HashMap, HashSet};

use crate::report::Warning;
use crate::sheets::table::Table;

use super::error::Error;
use super::geo_util::{parse_coordinate, title_case, LatLng};

pub const STOP_NAME_COLUMN: &str = "Bus Stop";
pub const LATITUDE_COLUMN: &str = "center_lat";
pub const LONGITUDE_COLUMN: &str = "center_lon";

/// A named stop with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    /// Title-cased name, the join key
    pub name: String,
    pub position: LatLng,
}

// Layer 1 - Lookup of stop positions by normalized name
#[derive(Debug, Default)]
pub struct StopRegistry {
    stops: HashMap<String, Stop>,
}

impl StopRegistry {
    pub fn print_stats(&self) {
        println!("Stop registry:");
        println!("  Stops: {}", self.stops.len());
    }

    /// Build the registry from a stops sheet
    ///
    /// # Parameters
    /// - `table`: Sheet with `Bus Stop`, `center_lat` and `center_lon` columns
    /// - `warnings`: Collects rows that were left out of the registry
    ///
    /// # Returns
    /// The registry, or `MissingColumn` when a required column is absent
    ///
    /// Names are title-cased. When a name appears more than once the first
    /// row wins, even when that row has no usable coordinates. Such rows are
    /// left out, so routes referencing them report the stop as unmatched.
    pub fn from_table(table: &Table, warnings: &mut Vec<Warning>) -> Result<StopRegistry, Error> {
        let columns =
            table.require_columns(&[STOP_NAME_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN])?;
        let (name_col, lat_col, lon_col) = (columns[0], columns[1], columns[2]);

        let mut stops = HashMap::new();
        let mut seen = HashSet::new();
        for row in 0..table.rows.len() {
            let name = title_case(table.cell(row, name_col));
            if name.is_empty() {
                continue;
            }
            let sheet_row = table.sheet_row(row);
            if !seen.insert(name.clone()) {
                log::debug!("Ignoring duplicate stop {} on row {}", name, sheet_row);
                warnings.push(Warning::DuplicateStop {
                    stop: name,
                    row: sheet_row,
                });
                continue;
            }
            let lat = parse_coordinate(table.cell(row, lat_col));
            let lon = parse_coordinate(table.cell(row, lon_col));
            match (lat, lon) {
                (Some(lat), Some(lon)) => {
                    stops.insert(
                        name.clone(),
                        Stop {
                            name,
                            position: LatLng::new(lat, lon),
                        },
                    );
                }
                _ => {
                    log::warn!("Stop {} on row {} has no usable coordinates", name, sheet_row);
                    warnings.push(Warning::MissingCoordinates {
                        table: table.name.clone(),
                        stop: name,
                        row: sheet_row,
                    });
                }
            }
        }
        log::debug!("Loaded {} stops from sheet {}", stops.len(), table.name);
        Ok(StopRegistry { stops })
    }

    /// Looks up a stop by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Stop> {
        self.stops.get(&title_case(name))
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
