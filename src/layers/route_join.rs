use std::collections::HashSet;

use crate::report::Warning;
use crate::sheets::table::Table;
use crate::sheets::workbook::Workbook;

use super::error::Error;
use super::geo_util::{parse_coordinate, title_case, LatLng};
use super::stop_registry::{StopRegistry, LATITUDE_COLUMN, LONGITUDE_COLUMN, STOP_NAME_COLUMN};

/// Position of a route stop after the join.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopPosition {
    Resolved(LatLng),
    /// The stop name has no match in the registry
    Unresolved,
}

impl StopPosition {
    pub fn lat_lng(&self) -> Option<LatLng> {
        match self {
            StopPosition::Resolved(p) => Some(*p),
            StopPosition::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub name: String,
    pub position: StopPosition,
}

// Layer 2 - A route sheet joined against the stop registry
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRoute {
    /// Name of the sheet the route was read from
    pub name: String,
    /// Stops in travel order, each name appearing once
    pub stops: Vec<RouteStop>,
}

impl JoinedRoute {
    pub fn print_stats(&self) {
        println!("Route {}:", self.name);
        println!("  Stops: {}", self.stops.len());
        println!("  Unresolved stops: {}", self.unresolved().count());
    }

    /// Join a route sheet against the registry
    ///
    /// # Parameters
    /// - `table`: Route sheet with a `Bus Stop` column in travel order
    /// - `registry`: Stop positions by normalized name
    /// - `warnings`: Receives one `UnmatchedStop` per distinct unknown stop
    ///
    /// # Returns
    /// The joined route, or `MissingColumn` when `Bus Stop` is absent
    ///
    /// Names are title-cased before the lookup. A stop listed more than once
    /// is kept at its first occurrence only. Blank cells are skipped.
    pub fn join(
        table: &Table,
        registry: &StopRegistry,
        warnings: &mut Vec<Warning>,
    ) -> Result<JoinedRoute, Error> {
        let name_col = table.require_columns(&[STOP_NAME_COLUMN])?[0];

        let mut seen = HashSet::new();
        let mut stops = Vec::new();
        for row in 0..table.rows.len() {
            let name = title_case(table.cell(row, name_col));
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            let position = match registry.get(&name) {
                Some(stop) => StopPosition::Resolved(stop.position),
                None => {
                    log::warn!("Route {}: stop {} not found in registry", table.name, name);
                    warnings.push(Warning::UnmatchedStop {
                        route: table.name.clone(),
                        stop: name.clone(),
                    });
                    StopPosition::Unresolved
                }
            };
            stops.push(RouteStop { name, position });
        }

        Ok(JoinedRoute {
            name: table.name.clone(),
            stops,
        })
    }

    /// Read back a route from a merged sheet
    ///
    /// # Parameters
    /// - `table`: Sheet with `Bus Stop`, `center_lat` and `center_lon` columns
    ///
    /// # Returns
    /// The route in sheet order, or `MissingColumn` naming the absent columns
    ///
    /// Rows with blank coordinates are `Unresolved`. Rows are taken as they
    /// are; the sheet is expected to be deduplicated already.
    pub fn from_merged_table(table: &Table) -> Result<JoinedRoute, Error> {
        let columns =
            table.require_columns(&[STOP_NAME_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN])?;
        let (name_col, lat_col, lon_col) = (columns[0], columns[1], columns[2]);

        let mut stops = Vec::with_capacity(table.rows.len());
        for row in 0..table.rows.len() {
            let name = table.cell(row, name_col).trim().to_string();
            if name.is_empty() {
                continue;
            }
            let lat = merged_coordinate(table, &name, row, lat_col, LATITUDE_COLUMN)?;
            let lon = merged_coordinate(table, &name, row, lon_col, LONGITUDE_COLUMN)?;
            let position = match (lat, lon) {
                (Some(lat), Some(lon)) => StopPosition::Resolved(LatLng::new(lat, lon)),
                _ => StopPosition::Unresolved,
            };
            stops.push(RouteStop { name, position });
        }

        Ok(JoinedRoute {
            name: table.name.clone(),
            stops,
        })
    }

    /// The merged sheet for this route: `Bus Stop, center_lat, center_lon`,
    /// with blank coordinates for unresolved stops.
    pub fn to_table(&self) -> Table {
        let headers = vec![
            STOP_NAME_COLUMN.to_string(),
            LATITUDE_COLUMN.to_string(),
            LONGITUDE_COLUMN.to_string(),
        ];
        let rows = self
            .stops
            .iter()
            .map(|stop| match stop.position {
                StopPosition::Resolved(p) => {
                    vec![stop.name.clone(), p.lat.to_string(), p.lng.to_string()]
                }
                StopPosition::Unresolved => vec![stop.name.clone(), String::new(), String::new()],
            })
            .collect();
        Table::new(&self.name, headers, rows)
    }

    /// Consecutive stop pairs in travel order.
    pub fn pairs(&self) -> impl Iterator<Item = (&RouteStop, &RouteStop)> {
        self.stops.windows(2).map(|w| (&w[0], &w[1]))
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &RouteStop> {
        self.stops
            .iter()
            .filter(|s| s.position == StopPosition::Unresolved)
    }
}

/// Joins every sheet of the routes workbook, in workbook order.
pub fn join_workbook(
    routes: &Workbook,
    registry: &StopRegistry,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<JoinedRoute>, Error> {
    routes
        .sheets
        .iter()
        .map(|sheet| JoinedRoute::join(sheet, registry, warnings))
        .collect()
}

/// Bundles joined routes into the merged workbook, one sheet per route.
pub fn merged_workbook(name: &str, routes: &[JoinedRoute]) -> Workbook {
    Workbook {
        name: name.to_string(),
        sheets: routes.iter().map(|r| r.to_table()).collect(),
    }
}

fn merged_coordinate(
    table: &Table,
    stop: &str,
    row: usize,
    column: usize,
    column_name: &str,
) -> Result<Option<f64>, Error> {
    let raw = table.cell(row, column);
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match parse_coordinate(raw) {
        Some(v) => Ok(Some(v)),
        None => Err(Error::InvalidCoordinate {
            table: table.name.clone(),
            stop: stop.to_string(),
            column: column_name.to_string(),
            value: raw.to_string(),
        }),
    }
}
