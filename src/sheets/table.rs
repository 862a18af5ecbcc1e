use crate::sheets::error::Error;

use calamine::{Data, Range};
use std::io::{Read, Write};

/// A single sheet of a workbook, with every cell rendered as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Spreadsheet row number of each entry of `rows`, the header being row 1
    row_numbers: Vec<usize>,
}

impl Table {
    /// Rows are numbered as if they directly follow the header.
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Table {
        let numbered = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i + 2, row))
            .collect();
        Table::numbered(name, headers, numbered)
    }

    /// Builds a table from rows carrying their spreadsheet row number.
    /// Rows with only blank cells are dropped.
    fn numbered(name: &str, headers: Vec<String>, rows: Vec<(usize, Vec<String>)>) -> Table {
        let (row_numbers, rows): (Vec<usize>, Vec<Vec<String>>) = rows
            .into_iter()
            .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
            .unzip();
        Table {
            name: name.to_string(),
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows,
            row_numbers,
        }
    }

    /// Row number of `row` in the source spreadsheet, for messages.
    pub fn sheet_row(&self, row: usize) -> usize {
        self.row_numbers.get(row).copied().unwrap_or(row + 2)
    }

    pub fn print_stats(&self) {
        println!("Sheet '{}':", self.name);
        println!("  Columns: {}", self.headers.join(", "));
        println!("  Rows: {}", self.rows.len());
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Looks up every column in `columns`.
    ///
    /// # Returns
    /// The column indexes in the order requested, or `MissingColumn` listing
    /// every column that is absent.
    pub fn require_columns(&self, columns: &[&str]) -> Result<Vec<usize>, Error> {
        let mut indexes = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for column in columns {
            match self.column_index(column) {
                Some(i) => indexes.push(i),
                None => missing.push(column.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(indexes)
        } else {
            Err(Error::MissingColumn {
                table: self.name.clone(),
                columns: missing,
            })
        }
    }

    /// Cell text, or an empty string for short rows.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.as_str())
            .unwrap_or("")
    }

    /// Reads a CSV stream whose first record holds the headers.
    pub fn from_csv<R>(mut reader: R, name: &str, file_name: &str) -> Result<Table, Error>
    where
        R: Read,
    {
        let mut bom = [0; 3];
        let read = read_prefix(&mut reader, &mut bom).map_err(|e| Error::NamedFileIO {
            file_name: file_name.to_owned(),
            source: Box::new(e),
        })?;
        let prefix: &[u8] = if bom == [0xefu8, 0xbbu8, 0xbfu8] {
            &[]
        } else {
            &bom[..read]
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(prefix.chain(reader));
        let headers = reader
            .headers()
            .map_err(|e| Error::CSVError {
                file_name: file_name.to_owned(),
                source: e,
            })?
            .iter()
            .map(String::from)
            .collect::<Vec<String>>();

        let mut rec = csv::StringRecord::new();
        let mut rows = Vec::new();
        while reader.read_record(&mut rec).map_err(|e| Error::CSVError {
            file_name: file_name.to_owned(),
            source: e,
        })? {
            let line = match rec.position() {
                Some(pos) => pos.line() as usize,
                None => rows.len() + 2,
            };
            rows.push((line, rec.iter().map(String::from).collect()));
        }
        Ok(Table::numbered(name, headers, rows))
    }

    /// Builds a table from a workbook range; the first row holds the headers.
    pub fn from_range(name: &str, range: &Range<Data>) -> Table {
        // Ranges start at the first non-empty row, not necessarily row 1
        let header_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header) => header.iter().map(cell_text).collect(),
            None => Vec::new(),
        };
        let rows = rows
            .enumerate()
            .map(|(i, row)| (header_row + i + 1, row.iter().map(cell_text).collect()))
            .collect::<Vec<(usize, Vec<String>)>>();
        Table::numbered(name, headers, rows)
    }

    pub fn write_csv<W>(&self, writer: W) -> Result<(), Error>
    where
        W: Write,
    {
        let file_name = format!("{}.csv", self.name);
        let mut writer = csv::Writer::from_writer(writer);
        let to_error = |e: csv::Error| Error::CSVError {
            file_name: file_name.clone(),
            source: e,
        };
        writer.write_record(&self.headers).map_err(to_error)?;
        for row in &self.rows {
            writer.write_record(row).map_err(to_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Fills `buf` as far as the stream allows, returning the number of bytes read.
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_csv_and_skips_bom() {
        let data = b"\xef\xbb\xbfBus Stop, center_lat ,center_lon\nMain St,1.5,2.5\n";
        let table = Table::from_csv(&data[..], "stops", "stops.csv").unwrap();
        assert_eq!(table.headers, vec!["Bus Stop", "center_lat", "center_lon"]);
        assert_eq!(table.rows, vec![vec!["Main St", "1.5", "2.5"]]);
    }

    #[test]
    fn reads_tiny_csv_without_bom() {
        let table = Table::from_csv(&b"a"[..], "t", "t.csv").unwrap();
        assert_eq!(table.headers, vec!["a"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn drops_blank_rows() {
        let data = b"Bus Stop\nA\n,\n  \nB\n";
        let table = Table::from_csv(&data[..], "r", "r.csv").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(1, 0), "B");
        assert_eq!(table.cell(5, 0), "");
    }

    #[test]
    fn kept_rows_remember_their_sheet_row() {
        let data = b"Bus Stop\nA\n,\n\nB\n";
        let table = Table::from_csv(&data[..], "r", "r.csv").unwrap();
        assert_eq!(table.sheet_row(0), 2);
        assert_eq!(table.sheet_row(1), 5);

        let table = Table::new(
            "r",
            vec!["Bus Stop".to_string()],
            vec![vec![" ".to_string()], vec!["C".to_string()]],
        );
        assert_eq!(table.rows, vec![vec!["C"]]);
        assert_eq!(table.sheet_row(0), 3);
    }

    #[test]
    fn range_rows_are_numbered_from_the_range_start() {
        let mut range = Range::new((2, 0), (5, 0));
        range.set_value((2, 0), Data::String("Bus Stop".to_string()));
        range.set_value((3, 0), Data::String("A".to_string()));
        range.set_value((5, 0), Data::String("B".to_string()));
        let table = Table::from_range("Route", &range);
        assert_eq!(table.rows, vec![vec!["A"], vec!["B"]]);
        assert_eq!(table.sheet_row(0), 4);
        assert_eq!(table.sheet_row(1), 6);
    }

    #[test]
    fn require_columns_reports_all_missing() {
        let table = Table::new("Route 1", vec!["Bus Stop".to_string()], vec![]);
        match table.require_columns(&["Bus Stop", "center_lat", "center_lon"]) {
            Err(Error::MissingColumn { table, columns }) => {
                assert_eq!(table, "Route 1");
                assert_eq!(columns, vec!["center_lat", "center_lon"]);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(table.require_columns(&["Bus Stop"]).unwrap(), vec![0]);
    }

    #[test]
    fn range_cells_render_as_text() {
        let mut range = Range::new((0, 0), (1, 2));
        range.set_value((0, 0), Data::String("Bus Stop".to_string()));
        range.set_value((0, 1), Data::String("center_lat".to_string()));
        range.set_value((0, 2), Data::String("center_lon".to_string()));
        range.set_value((1, 0), Data::String("Depot".to_string()));
        range.set_value((1, 1), Data::Float(12.25));
        range.set_value((1, 2), Data::Int(77));
        let table = Table::from_range("Stops", &range);
        assert_eq!(table.rows, vec![vec!["Depot", "12.25", "77"]]);
    }

    #[test]
    fn writes_csv() {
        let table = Table::new(
            "Route 1",
            vec!["Bus Stop".to_string(), "center_lat".to_string()],
            vec![vec!["A, North".to_string(), "1".to_string()]],
        );
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Bus Stop,center_lat\n\"A, North\",1\n"
        );
    }
}
