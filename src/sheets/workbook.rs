use crate::sheets::error::Error;
use crate::sheets::table::Table;

use calamine::{open_workbook_auto, Reader};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Every sheet of a spreadsheet input, in workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub name: String,
    pub sheets: Vec<Table>,
}

impl Workbook {
    /// Reads a workbook from disk.
    ///
    /// A directory is read as one CSV sheet per file, a `.zip` archive as one
    /// CSV sheet per entry, a `.csv` file as a single sheet and any other
    /// spreadsheet format through calamine.
    pub fn from_path<P>(path: P) -> Result<Workbook, Error>
    where
        P: AsRef<Path>,
    {
        let p = path.as_ref();
        if p.is_file() {
            match extension(p).as_str() {
                "csv" => Workbook::read_from_csv(p),
                "zip" => Workbook::read_from_zip(p),
                ext if WORKBOOK_EXTENSIONS.contains(&ext) => Workbook::read_from_spreadsheet(p),
                _ => Err(Error::UnsupportedFormat(format!("{}", p.display()))),
            }
        } else if p.is_dir() {
            Workbook::read_from_dir(p)
        } else {
            Err(Error::NotFileNorDirectory(format!("{}", p.display())))
        }
    }

    /// Reads an upload stored under a server-chosen path.
    ///
    /// `original_name` is the file name the client sent. The workbook takes
    /// its name from it, and so does the sheet of a single-CSV upload, as
    /// when the original file is read directly.
    pub fn from_upload<P>(path: P, original_name: &str) -> Result<Workbook, Error>
    where
        P: AsRef<Path>,
    {
        let p = path.as_ref();
        let mut workbook = Workbook::from_path(p)?;
        let original = Path::new(original_name);
        let stem = file_stem(original);
        if stem.trim().is_empty() {
            return Ok(workbook);
        }
        workbook.name = file_name(original);
        if extension(p) == "csv" {
            if let Some(sheet) = workbook.sheets.first_mut() {
                sheet.name = stem;
            }
        }
        Ok(workbook)
    }

    pub fn print_stats(&self) {
        println!("Workbook {}: {} sheets", self.name, self.sheets.len());
        for sheet in &self.sheets {
            sheet.print_stats();
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// The sheet a single-table input is read from.
    pub fn first_sheet(&self) -> Result<&Table, Error> {
        self.sheets
            .first()
            .ok_or_else(|| Error::EmptyWorkbook(self.name.clone()))
    }

    /// Writes each sheet as `<sheet>.csv` into `dir`, returning the files
    /// written in sheet order. Every sheet gets its own file; see
    /// [`unique_file_name`].
    pub fn write_csv_dir<P>(&self, dir: P) -> Result<Vec<PathBuf>, Error>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.sheets.len());
        let mut used = HashSet::new();
        for sheet in &self.sheets {
            let path = dir.join(unique_file_name(&sheet.name, "csv", &mut used));
            let file = File::create(&path).map_err(|e| Error::NamedFileIO {
                file_name: format!("{}", path.display()),
                source: Box::new(e),
            })?;
            sheet.write_csv(file)?;
            written.push(path);
        }
        Ok(written)
    }

    fn read_from_csv(path: &Path) -> Result<Workbook, Error> {
        let sheet = Workbook::read_csv_file(path)?;
        Ok(Workbook {
            name: file_name(path),
            sheets: vec![sheet],
        })
    }

    fn read_from_dir(path: &Path) -> Result<Workbook, Error> {
        let mut files = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && extension(p) == "csv")
            .collect::<Vec<PathBuf>>();
        files.sort();

        let sheets = files
            .iter()
            .map(|f| Workbook::read_csv_file(f))
            .collect::<Result<Vec<Table>, Error>>()?;
        Ok(Workbook {
            name: file_name(path),
            sheets,
        })
    }

    fn read_from_zip(path: &Path) -> Result<Workbook, Error> {
        let file = File::open(path).map_err(|e| Error::NamedFileIO {
            file_name: file_name(path),
            source: Box::new(e),
        })?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut sheets = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            let entry_path = PathBuf::from(entry.name());
            if entry.is_dir() || extension(&entry_path) != "csv" {
                continue;
            }
            let entry_name = entry.name().to_owned();
            sheets.push(Table::from_csv(entry, &file_stem(&entry_path), &entry_name)?);
        }
        Ok(Workbook {
            name: file_name(path),
            sheets,
        })
    }

    fn read_from_spreadsheet(path: &Path) -> Result<Workbook, Error> {
        let mut workbook = open_workbook_auto(path)?;
        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name)?;
            sheets.push(Table::from_range(&sheet_name, &range));
        }
        Ok(Workbook {
            name: file_name(path),
            sheets,
        })
    }

    fn read_csv_file(path: &Path) -> Result<Table, Error> {
        let name = file_name(path);
        let file = File::open(path).map_err(|e| Error::NamedFileIO {
            file_name: name.clone(),
            source: Box::new(e),
        })?;
        Table::from_csv(file, &file_stem(path), &name)
    }
}

/// Replaces characters that are not allowed in file names on common platforms.
pub fn file_safe_name(name: &str) -> String {
    let cleaned = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "sheet".to_string()
    } else {
        cleaned
    }
}

/// `<name>.<extension>` made file-safe, with a numeric suffix when another
/// name in `used` maps to the same file. Comparison ignores case so outputs
/// do not collide on case-insensitive filesystems.
pub fn unique_file_name(name: &str, extension: &str, used: &mut HashSet<String>) -> String {
    let stem = file_safe_name(name);
    let mut candidate = format!("{}.{}", stem, extension);
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        candidate = format!("{}_{}.{}", stem, n, extension);
        n += 1;
    }
    candidate
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}", path.display()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
