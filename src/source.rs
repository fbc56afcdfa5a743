//! Reading spreadsheet and CSV files into `Table`s.
//!
//! The reconciliation core only ever sees `Table`s; everything that touches file formats lives
//! here.

use crate::model::Table;
use crate::Result;
use anyhow::{bail, Context};
use calamine::{open_workbook_auto, Data, Reader, Xlsx};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something that can hand over a parsed table.
pub trait TableSource {
    /// A short description of the source, for messages.
    fn describe(&self) -> String;

    /// Reads the table. `sheet` selects a worksheet where the source has several; `None` means
    /// the first.
    fn read(&self, sheet: Option<&str>) -> Result<Table>;
}

/// A spreadsheet or CSV file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self, sheet: Option<&str>) -> Result<Table> {
        read_table(&self.path, sheet)
    }
}

/// Named CSV texts held in memory. Each name plays the role of a worksheet.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: BTreeMap<String, String>,
    first: Option<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet. The first sheet added is the default one.
    pub fn with_sheet(mut self, name: impl Into<String>, csv: impl Into<String>) -> Self {
        let name = name.into();
        if self.first.is_none() {
            self.first = Some(name.clone());
        }
        self.sheets.insert(name, csv.into());
        self
    }
}

impl TableSource for MemorySource {
    fn describe(&self) -> String {
        String::from("in-memory data")
    }

    fn read(&self, sheet: Option<&str>) -> Result<Table> {
        let name = match sheet.or(self.first.as_deref()) {
            Some(name) => name,
            None => bail!("The in-memory source has no sheets"),
        };
        let Some(text) = self.sheets.get(name) else {
            bail!("The in-memory source has no sheet named '{name}'");
        };
        parse_csv(text.as_bytes())
    }
}

/// Reads the table in `path`. `.csv` files are read with the `csv` crate; every other extension
/// is handed to `calamine`, which sniffs xlsx, xlsm, xlsb, xls and ods.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let is_csv = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        return parse_csv(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    read_sheet(&mut workbook, sheet).with_context(|| format!("Failed to read {}", path.display()))
}

/// Reads one sheet of an xlsx file held in memory, such as the bytes of an exported report.
pub fn read_xlsx_bytes(bytes: &[u8], sheet: Option<&str>) -> Result<Table> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).context("Failed to open the xlsx data")?;
    read_sheet(&mut workbook, sheet)
}

fn read_sheet<RS, R>(workbook: &mut R, sheet: Option<&str>) -> Result<Table>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::error::Error + Send + Sync + 'static,
{
    let name = match sheet {
        Some(name) => name.to_string(),
        None => match workbook.sheet_names().into_iter().next() {
            Some(first) => first,
            None => bail!("The workbook has no sheets"),
        },
    };
    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("Failed to read sheet: {name}"))?;
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect();
    debug!("Read {} row(s) from sheet '{name}'", rows.len());
    Ok(Table::parse(rows)?)
}

/// Parses CSV text whose first record is the header row. Records may differ in length.
pub fn parse_csv(reader: impl Read) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.context("Malformed CSV record")?;
        rows.push(record.iter().map(String::from).collect::<Vec<_>>());
    }
    Ok(Table::parse(rows)?)
}

/// The text of a spreadsheet cell. Whole floats print without a fractional part, so a quantity
/// cell holding `5.0` reads as `5`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.as_f64().to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}
