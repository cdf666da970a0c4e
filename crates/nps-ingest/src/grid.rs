//! In-memory text grid of one spreadsheet's first sheet.

use std::io::Read;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use csv::ReaderBuilder;

use crate::error::{IngestError, Result};

/// Raw text cells addressed by (row, column); `None` marks an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Option<String>>>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Build a grid from string rows, treating empty strings as empty cells.
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| text_cell(cell.as_ref())).collect())
            .collect();
        Self { rows }
    }

    /// Build a grid from a calamine range, keeping absolute sheet coordinates.
    pub fn from_range(range: &Range<Data>) -> Self {
        let (row_start, col_start) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); row_start];
        for row in range.rows() {
            let mut cells: Vec<Option<String>> = vec![None; col_start];
            cells.extend(row.iter().map(data_to_text));
            rows.push(cells);
        }
        Self { rows }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Cell at a signed address; negative or out-of-range addresses yield `None`.
    pub fn get_offset(&self, row: i64, col: i64) -> Option<&str> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        self.get(row, col)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// True when the grid holds no non-empty cell.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(Option::is_none)
    }

    /// Non-empty cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| cell.as_deref().map(|text| (r, c, text)))
        })
    }
}

fn text_cell(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn data_to_text(value: &Data) -> Option<String> {
    match value {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => text_cell(s),
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) => Some(format_float(*v)),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => Some(other.to_string()),
    }
}

/// Whole numbers print without a fractional part, as spreadsheets show them.
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

/// Supported spreadsheet formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    Workbook,
    Csv,
}

impl GridFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Read the first sheet of a workbook file.
pub fn read_workbook_grid(path: &Path) -> Result<Grid> {
    let display = path.display().to_string();
    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::Workbook {
        path: display.clone(),
        message: e.to_string(),
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::NoSheets {
            path: display.clone(),
        })?
        .map_err(|e| IngestError::Workbook {
            path: display,
            message: e.to_string(),
        })?;
    Ok(Grid::from_range(&range))
}

/// Read a headerless CSV file as a grid.
pub fn read_csv_grid(path: &Path) -> Result<Grid> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv_grid_from_reader(&path.display().to_string(), file)
}

pub fn read_csv_grid_from_reader<R: Read>(name: &str, reader: R) -> Result<Grid> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::CsvParse {
            path: name.to_string(),
            message: e.to_string(),
        })?;
        rows.push(
            record
                .iter()
                .map(|cell| text_cell(cell.trim_matches('\u{feff}')))
                .collect(),
        );
    }
    Ok(Grid { rows })
}
