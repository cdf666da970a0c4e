//! Output table construction and writing.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::{Column, CsvWriter, DataFrame, IntoColumn, NamedFrom, SerWriter, Series};
use tracing::{debug, info};

use nps_model::{DType, EVENT_COLUMN, FieldMap, FieldValue, PARTICIPANT_COLUMN, PrefixGroup};

use crate::error::{Result, TransformError};
use crate::row::VisitRow;

/// File name stem of the harvested output.
pub const OUTPUT_STEM: &str = "neuropsych_scrape_data";

/// A typed output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub name: String,
    pub dtype: DType,
}

/// Ordered output columns after the identity columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSchema {
    columns: Vec<OutputColumn>,
}

impl OutputSchema {
    /// Base fields in field-map order, then each group's prefixed columns in
    /// list order, minus `drop_columns`.
    pub fn new(field_map: &FieldMap, groups: &[PrefixGroup], drop_columns: &[String]) -> Self {
        let dropped: BTreeSet<&str> = drop_columns.iter().map(String::as_str).collect();
        let mut seen = BTreeSet::new();
        let mut columns = Vec::new();
        let mut push = |name: String, dtype: DType| {
            if dropped.contains(name.as_str()) || !seen.insert(name.clone()) {
                return;
            }
            columns.push(OutputColumn { name, dtype });
        };

        for (name, spec) in field_map.iter() {
            push(name.to_string(), spec.dtype);
        }
        for group in groups {
            for field in &group.fields {
                match field_map.get(field) {
                    Some(spec) => push(group.column(field), spec.dtype),
                    None => debug!(prefix = %group.prefix, field = %field, "visit-specific field not in field map"),
                }
            }
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    /// Every output column name, identity columns first.
    pub fn names(&self) -> Vec<&str> {
        [PARTICIPANT_COLUMN, EVENT_COLUMN]
            .into_iter()
            .chain(self.columns.iter().map(|c| c.name.as_str()))
            .collect()
    }
}

/// Build the output frame; absent values become nulls.
pub fn build_frame(rows: &[VisitRow], schema: &OutputSchema) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(schema.columns.len() + 2);
    let participants: Vec<&str> = rows.iter().map(|r| r.participant_id.as_str()).collect();
    let events: Vec<&str> = rows.iter().map(|r| r.event_label.as_str()).collect();
    columns.push(Series::new(PARTICIPANT_COLUMN.into(), participants).into_column());
    columns.push(Series::new(EVENT_COLUMN.into(), events).into_column());

    for column in &schema.columns {
        let name = column.name.as_str().into();
        let series = match column.dtype {
            DType::Int => {
                let values: Vec<Option<i64>> = rows
                    .iter()
                    .map(|r| r.value(&column.name).and_then(FieldValue::as_i64))
                    .collect();
                Series::new(name, values)
            }
            DType::Float => {
                let values: Vec<Option<f64>> = rows
                    .iter()
                    .map(|r| r.value(&column.name).and_then(FieldValue::as_f64))
                    .collect();
                Series::new(name, values)
            }
            DType::String => {
                let values: Vec<Option<String>> = rows
                    .iter()
                    .map(|r| r.value(&column.name).map(ToString::to_string))
                    .collect();
                Series::new(name, values)
            }
        };
        columns.push(series.into_column());
    }

    Ok(DataFrame::new(columns)?)
}

/// Dated output file name, e.g. `neuropsych_scrape_data-2024-03-15.csv`.
pub fn output_file_name(date: NaiveDate) -> String {
    format!("{OUTPUT_STEM}-{}.csv", date.format("%Y-%m-%d"))
}

/// Serialize a frame as CSV with a header row.
pub fn frame_to_csv(frame: &mut DataFrame) -> Result<String> {
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(frame)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write the frame to the dated CSV in `dir`, creating `dir` if needed.
pub fn write_output(frame: &mut DataFrame, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| TransformError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(output_file_name(date));
    let mut file = File::create(&path).map_err(|source| TransformError::Write {
        path: path.clone(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)?;
    info!(path = %path.display(), rows = frame.height(), "wrote output");
    Ok(path)
}
