//! CSV ingestion with per-column dtype inference, plus the lossy coercions
//! the cleaning stages share.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::AnalysisError;

/// Reads a CSV into a `DataFrame`, inferring one dtype per column:
/// `Int64` when every cell parses as an integer and none are empty,
/// `Float64` when every non-empty cell parses as a number (empty cells
/// become nulls), `String` otherwise. A column with no data at all comes
/// back as all-null `Float64`.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?);
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| infer_column(name, idx, &rows))
        .collect();
    DataFrame::new(columns).map_err(AnalysisError::from)
}

fn infer_column(name: &str, idx: usize, rows: &[csv::StringRecord]) -> Column {
    let cells: Vec<Option<&str>> = rows
        .iter()
        .map(|row| {
            let cell = row.get(idx).unwrap_or("").trim();
            (!cell.is_empty()).then_some(cell)
        })
        .collect();

    let non_empty = cells.iter().flatten().count();
    let has_gaps = non_empty < cells.len();

    if non_empty > 0 && !has_gaps && cells.iter().flatten().all(|c| c.parse::<i64>().is_ok()) {
        let values: Vec<i64> = cells
            .iter()
            .map(|c| c.and_then(|s| s.parse().ok()).unwrap_or(0))
            .collect();
        return Series::new(name.into(), values).into();
    }

    if cells.iter().flatten().all(|c| c.parse::<f64>().is_ok()) {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| c.and_then(|s| s.parse().ok()))
            .collect();
        return Series::new(name.into(), values).into();
    }

    let values: Vec<Option<&str>> = cells;
    Series::new(name.into(), values).into()
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Int64 | DataType::Float64)
}

/// Coerces a column to integers the way the cleaning stages need it:
/// unparseable or missing values become 0, floats are truncated.
pub(crate) fn numeric_i64_lossy(column: &Column) -> Result<Vec<i64>, AnalysisError> {
    match column.dtype() {
        DataType::Int64 => Ok(column.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect()),
        DataType::Float64 => Ok(column
            .f64()?
            .into_iter()
            .map(|v| v.map(|f| f as i64).unwrap_or(0))
            .collect()),
        DataType::String => Ok(column
            .str()?
            .into_iter()
            .map(|v| {
                v.and_then(|s| s.trim().parse::<f64>().ok())
                    .map(|f| f as i64)
                    .unwrap_or(0)
            })
            .collect()),
        other => Err(AnalysisError::Data(format!(
            "column '{}' has unsupported dtype {other}",
            column.name()
        ))),
    }
}

/// Trimmed, lowercased text values; empty strings and non-text columns
/// yield nulls.
pub(crate) fn text_trimmed_lower(column: &Column) -> Result<Vec<Option<String>>, AnalysisError> {
    match column.dtype() {
        DataType::String => Ok(column
            .str()?
            .into_iter()
            .map(|v| {
                v.map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
            })
            .collect()),
        _ => Ok(vec![None; column.len()]),
    }
}

/// Cell values rendered as text for pass-through columns; nulls become
/// empty strings.
pub(crate) fn text_display(column: &Column) -> Result<Vec<String>, AnalysisError> {
    match column.dtype() {
        DataType::String => Ok(column
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or("").to_string())
            .collect()),
        DataType::Int64 => Ok(column
            .i64()?
            .into_iter()
            .map(|v| v.map(|x| x.to_string()).unwrap_or_default())
            .collect()),
        DataType::Float64 => Ok(column
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| x.to_string()).unwrap_or_default())
            .collect()),
        _ => Ok(vec![String::new(); column.len()]),
    }
}

/// Raw text values with nulls preserved; non-text columns yield nulls.
pub(crate) fn text_raw(column: &Column) -> Result<Vec<Option<String>>, AnalysisError> {
    match column.dtype() {
        DataType::String => Ok(column
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()),
        _ => Ok(vec![None; column.len()]),
    }
}

pub(crate) fn write_csv_artifact(df: &mut DataFrame, path: &Path) -> Result<(), AnalysisError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    tracing::debug!(path = %path.display(), rows = df.height(), "wrote processed CSV");
    Ok(())
}
