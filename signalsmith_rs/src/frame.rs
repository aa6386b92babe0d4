use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use polars::prelude::*;

/// One dataset row keyed by column name. Booleans are widened to 0.0/1.0
/// and nulls read as NaN.
pub type Row = HashMap<String, f64>;

pub fn load_csv(path: &Path) -> Result<DataFrame> {
    CsvReader::from_path(path)
        .with_context(|| format!("Failed to load {}", path.display()))?
        .infer_schema(Some(1024))
        .has_header(true)
        .finish()
        .with_context(|| format!("Unable to read {} into DataFrame", path.display()))
}

pub fn write_csv(frame: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Unable to create {}", parent.display()))?;
        }
    }
    let mut file =
        File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

pub fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.column(name).is_ok()
}

/// Numeric column as `f64`, casting integer/boolean dtypes and reading
/// nulls as NaN.
pub fn column_with_nans(frame: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = frame
        .column(name)
        .with_context(|| format!("Missing required column {name}"))?;
    let casted = series
        .cast(&DataType::Float64)
        .with_context(|| format!("Column {name} must be numeric"))?;
    Ok(casted
        .f64()
        .with_context(|| format!("Column {name} must be float"))?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect())
}

pub fn bool_column(frame: &DataFrame, name: &str) -> Result<Vec<bool>> {
    let series = frame
        .column(name)
        .with_context(|| format!("Missing required column {name}"))?;
    Ok(series
        .bool()
        .with_context(|| format!("Column {name} should be boolean"))?
        .into_iter()
        .map(|value| value.unwrap_or(false))
        .collect())
}

pub fn replace_bool_column(frame: &mut DataFrame, name: &str, values: Vec<bool>) -> Result<()> {
    replace_series(frame, Series::new(name, values))
}

pub fn replace_float_column(frame: &mut DataFrame, name: &str, values: Vec<f64>) -> Result<()> {
    replace_series(frame, Series::new(name, values))
}

/// Insert `series`, overwriting an existing column of the same name in
/// place. The series length must match the frame height unless the frame
/// has no columns yet.
pub fn replace_series(frame: &mut DataFrame, series: Series) -> Result<()> {
    let name = series.name().to_string();
    if frame.width() > 0 && series.len() != frame.height() {
        return Err(anyhow!(
            "Column {name} has {} rows but the dataset has {}",
            series.len(),
            frame.height()
        ));
    }
    frame
        .with_column(series)
        .with_context(|| format!("Failed to update column {name}"))?;
    Ok(())
}

/// Extract row `index` as a name -> scalar mapping. Numeric text parses;
/// any other text reads as NaN.
pub fn row_at(frame: &DataFrame, index: usize) -> Result<Row> {
    if index >= frame.height() {
        return Err(anyhow!(
            "Row {index} is out of bounds for a dataset of {} rows",
            frame.height()
        ));
    }
    let mut row = Row::with_capacity(frame.width());
    for series in frame.get_columns() {
        let name = series.name();
        let cell = series
            .get(index)
            .with_context(|| format!("Failed to read row {index} of column {name}"))?;
        row.insert(name.to_string(), cell_to_f64(&cell));
    }
    Ok(row)
}

fn cell_to_f64(cell: &AnyValue) -> f64 {
    match cell {
        AnyValue::Null => f64::NAN,
        AnyValue::Boolean(flag) => f64::from(u8::from(*flag)),
        AnyValue::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        AnyValue::StringOwned(s) => s.trim().parse().unwrap_or(f64::NAN),
        other => other.extract::<f64>().unwrap_or(f64::NAN),
    }
}
