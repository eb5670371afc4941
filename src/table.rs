use std::{fs::File, io::BufWriter, path::Path};

use polars::prelude::*;
use serde::Serialize;

use crate::{aggregate::MappingRow, error::Result, join::{EINWOHNER_COLUMN, NOTE_COLUMN, PLZ_COLUMN, QKM_COLUMN}};

/// The final mapping: one row per unique (plz, district) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingTable {
    /// Name of the district identifier column the rows were keyed by.
    pub district_column: String,
    pub rows: Vec<MappingRow>,
}

impl MappingTable {
    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Build a DataFrame with columns `plz, <district>, note, einwohner, qkm`, where
    /// `qkm` is the overlap area in km². The district header defaults to the resolved column name.
    pub fn to_dataframe(&self, district_header: Option<&str>) -> Result<DataFrame> {
        let header = district_header.unwrap_or(&self.district_column);

        Ok(DataFrame::new(vec![
            Column::new(PLZ_COLUMN.into(), self.rows.iter().map(|r| r.plz.clone()).collect::<Vec<_>>()),
            Column::new(header.into(), self.rows.iter().map(|r| r.district_id.clone()).collect::<Vec<_>>()),
            Column::new(NOTE_COLUMN.into(), self.rows.iter().map(|r| r.note.clone()).collect::<Vec<_>>()),
            Column::new(EINWOHNER_COLUMN.into(), self.rows.iter().map(|r| r.einwohner).collect::<Vec<_>>()),
            Column::new(QKM_COLUMN.into(), self.rows.iter().map(|r| r.area_km2).collect::<Vec<_>>()),
        ])?)
    }
}

/// Writes a DataFrame to a CSV file at `path`, replacing any previous contents.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    CsvWriter::new(&mut writer)
        .include_header(true)
        .finish(&mut df.clone())?;
    log::info!("wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Reads a CSV file with every column as text, so postal codes keep their leading zeros.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()?;
    Ok(df)
}

/// Keep the rows in which any column contains `query`, ignoring case.
/// A blank query returns the table unchanged.
pub fn search(df: &DataFrame, query: &str) -> Result<DataFrame> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Ok(df.clone());
    }

    let mut mask = vec![false; df.height()];
    for column in df.get_columns() {
        let text = column.cast(&DataType::String)?;
        for (hit, value) in mask.iter_mut().zip(text.str()?.into_iter()) {
            if !*hit {
                *hit = value.is_some_and(|v| v.to_lowercase().contains(&query));
            }
        }
    }

    let mask = BooleanChunked::from_slice("mask".into(), &mask);
    Ok(df.filter(&mask)?)
}
