/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Stage 8: delimited-text export. Each surviving table is written to a
//! timestamped CSV file in the working store; the criteria table is only
//! exported when a selection was made and matched at least one lake.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use riparian_vector::FeatureCollection;
use tracing::info;

use crate::errors::AnalysisError;
use crate::store::WorkingStore;

pub fn run(
    store: &WorkingStore,
    lakes_final: &FeatureCollection,
    criteria: Option<&FeatureCollection>,
    statistics: &FeatureCollection,
) -> Result<(), AnalysisError> {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

    export_table(store, &format!("Lakes_Final_{}.csv", stamp), lakes_final)?;
    match criteria {
        Some(fc) if !fc.is_empty() => {
            export_table(store, &format!("Lakes_Criteria_{}.csv", stamp), fc)?;
        }
        _ => {}
    }
    export_table(
        store,
        &format!("Watershed_Statistics_{}.csv", stamp),
        statistics,
    )?;
    Ok(())
}

fn export_table(
    store: &WorkingStore,
    file_name: &str,
    fc: &FeatureCollection,
) -> Result<(), AnalysisError> {
    let path = store.export_path(file_name);
    write_csv(&path, fc)?;
    info!("{} record(s) exported to {}", fc.len(), path.display());
    Ok(())
}

/// Writes the attribute table as comma-separated text. Null values render
/// as empty cells; values containing the delimiter, a quote, or a line
/// break are quoted with internal quotes doubled.
pub fn write_csv(path: &Path, fc: &FeatureCollection) -> Result<(), AnalysisError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let header: Vec<String> = fc.fields.iter().map(|f| escape_cell(&f.name)).collect();
    writeln!(writer, "{}", header.join(","))?;

    for f in &fc.features {
        let row: Vec<String> = f
            .values
            .iter()
            .map(|v| escape_cell(&v.to_string()))
            .collect();
        writeln!(writer, "{}", row.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

fn escape_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
