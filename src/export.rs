use crate::error::{PipelineError, PipelineResult};
use crate::types::{StakeholderRecord, REQUIRED_COLUMNS};
use csv::WriterBuilder;
use std::fs;
use std::path::Path;
use tracing::info;

fn ensure_parent(path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::Export {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Writes the page, replacing any previous output.
pub fn write_html(path: &Path, page: &str) -> PipelineResult<()> {
    ensure_parent(path)?;
    fs::write(path, page).map_err(|source| PipelineError::Export {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Map saved to {:?} ({} bytes)", path, page.len());
    Ok(())
}

/// Writes the cleaned rows with the input's column headers.
pub fn write_cleaned_csv(path: &Path, records: &[StakeholderRecord]) -> PipelineResult<()> {
    ensure_parent(path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(REQUIRED_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(|source| PipelineError::Export {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Cleaned data saved to {:?} ({} rows)", path, records.len());
    Ok(())
}
