//! CSV projection of a tracker view

use crate::normalize::NormalizedTable;
use crate::tracker::{Classified, StatusKind, TrackerRecord};
use crate::{Error, Result};

/// Column titles in export order, status column last
///
/// Fields found in the source keep the source header text.
pub fn column_titles<R: TrackerRecord>(table: &NormalizedTable) -> Vec<String> {
    R::FIELDS
        .iter()
        .map(|&field| table.title(field).unwrap_or(field).to_string())
        .chain(std::iter::once(R::STATUS_TITLE.to_string()))
        .collect()
}

/// Serialize rows as CSV under the given titles
pub fn write_csv<R: TrackerRecord>(
    titles: &[String],
    rows: &[Classified<R>],
    placeholder: &str,
) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(titles)?;

    for row in rows {
        let mut cells = row.record.cells(placeholder);
        cells.push(row.status.label().to_string());
        writer.write_record(&cells)?;
    }

    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}
