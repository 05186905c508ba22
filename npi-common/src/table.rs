//! Raw tabular data as published by a spreadsheet CSV export

use crate::{Error, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row plus data rows, every cell kept as the source text
///
/// Rows may be ragged; the normalizer treats out-of-range cells as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Decode a CSV document, taking the first line as the header row
    ///
    /// Rejects bodies that look like an HTML page; published sheets answer
    /// with a sign-in page when the export link is no longer public.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let leading = bytes
            .iter()
            .skip_while(|b| b.is_ascii_whitespace())
            .take(15)
            .copied()
            .collect::<Vec<u8>>();
        if leading.first() == Some(&b'<') {
            let prefix = String::from_utf8_lossy(&leading).to_ascii_lowercase();
            if prefix.starts_with("<!doctype") || prefix.starts_with("<html") {
                return Err(Error::InvalidInput(
                    "source returned an HTML page instead of CSV".to_string(),
                ));
            }
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();
        let header = match records.next() {
            Some(first) => first?.iter().map(str::to_string).collect(),
            None => return Ok(Self::default()),
        };

        let mut rows = Vec::new();
        for record in records {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Self { header, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
