use garde::Validate;

use crate::models::product::RowRecord;

/// Required submission CSV columns.
pub const COLUMN_SERIAL: &str = "S. No.";
pub const COLUMN_PRODUCT_NAME: &str = "Product Name";
pub const COLUMN_INPUT_URLS: &str = "Input Image Urls";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("CSV is missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("CSV contains no data rows")]
    Empty,
}

/// Parse a submitted CSV into validated row records.
///
/// Checks the required columns are present, then parses each data row:
/// the serial number must be a positive integer and the image URL cell is
/// split on commas (surrounding whitespace trimmed, empty fragments dropped).
/// Every row is validated before any work is accepted, so a malformed
/// submission is rejected synchronously with nothing persisted.
pub fn parse_rows(data: &[u8]) -> Result<Vec<RowRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let column_index = |name: &'static str| -> Result<usize, IngestError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(IngestError::MissingColumn(name))
    };

    let serial_idx = column_index(COLUMN_SERIAL)?;
    let name_idx = column_index(COLUMN_PRODUCT_NAME)?;
    let urls_idx = column_index(COLUMN_INPUT_URLS)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // 1-based, counting data rows below the header
        let row_number = i + 1;

        let serial_number = record
            .get(serial_idx)
            .unwrap_or("")
            .parse::<i64>()
            .map_err(|_| IngestError::InvalidRow {
                row: row_number,
                reason: format!(
                    "'{}' must be a positive integer, got '{}'",
                    COLUMN_SERIAL,
                    record.get(serial_idx).unwrap_or("")
                ),
            })?;

        let input_urls: Vec<String> = record
            .get(urls_idx)
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect();

        let row = RowRecord {
            serial_number,
            product_name: record.get(name_idx).unwrap_or("").to_string(),
            input_urls,
        };

        row.validate().map_err(|e| IngestError::InvalidRow {
            row: row_number,
            reason: e.to_string(),
        })?;

        rows.push(row);
    }

    if rows.is_empty() {
        return Err(IngestError::Empty);
    }

    Ok(rows)
}
