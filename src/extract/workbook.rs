//! Opens uploaded spreadsheet bytes as a worksheet range.
//!
//! Two legacy floor-report formats are supported, selected by file
//! extension: `.xls` and `.xlsx`. Anything else, or a workbook that
//! fails to parse, is an [`AnalyticsError::UnsupportedFormat`].

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Range, Reader, Xls, Xlsx};

use crate::error::AnalyticsError;

/// Reads the first worksheet of an uploaded spreadsheet.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnsupportedFormat`] when the filename has
/// an unsupported extension, the bytes are not a valid workbook of that
/// format, or the workbook has no sheets.
pub fn read_first_sheet(filename: &str, bytes: Vec<u8>) -> Result<Range<Data>, AnalyticsError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("xls") => {
            let mut workbook = Xls::new(Cursor::new(bytes))
                .map_err(|e| AnalyticsError::UnsupportedFormat(format!("xls: {e}")))?;
            first_range(&mut workbook)
        }
        Some("xlsx") => {
            let mut workbook = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| AnalyticsError::UnsupportedFormat(format!("xlsx: {e}")))?;
            first_range(&mut workbook)
        }
        Some(other) => Err(AnalyticsError::UnsupportedFormat(other.to_string())),
        None => Err(AnalyticsError::UnsupportedFormat(format!(
            "file {filename:?} has no extension"
        ))),
    }
}

/// Extracts the first sheet's cell range from an open workbook.
fn first_range<RS, R>(workbook: &mut R) -> Result<Range<Data>, AnalyticsError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AnalyticsError::UnsupportedFormat("workbook has no sheets".to_string()))?;

    workbook
        .worksheet_range(&sheet)
        .map_err(|e| AnalyticsError::UnsupportedFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_extensions() {
        let err = read_first_sheet("report.csv", vec![]);
        assert!(matches!(err, Err(AnalyticsError::UnsupportedFormat(_))));

        let err = read_first_sheet("report", vec![]);
        assert!(matches!(err, Err(AnalyticsError::UnsupportedFormat(_))));
    }

    #[test]
    fn rejects_garbage_bytes_with_valid_extension() {
        let err = read_first_sheet("report.xlsx", b"not a zip archive".to_vec());
        assert!(matches!(err, Err(AnalyticsError::UnsupportedFormat(_))));
    }
}
