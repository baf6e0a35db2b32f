//! Floor-report template normalization.
//!
//! The export template is fixed: a 5-row banner, 2 decorative index
//! columns, a handful of filler columns, then a header row followed by
//! data. Normalization trims all of that and renames the surviving
//! columns positionally to the canonical schema. The column count after
//! trimming must match [`CANONICAL_COLUMNS`] exactly; renaming a drifted
//! template positionally would corrupt the store silently, so a mismatch
//! aborts the upload instead.

use calamine::{Data, Range};
use chrono::Timelike;

use crate::domain::metrics::{METRIC_COUNT, coerce_number};
use crate::domain::{CANONICAL_COLUMNS, RawExtractRow};
use crate::error::AnalyticsError;

/// Banner rows at the top of the template (title, floor name, period).
pub const BANNER_ROWS: usize = 5;

/// Decorative index columns at the left edge of the template.
pub const INDEX_COLUMNS: usize = 2;

/// Filler column positions, counted after the index columns are dropped.
pub const FILLER_COLUMNS: [usize; 3] = [2, 7, 13];

/// Normalizes a raw worksheet range into extract rows.
///
/// Applies the fixed template pipeline: banner/index/filler trimming,
/// header promotion, identifier screening, positional rename, and
/// missing-value replacement. Rows without a machine or session value
/// are dropped silently (they are subtotal/footer lines in the export).
///
/// # Errors
///
/// Returns [`AnalyticsError::Validation`] when the sheet is too short to
/// contain a header, or [`AnalyticsError::SchemaMismatch`] when the
/// trimmed column count differs from the canonical schema.
pub fn normalize_sheet(range: &Range<Data>) -> Result<Vec<RawExtractRow>, AnalyticsError> {
    let mut rows = range.rows().skip(BANNER_ROWS);

    let header = rows.next().ok_or_else(|| {
        AnalyticsError::Validation("extract has no header row after the banner".to_string())
    })?;

    let found = trim_row(header).count();
    if found != CANONICAL_COLUMNS.len() {
        return Err(AnalyticsError::SchemaMismatch {
            expected: CANONICAL_COLUMNS.len(),
            found,
        });
    }

    let mut out = Vec::new();
    for row in rows {
        let mut cells = trim_row(row);

        let machine = cells.next().and_then(cell_text);
        let session = cells.next().and_then(cell_text);
        let (Some(machine), Some(session)) = (machine, session) else {
            continue;
        };

        let mut metrics = [None; METRIC_COUNT];
        for slot in &mut metrics {
            *slot = cells.next().and_then(cell_number);
        }

        out.push(RawExtractRow {
            machine,
            session,
            metrics,
        });
    }

    Ok(out)
}

/// Drops the index columns and the filler positions from one physical
/// row, yielding cells in canonical column order.
fn trim_row<'a>(row: &'a [Data]) -> impl Iterator<Item = &'a Data> {
    row.iter()
        .skip(INDEX_COLUMNS)
        .enumerate()
        .filter(|(i, _)| !FILLER_COLUMNS.contains(i))
        .map(|(_, cell)| cell)
}

/// Renders an identifier cell as trimmed text, `None` when missing.
///
/// Numeric machine labels keep their integer spelling; session cells
/// stored as real spreadsheet datetimes are rendered in the same
/// `DD/MM/YYYY HH:MM` shape the template uses for text sessions.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                Some(format!("{}", *f as i64))
            } else {
                Some(f.to_string())
            }
        }
        Data::DateTime(dt) => dt.as_datetime().map(|ndt| {
            if ndt.time().num_seconds_from_midnight() == 0 {
                ndt.format("%d/%m/%Y").to_string()
            } else {
                ndt.format("%d/%m/%Y %H:%M").to_string()
            }
        }),
        _ => None,
    }
}

/// Coerces a metric cell to a float, `None` for missing markers.
fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => coerce_number(s),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::metrics::Metric;

    /// Builds a physically faithful template sheet: banner, index
    /// columns, fillers, header, then the given data rows (each row is
    /// machine, session, and metric cells in canonical order).
    fn template_sheet(data_rows: &[Vec<Data>]) -> Range<Data> {
        let width = (INDEX_COLUMNS + CANONICAL_COLUMNS.len() + FILLER_COLUMNS.len()) as u32;
        let height = (BANNER_ROWS + 1 + data_rows.len()) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));

        range.set_value((0, 0), Data::String("Reporte de Sala".to_string()));

        let header_row = BANNER_ROWS as u32;
        set_template_row(
            &mut range,
            header_row,
            &CANONICAL_COLUMNS
                .iter()
                .map(|name| Data::String((*name).to_string()))
                .collect::<Vec<_>>(),
        );

        for (i, cells) in data_rows.iter().enumerate() {
            set_template_row(&mut range, header_row + 1 + i as u32, cells);
        }
        range
    }

    /// Writes logical cells into their physical template positions,
    /// padding index and filler columns.
    fn set_template_row(range: &mut Range<Data>, row: u32, cells: &[Data]) {
        let mut logical = cells.iter();
        let after_index_width = CANONICAL_COLUMNS.len() + FILLER_COLUMNS.len();
        for pos in 0..after_index_width {
            let col = (INDEX_COLUMNS + pos) as u32;
            if FILLER_COLUMNS.contains(&pos) {
                range.set_value((row, col), Data::String("~".to_string()));
            } else if let Some(cell) = logical.next() {
                range.set_value((row, col), cell.clone());
            }
        }
        range.set_value((row, 0), Data::Int(row.into()));
    }

    fn data_row(machine: &str, session: &str, total_in: f64, total_out: f64) -> Vec<Data> {
        let mut cells = vec![
            Data::String(machine.to_string()),
            Data::String(session.to_string()),
        ];
        for metric in Metric::ALL {
            cells.push(match metric {
                Metric::TotalIn => Data::Float(total_in),
                Metric::TotalOut => Data::Float(total_out),
                Metric::AverageBet => Data::String("1,250.5".to_string()),
                Metric::Jackpot => Data::String("-".to_string()),
                _ => Data::Float(1.0),
            });
        }
        cells
    }

    #[test]
    fn normalizes_a_well_formed_template() {
        let range = template_sheet(&[
            data_row("M-0012", "01/03/2024 10:00", 100.0, 40.0),
            data_row("0450", "02/03/2024 10:00", 50.0, 50.0),
        ]);

        let Ok(rows) = normalize_sheet(&range) else {
            panic!("template should normalize");
        };
        assert_eq!(rows.len(), 2);

        let Some(first) = rows.first() else {
            panic!("missing first row");
        };
        assert_eq!(first.machine, "M-0012");
        assert_eq!(first.session, "01/03/2024 10:00");
        assert_eq!(first.metric(Metric::TotalIn), Some(100.0));
        assert_eq!(first.metric(Metric::TotalOut), Some(40.0));
        // thousands separator coerced, missing marker preserved as None
        assert_eq!(first.metric(Metric::AverageBet), Some(1250.5));
        assert_eq!(first.metric(Metric::Jackpot), None);
    }

    #[test]
    fn drops_rows_missing_identifiers() {
        let mut footer = data_row("", "01/03/2024 10:00", 1.0, 1.0);
        if let Some(cell) = footer.first_mut() {
            *cell = Data::String("   ".to_string());
        }
        let mut subtotal = data_row("0450", "", 1.0, 1.0);
        if let Some(cell) = subtotal.get_mut(1) {
            *cell = Data::Empty;
        }

        let range = template_sheet(&[
            footer,
            data_row("0012", "01/03/2024 10:00", 10.0, 5.0),
            subtotal,
        ]);

        let Ok(rows) = normalize_sheet(&range) else {
            panic!("template should normalize");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().map(|r| r.machine.as_str()), Some("0012"));
    }

    #[test]
    fn column_drift_is_a_schema_mismatch() {
        // One column short of the physical template width.
        let width = (INDEX_COLUMNS + CANONICAL_COLUMNS.len() + FILLER_COLUMNS.len() - 1) as u32;
        let height = (BANNER_ROWS + 2) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for col in 0..width {
            range.set_value((BANNER_ROWS as u32, col), Data::String("h".to_string()));
        }

        match normalize_sheet(&range) {
            Err(AnalyticsError::SchemaMismatch { expected, found }) => {
                assert_eq!(expected, CANONICAL_COLUMNS.len());
                assert_eq!(found, CANONICAL_COLUMNS.len() - 1);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn sheet_without_header_is_rejected() {
        let range: Range<Data> = Range::new((0, 0), (2, 4));
        assert!(matches!(
            normalize_sheet(&range),
            Err(AnalyticsError::Validation(_))
        ));
    }

    #[test]
    fn numeric_machine_cells_keep_integer_spelling() {
        let mut row = data_row("x", "01/03/2024", 1.0, 1.0);
        if let Some(cell) = row.first_mut() {
            *cell = Data::Float(12.0);
        }
        let range = template_sheet(&[row]);

        let Ok(rows) = normalize_sheet(&range) else {
            panic!("template should normalize");
        };
        assert_eq!(rows.first().map(|r| r.machine.as_str()), Some("12"));
    }
}
