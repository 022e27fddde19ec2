//! Spreadsheet export as an Excel workbook: one sheet, header row, one row
//! per payment.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};

use super::{ExportError, ExportResult, PaymentReport, ReportRow, REPORT_COLUMNS};

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Sheet1";

impl PaymentReport {
    /// Export to an `.xlsx` workbook.
    ///
    /// Amounts are written as numeric cells so the sheet can be summed and
    /// re-read without loss.
    pub fn to_xlsx(&self) -> ExportResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).map_err(workbook_error)?;

        for (col, name) in (0u16..).zip(REPORT_COLUMNS.iter()) {
            sheet
                .write_string_with_format(0, col, *name, &bold)
                .map_err(workbook_error)?;
        }

        for (row, line) in (1u32..).zip(self.rows.iter()) {
            let values = [
                line.appointment_id as f64,
                line.total_amount,
                line.clinic_share,
                line.doctor_share,
            ];
            for (col, value) in (0u16..).zip(values) {
                sheet.write_number(row, col, value).map_err(workbook_error)?;
            }
        }

        workbook.save_to_buffer().map_err(workbook_error)
    }
}

/// Read report rows back from a workbook produced by
/// [`PaymentReport::to_xlsx`].
///
/// The first sheet is read; its first row must match the report columns.
pub fn read_workbook(bytes: &[u8]) -> ExportResult<Vec<ReportRow>> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(workbook_error)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExportError::Malformed("workbook has no sheets".into()))?
        .map_err(workbook_error)?;

    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| ExportError::Malformed("missing header row".into()))?;
    let names: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();
    if names.iter().map(String::as_str).ne(REPORT_COLUMNS.iter().copied()) {
        return Err(ExportError::Malformed(format!(
            "unexpected header: {}",
            names.join(",")
        )));
    }

    rows.filter(|cells| !cells.iter().all(|c| matches!(c, Data::Empty)))
        .map(row_from_cells)
        .collect()
}

fn row_from_cells(cells: &[Data]) -> ExportResult<ReportRow> {
    if cells.len() != REPORT_COLUMNS.len() {
        return Err(ExportError::Malformed(format!(
            "expected {} cells, found {}",
            REPORT_COLUMNS.len(),
            cells.len()
        )));
    }

    let id = number(cells, 0)?;
    if id.fract() != 0.0 {
        return Err(ExportError::Malformed(format!(
            "{}: not an ID: {}",
            REPORT_COLUMNS[0], id
        )));
    }

    Ok(ReportRow {
        appointment_id: id as i64,
        total_amount: number(cells, 1)?,
        clinic_share: number(cells, 2)?,
        doctor_share: number(cells, 3)?,
    })
}

fn number(cells: &[Data], idx: usize) -> ExportResult<f64> {
    match &cells[idx] {
        Data::Float(value) => Ok(*value),
        Data::Int(value) => Ok(*value as f64),
        Data::String(text) => text.trim().parse().map_err(|_| {
            ExportError::Malformed(format!("{}: not a number: '{}'", REPORT_COLUMNS[idx], text))
        }),
        other => Err(ExportError::Malformed(format!(
            "{}: not a number: {:?}",
            REPORT_COLUMNS[idx], other
        ))),
    }
}

fn workbook_error<E: std::fmt::Display>(e: E) -> ExportError {
    ExportError::Workbook(e.to_string())
}
