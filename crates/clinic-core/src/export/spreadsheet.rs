//! Plain CSV export with a header row, for tools that do not read `.xlsx`.

use super::{ExportError, ExportResult, PaymentReport, ReportRow, REPORT_COLUMNS};

impl PaymentReport {
    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        let header: Vec<String> = REPORT_COLUMNS.iter().map(|c| escape_csv(c)).collect();
        csv.push_str(&header.join(","));
        csv.push('\n');

        // Lines
        for row in &self.rows {
            let cells: Vec<String> = row.cells().iter().map(|c| escape_csv(c)).collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }

        csv
    }
}

/// Read report rows back from CSV produced by [`PaymentReport::to_csv`].
///
/// The header row must match the report columns. Blank lines are skipped.
pub fn read_spreadsheet(csv: &str) -> ExportResult<Vec<ReportRow>> {
    let mut records = parse_csv(csv)?.into_iter();

    let header = records
        .next()
        .ok_or_else(|| ExportError::Malformed("missing header row".into()))?;
    if header.iter().map(String::as_str).ne(REPORT_COLUMNS.iter().copied()) {
        return Err(ExportError::Malformed(format!(
            "unexpected header: {}",
            header.join(",")
        )));
    }

    records.map(|record| ReportRow::from_cells(&record)).collect()
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Split CSV text into records of fields. Handles quoted fields with embedded
/// separators, doubled quotes and line breaks; accepts LF or CRLF endings.
fn parse_csv(text: &str) -> ExportResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ExportError::Malformed("unterminated quoted field".into()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}
