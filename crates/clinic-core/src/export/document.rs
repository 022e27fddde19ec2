//! Positioned, paginated report document (PDF).
//!
//! The layout is computed first as plain data in PDF points, then rendered
//! with `printpdf`. Rendered files are read back with `lopdf` into the same
//! layout model, so a round trip can be compared item by item.

use std::io::BufWriter;

use lopdf::content::Content;
use lopdf::{Document, Object};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde::{Deserialize, Serialize};

use super::{ExportError, ExportResult, PaymentReport, ReportRow, REPORT_COLUMNS};

/// US letter, in points.
pub const PAGE_WIDTH_PT: f32 = 612.0;
pub const PAGE_HEIGHT_PT: f32 = 792.0;

/// X position of each report column, in points.
pub const COLUMN_X: [f32; 4] = [100.0, 200.0, 300.0, 400.0];

pub const DOCUMENT_TITLE: &str = "Accounting Report";

const TITLE_X: f32 = 100.0;
const TITLE_Y: f32 = 750.0;
const HEADER_Y: f32 = 700.0;
const PAGE_TOP_Y: f32 = 750.0;
const ROW_HEIGHT: f32 = 20.0;
const BOTTOM_MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_FONT_SIZE: f32 = 14.0;
const MM_PER_PT: f32 = 25.4 / 72.0;

/// What a piece of placed text represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TextKind {
    Title,
    Header,
    Cell,
}

/// A string placed at a fixed position on a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedText {
    pub kind: TextKind,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentPage {
    pub items: Vec<PlacedText>,
}

impl DocumentPage {
    fn place(&mut self, kind: TextKind, x: f32, y: f32, text: impl Into<String>) {
        self.items.push(PlacedText {
            kind,
            x,
            y,
            text: text.into(),
        });
    }

    /// Number of report rows on this page.
    pub fn row_count(&self) -> usize {
        self.items.iter().filter(|i| i.kind == TextKind::Cell).count() / COLUMN_X.len()
    }
}

/// Laid-out report, one entry per page.
///
/// The title and column header appear on the first page only. Rows run from
/// the header downwards every 20pt; once the cursor drops below the bottom
/// margin the next row starts a new page at the top. That gives 32 rows on the
/// first page and 36 on each following page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub pages: Vec<DocumentPage>,
}

impl ReportDocument {
    /// Lay out a report.
    pub fn layout(report: &PaymentReport) -> Self {
        let mut pages = Vec::new();
        let mut page = DocumentPage::default();

        page.place(TextKind::Title, TITLE_X, TITLE_Y, DOCUMENT_TITLE);
        for (x, name) in COLUMN_X.iter().zip(REPORT_COLUMNS.iter()) {
            page.place(TextKind::Header, *x, HEADER_Y, *name);
        }

        let mut y = HEADER_Y - ROW_HEIGHT;
        for row in &report.rows {
            if y < BOTTOM_MARGIN {
                pages.push(std::mem::take(&mut page));
                y = PAGE_TOP_Y;
            }
            for (x, cell) in COLUMN_X.iter().zip(row.cells()) {
                page.place(TextKind::Cell, *x, y, cell);
            }
            y -= ROW_HEIGHT;
        }
        pages.push(page);

        Self {
            title: DOCUMENT_TITLE.to_string(),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Read the report rows back from the placed cells.
    ///
    /// Cells sharing a baseline on a page form one row; columns are matched
    /// by their x position.
    pub fn read_rows(&self) -> ExportResult<Vec<ReportRow>> {
        let mut rows = Vec::new();

        for page in &self.pages {
            let mut line: Vec<&PlacedText> = Vec::new();
            for item in page.items.iter().filter(|i| i.kind == TextKind::Cell) {
                if line.first().is_some_and(|first| first.y != item.y) {
                    rows.push(row_from_line(&line)?);
                    line.clear();
                }
                line.push(item);
            }
            if !line.is_empty() {
                rows.push(row_from_line(&line)?);
            }
        }

        Ok(rows)
    }

    /// Render to PDF bytes.
    pub fn render_pdf(&self) -> ExportResult<Vec<u8>> {
        let width = Mm(PAGE_WIDTH_PT * MM_PER_PT);
        let height = Mm(PAGE_HEIGHT_PT * MM_PER_PT);

        let (doc, first_page, first_layer) =
            PdfDocument::new(self.title.as_str(), width, height, "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

        for (index, page) in self.pages.iter().enumerate() {
            let (page_index, layer_index) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(width, height, format!("Page {}", index + 1))
            };
            let layer = doc.get_page(page_index).get_layer(layer_index);

            for item in &page.items {
                let (size, face) = match item.kind {
                    TextKind::Title => (TITLE_FONT_SIZE, &bold),
                    TextKind::Header => (FONT_SIZE, &bold),
                    TextKind::Cell => (FONT_SIZE, &font),
                };
                layer.use_text(
                    item.text.as_str(),
                    size,
                    Mm(item.x * MM_PER_PT),
                    Mm(item.y * MM_PER_PT),
                    face,
                );
            }
        }

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))
    }

    /// Recover the placed text from PDF bytes written by
    /// [`render_pdf`](Self::render_pdf).
    ///
    /// Positions are snapped to whole points. Bold text set at the title size
    /// is the title, other bold text a column header, everything else a cell.
    pub fn from_pdf(bytes: &[u8]) -> ExportResult<Self> {
        let pdf = Document::load_mem(bytes).map_err(pdf_error)?;

        let mut pages = Vec::new();
        for (_, page_id) in pdf.get_pages() {
            let fonts = pdf.get_page_fonts(page_id);
            let data = pdf.get_page_content(page_id).map_err(pdf_error)?;
            let content = Content::decode(&data).map_err(pdf_error)?;

            let mut page = DocumentPage::default();
            let mut bold = false;
            let mut size = 0.0f32;
            let (mut x, mut y) = (0.0f32, 0.0f32);

            for op in &content.operations {
                match op.operator.as_str() {
                    "BT" => {
                        x = 0.0;
                        y = 0.0;
                    }
                    "Tf" => {
                        bold = op
                            .operands
                            .first()
                            .and_then(name_bytes)
                            .and_then(|name| fonts.get(name))
                            .and_then(|font| font.get(b"BaseFont").ok())
                            .and_then(name_bytes)
                            .is_some_and(|base| base.ends_with(b"-Bold"));
                        size = operand(&op.operands, 1)?;
                    }
                    "Td" => {
                        x += operand(&op.operands, 0)?;
                        y += operand(&op.operands, 1)?;
                    }
                    "Tm" => {
                        x = operand(&op.operands, 4)?;
                        y = operand(&op.operands, 5)?;
                    }
                    "Tj" | "TJ" => {
                        let kind = match (bold, size >= TITLE_FONT_SIZE) {
                            (true, true) => TextKind::Title,
                            (true, false) => TextKind::Header,
                            (false, _) => TextKind::Cell,
                        };
                        page.place(kind, x.round(), y.round(), shown_text(&op.operands));
                    }
                    _ => {}
                }
            }
            pages.push(page);
        }

        let title = pages
            .first()
            .and_then(|page| page.items.iter().find(|i| i.kind == TextKind::Title))
            .map(|item| item.text.clone())
            .unwrap_or_default();

        Ok(Self { title, pages })
    }
}

/// Read report rows back from PDF bytes produced by [`PaymentReport::to_pdf`].
pub fn read_pdf(bytes: &[u8]) -> ExportResult<Vec<ReportRow>> {
    ReportDocument::from_pdf(bytes)?.read_rows()
}

fn name_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::Name(name) => Some(name.as_slice()),
        Object::String(text, _) => Some(text.as_slice()),
        _ => None,
    }
}

fn operand(operands: &[Object], idx: usize) -> ExportResult<f32> {
    operands
        .get(idx)
        .and_then(|o| o.as_float().ok())
        .ok_or_else(|| ExportError::Malformed(format!("missing numeric operand {}", idx)))
}

/// Text shown by a `Tj`/`TJ` operator. Builtin fonts are WinAnsi encoded,
/// which agrees with Latin-1 for report text.
fn shown_text(operands: &[Object]) -> String {
    let mut text = String::new();
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.extend(bytes.iter().map(|&b| char::from(b))),
            Object::Array(parts) => text.push_str(&shown_text(parts)),
            _ => {}
        }
    }
    text
}

fn pdf_error(e: lopdf::Error) -> ExportError {
    ExportError::Pdf(format!("read error: {e}"))
}

fn row_from_line(line: &[&PlacedText]) -> ExportResult<ReportRow> {
    let mut cells: Vec<&str> = Vec::with_capacity(COLUMN_X.len());
    for x in COLUMN_X {
        let cell = line
            .iter()
            .find(|item| item.x == x)
            .ok_or_else(|| ExportError::Malformed(format!("no cell at x={} on row", x)))?;
        cells.push(cell.text.as_str());
    }
    if line.len() != COLUMN_X.len() {
        return Err(ExportError::Malformed(format!(
            "row has {} cells, expected {}",
            line.len(),
            COLUMN_X.len()
        )));
    }
    ReportRow::from_cells(&cells)
}

impl PaymentReport {
    /// Lay out this report as a paginated document.
    pub fn to_document(&self) -> ReportDocument {
        ReportDocument::layout(self)
    }

    /// Render this report as PDF bytes.
    pub fn to_pdf(&self) -> ExportResult<Vec<u8>> {
        self.to_document().render_pdf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn report_with_rows(n: usize) -> PaymentReport {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = (0..n)
            .map(|i| ReportRow {
                appointment_id: i as i64 + 1,
                total_amount: 100.0 * (i as f64 + 1.0),
                clinic_share: 70.0 * (i as f64 + 1.0),
                doctor_share: 30.0 * (i as f64 + 1.0),
            })
            .collect();
        PaymentReport::new(date, date, rows)
    }

    #[test]
    fn test_first_page_layout() {
        let doc = report_with_rows(1).to_document();
        let page = &doc.pages[0];

        let title = &page.items[0];
        assert_eq!(title.kind, TextKind::Title);
        assert_eq!((title.x, title.y), (100.0, 750.0));

        let headers: Vec<_> = page
            .items
            .iter()
            .filter(|i| i.kind == TextKind::Header)
            .collect();
        assert_eq!(headers.len(), 4);
        assert!(headers.iter().all(|h| h.y == 700.0));

        let first_cell = page.items.iter().find(|i| i.kind == TextKind::Cell).unwrap();
        assert_eq!((first_cell.x, first_cell.y), (100.0, 680.0));
    }

    #[test]
    fn test_pagination_thresholds() {
        assert_eq!(report_with_rows(0).to_document().page_count(), 1);
        assert_eq!(report_with_rows(32).to_document().page_count(), 1);
        assert_eq!(report_with_rows(33).to_document().page_count(), 2);
        assert_eq!(report_with_rows(68).to_document().page_count(), 2);
        assert_eq!(report_with_rows(69).to_document().page_count(), 3);
    }

    #[test]
    fn test_continuation_page_starts_at_top() {
        let doc = report_with_rows(33).to_document();
        assert_eq!(doc.pages[0].row_count(), 32);
        assert_eq!(doc.pages[1].row_count(), 1);

        let second = &doc.pages[1];
        assert!(second.items.iter().all(|i| i.kind == TextKind::Cell));
        assert!(second.items.iter().all(|i| i.y == 750.0));
    }

    #[test]
    fn test_read_rows_across_pages() {
        let report = report_with_rows(75);
        let rows = report.to_document().read_rows().unwrap();
        assert_eq!(rows, report.rows);
    }

    #[test]
    fn test_read_rows_rejects_partial_row() {
        let mut doc = report_with_rows(2).to_document();
        doc.pages[0].items.pop();
        assert!(matches!(doc.read_rows(), Err(ExportError::Malformed(_))));
    }

    #[test]
    fn test_render_pdf() {
        let bytes = report_with_rows(40).to_pdf().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_rendered_pdf_matches_layout() {
        let report = report_with_rows(75);
        let layout = report.to_document();

        let parsed = ReportDocument::from_pdf(&report.to_pdf().unwrap()).unwrap();

        assert_eq!(parsed.page_count(), 3);
        assert_eq!(parsed.title, DOCUMENT_TITLE);
        assert_eq!(parsed, layout);
    }

    #[test]
    fn test_read_pdf_rows() {
        let report = report_with_rows(70);
        let rows = read_pdf(&report.to_pdf().unwrap()).unwrap();
        assert_eq!(rows, report.rows);
    }

    #[test]
    fn test_read_pdf_empty_report() {
        let report = report_with_rows(0);
        let parsed = ReportDocument::from_pdf(&report.to_pdf().unwrap()).unwrap();
        assert_eq!(parsed.page_count(), 1);
        assert_eq!(parsed.pages[0].items.len(), 1 + COLUMN_X.len());
        assert!(parsed.read_rows().unwrap().is_empty());
    }

    #[test]
    fn test_read_pdf_rejects_garbage() {
        assert!(matches!(
            ReportDocument::from_pdf(b"not a pdf"),
            Err(ExportError::Pdf(_))
        ));
    }
}
