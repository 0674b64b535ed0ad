//! Spreadsheet and PDF rendering of exported answers.
//!
//! Rendering is CPU-bound; the async entry points run it on the blocking pool.

use domain::models::response::{ExportRow, EXPORT_HEADERS};
use domain::services::text::ascii_safe;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ExportConfig;
use crate::error::ApiError;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const SHEET_NAME: &str = "Responses";
const MIN_COLUMN_WIDTH: usize = 12;
const MAX_COLUMN_WIDTH: usize = 60;

const PT_TO_MM: f32 = 25.4 / 72.0;
const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const MARGIN_PT: f32 = 24.0;
const TITLE_SIZE_PT: f32 = 14.0;
const TEXT_SIZE_PT: f32 = 8.0;
const LINE_HEIGHT_PT: f32 = 10.0;
const ROW_PADDING_PT: f32 = 3.0;
/// Rough advance of one glyph at 8pt, used to wrap cells within their column.
const GLYPH_WIDTH_MM: f32 = 1.6;
const COLUMN_GAP_MM: f32 = 1.5;
/// Relative widths of the exported columns.
const PDF_COLUMN_WEIGHTS: [f32; 10] = [0.6, 1.4, 0.5, 1.4, 0.6, 2.2, 0.9, 0.5, 1.2, 2.2];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Export task failed: {0}")]
    Task(String),
}

impl From<printpdf::Error> for ExportError {
    fn from(err: printpdf::Error) -> Self {
        ExportError::Pdf(err.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Renders the rows into an XLSX workbook on the blocking pool.
pub async fn export_xlsx(rows: Vec<ExportRow>) -> Result<Vec<u8>, ExportError> {
    tokio::task::spawn_blocking(move || render_xlsx(&rows))
        .await
        .map_err(|e| ExportError::Task(e.to_string()))?
}

/// Renders the rows into a PDF on the blocking pool.
pub async fn export_pdf(rows: Vec<ExportRow>, config: ExportConfig) -> Result<Vec<u8>, ExportError> {
    tokio::task::spawn_blocking(move || render_pdf(&rows, &config))
        .await
        .map_err(|e| ExportError::Task(e.to_string()))?
}

/// Column width for the longest value of a column, in characters.
pub fn column_width(longest: usize) -> usize {
    longest.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH) + 2
}

pub fn render_xlsx(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0x0A1F3D))
        .set_background_color(Color::RGB(0x0AD1FF))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xDDDDDD))
        .set_align(FormatAlign::VerticalCenter);

    let mut longest: Vec<usize> = EXPORT_HEADERS.iter().map(|h| h.chars().count()).collect();

    for (col, title) in EXPORT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let line = (idx + 1) as u32;
        for (col, cell) in row.cells().iter().enumerate() {
            longest[col] = longest[col].max(cell.chars().count());
            match col {
                0 | 2 | 4 => {
                    let number = match col {
                        0 => row.response_id,
                        2 => row.survey_id,
                        _ => row.question_id,
                    };
                    sheet.write_number(line, col as u16, number as f64)?;
                }
                7 => {
                    if let Some(rating) = row.rating {
                        sheet.write_number(line, col as u16, rating as f64)?;
                    }
                }
                _ => {
                    sheet.write_string(line, col as u16, cell.as_str())?;
                }
            }
        }
    }

    for (col, len) in longest.iter().enumerate() {
        sheet.set_column_width(col as u16, column_width(*len) as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Font used for the PDF body.
enum PdfFont {
    /// TTF bytes of a Unicode-capable font.
    External(Vec<u8>),
    Builtin,
}

/// Reads the first candidate font file that exists and is readable.
fn load_font(paths: &[String]) -> Option<Vec<u8>> {
    paths.iter().find_map(|path| {
        let path = Path::new(path);
        match std::fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => {
                debug!(font = %path.display(), "Using PDF font");
                Some(bytes)
            }
            _ => None,
        }
    })
}

/// Renders the rows into a landscape A4 PDF.
///
/// An external font is tried first; when it cannot be embedded the document
/// is rendered again with Helvetica and ASCII-safe text.
pub fn render_pdf(rows: &[ExportRow], config: &ExportConfig) -> Result<Vec<u8>, ExportError> {
    if let Some(bytes) = load_font(&config.pdf_font_paths) {
        match render_pdf_with(rows, &config.pdf_title, PdfFont::External(bytes)) {
            Ok(pdf) => return Ok(pdf),
            Err(e) => warn!(error = %e, "PDF render with external font failed, retrying with Helvetica"),
        }
    }
    render_pdf_with(rows, &config.pdf_title, PdfFont::Builtin)
}

fn margin_mm() -> f32 {
    MARGIN_PT * PT_TO_MM
}

/// Widths of the PDF columns in millimetres, filling the printable width.
fn column_widths() -> Vec<f32> {
    let usable_width = PAGE_WIDTH_MM - 2.0 * margin_mm();
    let weight_sum: f32 = PDF_COLUMN_WEIGHTS.iter().sum();
    PDF_COLUMN_WEIGHTS
        .iter()
        .map(|w| usable_width * w / weight_sum)
        .collect()
}

/// Characters that fit on one line of a column `width_mm` wide.
fn chars_per_line(width_mm: f32, size_pt: f32) -> usize {
    let glyph = GLYPH_WIDTH_MM * size_pt / TEXT_SIZE_PT;
    (((width_mm - COLUMN_GAP_MM) / glyph).floor() as usize).max(1)
}

fn render_pdf_with(rows: &[ExportRow], title: &str, font: PdfFont) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

    let (font_ref, ascii_only) = match font {
        PdfFont::External(bytes) => (doc.add_external_font(Cursor::new(bytes))?, false),
        PdfFont::Builtin => (doc.add_builtin_font(BuiltinFont::Helvetica)?, true),
    };
    let text = |value: &str| -> String {
        if ascii_only {
            ascii_safe(value)
        } else {
            value.to_string()
        }
    };

    let margin = margin_mm();
    let widths = column_widths();
    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        font: &font_ref,
        header: EXPORT_HEADERS.iter().map(|h| text(h)).collect(),
        widths: &widths,
        margin,
        line_height: LINE_HEIGHT_PT * PT_TO_MM,
        padding: ROW_PADDING_PT * PT_TO_MM,
        y: PAGE_HEIGHT_MM - margin,
        body_top: PAGE_HEIGHT_MM - margin,
    };

    let title_height = TITLE_SIZE_PT * PT_TO_MM;
    let title_width = PAGE_WIDTH_MM - 2.0 * margin;
    for line in wrap(&text(title), chars_per_line(title_width, TITLE_SIZE_PT)) {
        writer.y -= title_height;
        writer
            .layer
            .use_text(line, TITLE_SIZE_PT, Mm(margin), Mm(writer.y), &font_ref);
    }
    writer.y -= writer.line_height;
    writer.header();

    for row in rows {
        let cells: Vec<String> = row.cells().iter().map(|c| text(c)).collect();
        writer.row(&cells);
    }

    drop(writer);
    Ok(doc.save_to_bytes()?)
}

/// Cursor over the current page, starting new pages as rows run out.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    header: Vec<String>,
    widths: &'a [f32],
    margin: f32,
    line_height: f32,
    padding: f32,
    y: f32,
    /// Cursor position right below the header of the current page.
    body_top: f32,
}

impl PageWriter<'_> {
    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT_MM - self.margin;
        self.header();
    }

    fn header(&mut self) {
        let cells = wrap_cells(&self.header, self.widths);
        self.draw(&cells);
        self.body_top = self.y;
    }

    /// Draws one table row, as tall as its longest wrapped cell. A row that
    /// does not fit goes to a new page; a row taller than a whole page
    /// continues on the next one.
    fn row(&mut self, cells: &[String]) {
        let wrapped = wrap_cells(cells, self.widths);
        let height = row_lines(&wrapped) as f32 * self.line_height + self.padding;
        if self.y - height < self.margin && self.y < self.body_top {
            self.new_page();
        }
        self.draw(&wrapped);
    }

    fn draw(&mut self, wrapped: &[Vec<String>]) {
        self.y -= self.padding;
        for idx in 0..row_lines(wrapped) {
            if self.y - self.line_height < self.margin {
                self.new_page();
            }
            self.y -= self.line_height;
            let mut x = self.margin;
            for (lines, width) in wrapped.iter().zip(self.widths) {
                if let Some(line) = lines.get(idx).filter(|l| !l.is_empty()) {
                    self.layer
                        .use_text(line.as_str(), TEXT_SIZE_PT, Mm(x), Mm(self.y), self.font);
                }
                x += width;
            }
        }
    }
}

/// Wraps every cell to the width of its column.
fn wrap_cells(cells: &[String], widths: &[f32]) -> Vec<Vec<String>> {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| wrap(cell, chars_per_line(*width, TEXT_SIZE_PT)))
        .collect()
}

fn row_lines(wrapped: &[Vec<String>]) -> usize {
    wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1)
}

/// Breaks `value` into lines of at most `max_chars` characters.
///
/// Lines break between words and at explicit line breaks; a word longer
/// than a whole line is split across lines. Always returns at least one line.
fn wrap(value: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
        .collect();

    let mut lines = Vec::new();
    for paragraph in cleaned.split('\n') {
        let mut current = String::new();
        let mut len = 0;
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if len > 0 && len + 1 + word_len <= max_chars {
                current.push(' ');
                current.push_str(word);
                len += 1 + word_len;
                continue;
            }
            if len > 0 {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(max_chars).peekable();
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() {
                    lines.push(chunk.iter().collect());
                } else {
                    current = chunk.iter().collect();
                    len = chunk.len();
                }
            }
        }
        lines.push(current);
    }
    lines
}
