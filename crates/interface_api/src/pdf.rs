//! PDF export
//!
//! Renders an [`InvoiceExport`] onto A4 pages with the built-in Helvetica
//! faces. Built-in fonts only cover Latin-1, so currency symbols outside it
//! are replaced by the ISO code and other unsupported characters by `?`.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use thiserror::Error;

use domain_invoicing::{InvoiceExport, InvoiceView};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LAYER: &str = "Invoice";

/// Column x positions for the items table
const COL_DESCRIPTION: f32 = MARGIN;
const COL_QUANTITY: f32 = 112.0;
const COL_RATE: f32 = 132.0;
const COL_AMOUNT: f32 = 162.0;

/// Characters per line that fit the body text at 10pt
const WRAP_WIDTH: usize = 90;
const DESCRIPTION_WIDTH: usize = 48;

#[derive(Debug, Error)]
#[error("PDF rendering failed: {0}")]
pub struct PdfError(String);

/// Renders the invoice as a PDF document
pub fn render_invoice(export: &InvoiceExport) -> Result<Vec<u8>, PdfError> {
    let view = &export.view;
    let mut page = Cursor::new(&format!("Invoice {}", view.number))?;

    page.text("INVOICE", 24.0, MARGIN, Face::Bold);
    page.advance(12.0);
    page.text(&export.issuer, 12.0, MARGIN, Face::Regular);
    page.advance(10.0);

    page.labelled("Invoice #:", &view.number);
    page.labelled("Date:", &view.issue_date.format("%B %d, %Y").to_string());
    page.labelled("Due Date:", &view.due_date.format("%B %d, %Y").to_string());
    page.labelled("Status:", view.status.as_str());
    page.advance(8.0);

    page.text("Bill To:", 14.0, MARGIN, Face::Bold);
    page.advance(7.0);
    page.paragraph(&view.client.name);
    if let Some(email) = &view.client.email {
        page.paragraph(email);
    }
    if let Some(address) = &view.client.address {
        page.paragraph(address);
    }
    page.advance(8.0);

    items_table(&mut page, view);
    page.advance(6.0);

    page.labelled("Subtotal:", &printable_amount(view, &view.formatted.subtotal));
    page.labelled(
        &format!("Tax ({}%):", view.tax_rate.normalize()),
        &printable_amount(view, &view.formatted.tax_amount),
    );
    page.text("Total:", 14.0, MARGIN, Face::Bold);
    page.text(&printable_amount(view, &view.formatted.total), 14.0, MARGIN + 30.0, Face::Bold);
    page.advance(8.0);

    if let Some(notes) = &view.notes {
        page.advance(6.0);
        page.text("Notes:", 12.0, MARGIN, Face::Bold);
        page.advance(6.0);
        page.paragraph(notes);
    }

    page.finish()
}

fn items_table(page: &mut Cursor, view: &InvoiceView) {
    let header = |page: &mut Cursor| {
        page.text("Description", 11.0, COL_DESCRIPTION, Face::Bold);
        page.text("Qty", 11.0, COL_QUANTITY, Face::Bold);
        page.text("Rate", 11.0, COL_RATE, Face::Bold);
        page.text("Amount", 11.0, COL_AMOUNT, Face::Bold);
        page.advance(7.0);
    };

    header(page);
    for item in &view.items {
        if page.advance_would_break(6.0) {
            page.new_page();
            header(page);
        }
        page.text(&truncate(&item.description, DESCRIPTION_WIDTH), 10.0, COL_DESCRIPTION, Face::Regular);
        page.text(&item.quantity.normalize().to_string(), 10.0, COL_QUANTITY, Face::Regular);
        page.text(&printable_amount(view, &item.formatted_rate), 10.0, COL_RATE, Face::Regular);
        page.text(&printable_amount(view, &item.formatted_amount), 10.0, COL_AMOUNT, Face::Regular);
        page.advance(6.0);
    }
}

#[derive(Debug, Clone, Copy)]
enum Face {
    Regular,
    Bold,
}

/// Write position on the current page, in mm from the bottom edge
struct Cursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Cursor {
    fn new(title: &str) -> Result<Self, PdfError> {
        let (doc, page, layer) = PdfDocument::new(printable(title), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| PdfError(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| PdfError(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn text(&self, text: &str, size: f32, x: f32, face: Face) {
        let font = match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
        };
        self.layer.use_text(printable(text), size, Mm(x), Mm(self.y), font);
    }

    fn labelled(&mut self, label: &str, value: &str) {
        self.text(label, 10.0, MARGIN, Face::Bold);
        self.text(value, 10.0, MARGIN + 30.0, Face::Regular);
        self.advance(6.0);
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, WRAP_WIDTH) {
            self.text(&line, 10.0, MARGIN, Face::Regular);
            self.advance(5.0);
        }
    }

    fn advance_would_break(&self, mm: f32) -> bool {
        self.y - mm < MARGIN
    }

    fn advance(&mut self, mm: f32) {
        if self.advance_would_break(mm) {
            self.new_page();
        } else {
            self.y -= mm;
        }
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn finish(self) -> Result<Vec<u8>, PdfError> {
        self.doc.save_to_bytes().map_err(|e| PdfError(e.to_string()))
    }
}

fn is_latin1(c: char) -> bool {
    u32::from(c) <= 0xFF
}

/// Replaces characters the built-in fonts cannot draw
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if is_latin1(c) && !c.is_control() { c } else { '?' })
        .collect()
}

/// Formatted amount with the symbol swapped for the ISO code when the
/// symbol cannot be drawn
fn printable_amount(view: &InvoiceView, formatted: &str) -> String {
    if view.currency_symbol.chars().all(is_latin1) {
        formatted.to_string()
    } else {
        formatted.replacen(&view.currency_symbol, &format!("{} ", view.currency), 1)
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Greedy word wrap by character count; overlong words are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() { 0 } else { 1 } + word.chars().count();
        if current.chars().count() + needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
