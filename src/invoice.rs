//! Invoice
//!
//! Built from the order captured when payment succeeds, so it still reflects the cart after the
//! cart itself has been emptied. Renders as a text table or as an A4 PDF saved as
//! [`INVOICE_FILE_NAME`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;
use tracing::info;

use crate::{
    money::{RUPEE_SYMBOL, format_rupees},
    order::Order,
    pricing::Totals,
    vendors::format_points,
};

/// File name the invoice is saved under.
pub const INVOICE_FILE_NAME: &str = "invoice.pdf";

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_LEFT: Mm = Mm(10.0);
const MARGIN_BOTTOM: f32 = 15.0;
const TABLE_LINE_HEIGHT: f32 = 5.0;
const SUMMARY_LINE_HEIGHT: f32 = 10.0;

/// Builtin PDF fonts only cover WinAnsi, which has no rupee sign.
const PDF_RUPEE: &str = "Rs.";

/// Errors that can occur while producing the invoice.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Checkout hasn't completed, so there is nothing to invoice.
    #[error("invoice is not available until checkout is done")]
    NotReady,

    /// The PDF couldn't be produced.
    #[error("failed to render invoice PDF: {0}")]
    Pdf(String),

    /// The PDF couldn't be written to disk.
    #[error("failed to write invoice")]
    Io(#[from] std::io::Error),
}

/// A row of the invoice table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    /// Product name
    pub product: String,

    /// Formatted unit price
    pub price: String,

    /// Quantity bought
    pub quantity: u32,

    /// Formatted unit price times quantity
    pub subtotal: String,
}

/// Invoice for a paid order.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    lines: Vec<InvoiceLine>,
    totals: Totals,
}

impl Invoice {
    /// Build the invoice for a paid order.
    pub fn from_order(order: &Order) -> Self {
        let lines = order
            .lines()
            .iter()
            .map(|line| InvoiceLine {
                product: line.name.clone(),
                price: format_rupees(&line.unit_price),
                quantity: line.quantity.get(),
                subtotal: format_rupees(&line.line_total),
            })
            .collect();

        Self {
            lines,
            totals: *order.totals(),
        }
    }

    /// Table rows.
    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    /// Totals printed under the table.
    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// The subtotal, discount and total lines.
    pub fn summary(&self) -> [String; 3] {
        [
            format!("Subtotal: {}", format_rupees(&self.totals.subtotal)),
            format!(
                "Discount ({}%): {}",
                format_points(self.totals.discount_points),
                format_rupees(&self.totals.discount)
            ),
            format!("Total: {}", format_rupees(&self.totals.total)),
        ]
    }

    /// Render the product table.
    pub fn table(&self) -> String {
        self.build_table(RUPEE_SYMBOL)
            .with(Style::modern_rounded())
            .to_string()
    }

    /// Render the whole invoice as text.
    pub fn to_text(&self) -> String {
        let mut out = String::from("Invoice\n\n");

        out.push_str(&self.table());
        out.push('\n');

        for line in self.summary() {
            out.push('\n');
            out.push_str(&line);
        }

        out.push('\n');
        out
    }

    /// Render the invoice as a PDF document.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError::Pdf`] if the document can't be assembled.
    pub fn to_pdf(&self) -> Result<Vec<u8>, InvoiceError> {
        let (doc, page, layer) = PdfDocument::new("Invoice", PAGE_WIDTH, PAGE_HEIGHT, "Invoice");

        let fonts = PdfFonts::load(&doc)?;
        let mut cursor = PdfCursor {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT.0 - 10.0,
        };

        cursor.write("Invoice", 18.0, &fonts.heading, SUMMARY_LINE_HEIGHT);

        for row in self.pdf_table().lines() {
            cursor.write(row, 10.0, &fonts.table, TABLE_LINE_HEIGHT);
        }

        cursor.skip(SUMMARY_LINE_HEIGHT - TABLE_LINE_HEIGHT);

        let [subtotal, discount, total] = self.summary();

        cursor.write(&pdf_text(&subtotal), 12.0, &fonts.body, SUMMARY_LINE_HEIGHT);
        cursor.write(&pdf_text(&discount), 12.0, &fonts.body, SUMMARY_LINE_HEIGHT);
        cursor.write(&pdf_text(&total), 14.0, &fonts.heading, SUMMARY_LINE_HEIGHT);

        doc.save_to_bytes()
            .map_err(|error| InvoiceError::Pdf(error.to_string()))
    }

    /// Render the PDF and write it to `dir/invoice.pdf`.
    ///
    /// # Errors
    ///
    /// - [`InvoiceError::Pdf`] if the document can't be assembled.
    /// - [`InvoiceError::Io`] if the file can't be written.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, InvoiceError> {
        let path = dir.join(INVOICE_FILE_NAME);

        fs::write(&path, self.to_pdf()?)?;

        info!(path = %path.display(), lines = self.lines.len(), "saved invoice");

        Ok(path)
    }

    /// Monospaced table for the PDF, laid out after the rupee sign is swapped out.
    fn pdf_table(&self) -> String {
        self.build_table(PDF_RUPEE).with(Style::ascii()).to_string()
    }

    fn build_table(&self, symbol: &str) -> Table {
        let mut builder = Builder::default();

        builder.push_record(["Product", "Price", "Qty", "Subtotal"]);

        for line in &self.lines {
            builder.push_record([
                line.product.clone(),
                line.price.replace(RUPEE_SYMBOL, symbol),
                line.quantity.to_string(),
                line.subtotal.replace(RUPEE_SYMBOL, symbol),
            ]);
        }

        let mut table = builder.build();

        table.modify(Columns::new(1..4), Alignment::right());

        table
    }
}

struct PdfFonts {
    heading: IndirectFontRef,
    body: IndirectFontRef,
    table: IndirectFontRef,
}

impl PdfFonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, InvoiceError> {
        let load = |builtin| {
            doc.add_builtin_font(builtin)
                .map_err(|error| InvoiceError::Pdf(error.to_string()))
        };

        Ok(Self {
            heading: load(BuiltinFont::HelveticaBold)?,
            body: load(BuiltinFont::Helvetica)?,
            table: load(BuiltinFont::Courier)?,
        })
    }
}

/// Writes lines top to bottom, starting a new page when the bottom margin is reached.
struct PdfCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: printpdf::PdfLayerReference,
    y: f32,
}

impl PdfCursor<'_> {
    fn write(&mut self, text: &str, size: f32, font: &IndirectFontRef, advance: f32) {
        if self.y < MARGIN_BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Invoice");

            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT.0 - 10.0;
        }

        self.layer.use_text(text, size, MARGIN_LEFT, Mm(self.y), font);
        self.y -= advance;
    }

    fn skip(&mut self, amount: f32) {
        self.y -= amount;
    }
}

fn pdf_text(text: &str) -> String {
    text.replace(RUPEE_SYMBOL, PDF_RUPEE)
}
