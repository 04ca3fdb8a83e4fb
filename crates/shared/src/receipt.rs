//! PDF order receipts.
//!
//! Receipts are plain A4 text documents. With no font configured they use
//! the built-in Helvetica, which only covers Latin-1, so Bengali text is
//! replaced and amounts are printed as `Tk 1250.00`. Pointing
//! `RECEIPT_FONT_PATH` at a TTF with Bengali glyphs keeps the original text;
//! glyphs are placed one by one without shaping, so conjuncts may render
//! unjoined.

use std::path::Path;
use std::sync::Arc;

use chrono::FixedOffset;
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use thiserror::Error;

use dokan_core::Money;

use crate::models::{Order, OrderItem};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 15.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 25.0;
const LINE_HEIGHT: f32 = 6.0;
const MAX_ITEM_NAME_CHARS: usize = 60;
/// Characters per line for free text such as the address and note.
const WRAP_CHARS: usize = 90;

/// Item table column positions (mm from the left edge).
const COL_QTY: f32 = 122.0;
const COL_UNIT: f32 = 140.0;
const COL_TOTAL: f32 = 168.0;

/// Bangladesh Standard Time, UTC+6.
const BST_OFFSET_SECS: i32 = 6 * 3600;

/// Errors that can occur while rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The configured font file could not be read.
    #[error("failed to read receipt font: {0}")]
    Font(#[from] std::io::Error),

    /// The PDF library rejected the document.
    #[error("failed to build PDF: {0}")]
    Pdf(String),
}

/// `receipt-DK000042.pdf`
#[must_use]
pub fn receipt_filename(order_number: &str) -> String {
    let safe: String = order_number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    format!("receipt-{safe}.pdf")
}

/// `Content-Disposition` header value that downloads the receipt.
#[must_use]
pub fn content_disposition(order_number: &str) -> String {
    format!("attachment; filename=\"{}\"", receipt_filename(order_number))
}

/// Replace characters outside Latin-1 with `?`, collapsing runs.
#[must_use]
pub fn latin1_lossy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_replaced = false;
    for c in text.chars() {
        if u32::from(c) <= 0xFF {
            out.push(c);
            last_replaced = false;
        } else if !last_replaced {
            out.push('?');
            last_replaced = true;
        }
    }
    out
}

/// Renders receipts for one store. Cheap to clone.
#[derive(Clone)]
pub struct ReceiptRenderer {
    store_name: Arc<str>,
    font: Option<Arc<[u8]>>,
}

impl std::fmt::Debug for ReceiptRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptRenderer")
            .field("store_name", &self.store_name)
            .field("external_font", &self.font.is_some())
            .finish()
    }
}

/// Line item view for receipts.
struct ReceiptLine {
    name: String,
    quantity: String,
    unit: String,
    total: String,
}

impl ReceiptLine {
    fn from_item(item: &OrderItem, unicode: bool) -> Self {
        let mut name = if unicode && !item.product_name.bn.trim().is_empty() {
            format!("{} / {}", item.product_name.en, item.product_name.bn)
        } else {
            item.product_name.en.clone()
        };
        let variant: Vec<&str> = [item.size.as_deref(), item.color.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !variant.is_empty() {
            name = format!("{name} ({})", variant.join(", "));
        }
        if name.chars().count() > MAX_ITEM_NAME_CHARS {
            name = name.chars().take(MAX_ITEM_NAME_CHARS - 3).collect::<String>() + "...";
        }

        Self {
            name,
            quantity: item.quantity.to_string(),
            unit: money(item.unit_price),
            total: money(item.line_total),
        }
    }
}

/// Break `text` into lines of at most `width` characters on word
/// boundaries. Words longer than a line are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(width) {
            if current_len > 0 && current_len + 1 + chunk.len() > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(chunk);
            current_len += chunk.len();
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

fn money(amount: rust_decimal::Decimal) -> String {
    Money::new(amount).map_or_else(|_| format!("Tk {amount:.2}"), Money::plain)
}

/// Writes text top to bottom, starting new pages as needed.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    unicode: bool,
    y: f32,
    pages: usize,
}

impl PageWriter<'_> {
    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        let text = if self.unicode {
            text.to_string()
        } else {
            latin1_lossy(text)
        };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.ensure_room(1.0);
        self.text(text, size, MARGIN_LEFT, bold);
        self.y -= LINE_HEIGHT;
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }

    fn ensure_room(&mut self, lines: f32) -> bool {
        if self.y - lines * LINE_HEIGHT >= BOTTOM {
            return false;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
        self.pages += 1;
        true
    }

    fn table_header(&mut self) {
        self.text("Item", 10.0, MARGIN_LEFT, true);
        self.text("Qty", 10.0, COL_QTY, true);
        self.text("Unit", 10.0, COL_UNIT, true);
        self.text("Total", 10.0, COL_TOTAL, true);
        self.y -= LINE_HEIGHT;
    }

    fn table_row(&mut self, line: &ReceiptLine) {
        if self.ensure_room(1.0) {
            self.table_header();
        }
        self.text(&line.name, 10.0, MARGIN_LEFT, false);
        self.text(&line.quantity, 10.0, COL_QTY, false);
        self.text(&line.unit, 10.0, COL_UNIT, false);
        self.text(&line.total, 10.0, COL_TOTAL, false);
        self.y -= LINE_HEIGHT;
    }

    fn amount_row(&mut self, label: &str, amount: &str, bold: bool) {
        self.ensure_room(1.0);
        self.text(label, 11.0, COL_UNIT - 20.0, bold);
        self.text(amount, 11.0, COL_TOTAL, bold);
        self.y -= LINE_HEIGHT;
    }
}

impl ReceiptRenderer {
    /// Create a renderer, reading the TTF at `font_path` when given.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::Font` if the font file cannot be read.
    pub fn new(store_name: &str, font_path: Option<&Path>) -> Result<Self, ReceiptError> {
        let font = font_path
            .map(std::fs::read)
            .transpose()?
            .map(Arc::from);

        Ok(Self {
            store_name: Arc::from(store_name),
            font,
        })
    }

    /// Render the receipt for `order` as PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::Pdf` if the document cannot be built.
    pub fn render(&self, order: &Order) -> Result<Vec<u8>, ReceiptError> {
        let title = format!("Receipt {}", order.order_number);
        let (doc, page, layer) =
            PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

        let (regular, bold) = match &self.font {
            Some(bytes) => {
                let font = doc
                    .add_external_font(bytes.as_ref())
                    .map_err(|e| ReceiptError::Pdf(e.to_string()))?;
                (font.clone(), font)
            }
            None => (
                doc.add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| ReceiptError::Pdf(e.to_string()))?,
                doc.add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| ReceiptError::Pdf(e.to_string()))?,
            ),
        };

        let mut w = PageWriter {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            regular,
            bold,
            unicode: self.font.is_some(),
            y: TOP,
            pages: 1,
        };

        w.line(&self.store_name, 18.0, true);
        w.line("Order receipt", 12.0, false);
        w.gap();

        let placed = FixedOffset::east_opt(BST_OFFSET_SECS).map_or_else(
            || order.created_at.format("%d %b %Y %H:%M UTC").to_string(),
            |bst| {
                order
                    .created_at
                    .with_timezone(&bst)
                    .format("%d %b %Y %H:%M")
                    .to_string()
            },
        );
        w.line(&format!("Order number: {}", order.order_number), 11.0, true);
        w.line(&format!("Date: {placed}"), 10.0, false);
        w.line(&format!("Status: {}", order.status), 10.0, false);
        w.line(
            &format!("Payment: {}", order.payment_method.label()),
            10.0,
            false,
        );
        w.gap();

        w.line("Deliver to", 11.0, true);
        w.line(&order.customer_name, 10.0, false);
        w.line(&order.phone, 10.0, false);
        if let Some(email) = &order.email {
            w.line(email, 10.0, false);
        }
        let address = if order.city.is_empty() {
            order.address.clone()
        } else {
            format!("{}, {}", order.address, order.city)
        };
        for line in wrap_text(&address, WRAP_CHARS) {
            w.line(&line, 10.0, false);
        }
        if let Some(tracking) = &order.tracking_code {
            w.line(&format!("Tracking code: {tracking}"), 10.0, false);
        }
        w.gap();

        w.ensure_room(2.0);
        w.table_header();
        for item in &order.items {
            let line = ReceiptLine::from_item(item, w.unicode);
            w.table_row(&line);
        }
        w.gap();

        w.amount_row("Subtotal", &money(order.subtotal), false);
        w.amount_row("Shipping", &money(order.shipping_charge), false);
        w.amount_row("Total", &money(order.total), true);
        w.gap();

        if let Some(note) = order.note.as_deref().filter(|n| !n.trim().is_empty()) {
            for line in wrap_text(&format!("Note: {note}"), WRAP_CHARS) {
                w.line(&line, 9.0, false);
            }
        }
        w.line(
            &format!("Thank you for shopping with {}.", self.store_name),
            9.0,
            false,
        );

        tracing::debug!(order_number = %order.order_number, pages = w.pages, "rendered receipt");

        doc.save_to_bytes()
            .map_err(|e| ReceiptError::Pdf(e.to_string()))
    }
}
