//! Draws an [`OrderExport`] onto A4 pages with `printpdf`.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use printpdf::image_crate::{DynamicImage, GenericImageView};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Pt, Rect, Rgb,
};
use zeeorder_core::{LineItem, OrderExport};

use crate::error::ExportError;
use crate::images::ImageStore;
use crate::layout::{
    self, PageLayout, RowSlot, HEADER_HEIGHT, PAGE_HEIGHT, PAGE_WIDTH, ROW_HEIGHT,
    SUMMARY_HEIGHT, SUMMARY_WIDTH, SUMMARY_X, TABLE_HEAD_HEIGHT, TABLE_HEAD_Y, TABLE_WIDTH,
    TABLE_X,
};
use crate::money::{format_inr, format_plain};

const BRAND_TITLE: &str = "Zee Ordering";
const BRAND_TAGLINE: &str = "PREMIUM CATALOG MANAGEMENT SYSTEM";
const TIMESTAMP_FORMAT: &str = "%d %b %Y, %I:%M %p";

const IMAGE_X: f32 = 75.0;
const IMAGE_BOX: f32 = 40.0;
const DETAILS_X: f32 = 140.0;
const NAME_WIDTH: f32 = 190.0;

const SLATE_50: u32 = 0x00f8_fafc;
const SLATE_200: u32 = 0x00e2_e8f0;
const SLATE_300: u32 = 0x00cb_d5e1;
const SLATE_400: u32 = 0x0094_a3b8;
const SLATE_500: u32 = 0x0064_748b;
const SLATE_600: u32 = 0x0047_5569;
const SLATE_700: u32 = 0x0033_4155;
const SLATE_800: u32 = 0x001e_293b;
const SLATE_900: u32 = 0x000f_172a;
const WHITE: u32 = 0x00ff_ffff;

/// Render `order` to PDF bytes.
///
/// # Errors
///
/// - [`ExportError::NoItems`] when the order has no line items.
/// - [`ExportError::Amount`] when a subtotal or the grand total overflows.
/// - [`ExportError::Pdf`] if `printpdf` fails to load a font or serialize.
pub fn render_order(
    order: &OrderExport,
    images: &ImageStore,
    generated_at: DateTime<FixedOffset>,
) -> Result<Vec<u8>, ExportError> {
    if order.items.is_empty() {
        return Err(ExportError::NoItems);
    }
    let grand_total = order.grand_total().ok_or(ExportError::Amount)?;

    let order_ref = order.order_ref();
    let plan = layout::plan(order.items.len());
    let page_count = plan.page_count();

    let (doc, first_page, first_layer) =
        PdfDocument::new(&order_ref, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
    };

    let sheet = Sheet {
        order,
        order_ref: &order_ref,
        timestamp: generated_at.format(TIMESTAMP_FORMAT).to_string(),
        page_count,
        grand_total,
        fonts: &fonts,
        images,
    };

    for (idx, page) in plan.pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = doc.add_page(
                mm(PAGE_WIDTH),
                mm(PAGE_HEIGHT),
                format!("Page {}, Layer 1", idx + 1),
            );
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        sheet.draw_page(&layer, idx + 1, page);
    }

    tracing::debug!(
        order_ref = %order_ref,
        items = order.items.len(),
        pages = page_count,
        "order sheet rendered"
    );

    doc.save_to_bytes().map_err(pdf_error)
}

#[allow(clippy::needless_pass_by_value)]
fn pdf_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(e.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

struct Sheet<'a> {
    order: &'a OrderExport,
    order_ref: &'a str,
    timestamp: String,
    page_count: usize,
    grand_total: Decimal,
    fonts: &'a Fonts,
    images: &'a ImageStore,
}

impl Sheet<'_> {
    fn draw_page(&self, layer: &PdfLayerReference, page_number: usize, page: &PageLayout) {
        self.draw_header(layer, page_number);
        if page.table_head {
            self.draw_table_head(layer);
        }
        for slot in &page.rows {
            self.draw_row(layer, *slot, &self.order.items[slot.item]);
        }
        if let Some(y) = page.summary_y {
            self.draw_summary(layer, y);
        }
    }

    fn draw_header(&self, layer: &PdfLayerReference, page_number: usize) {
        let (regular, bold) = (&self.fonts.regular, &self.fonts.bold);
        fill_rect(layer, 0.0, 0.0, PAGE_WIDTH, HEADER_HEIGHT, SLATE_50);

        text(layer, BRAND_TITLE, 20.0, 40.0, 25.0, bold, SLATE_900);
        text(layer, BRAND_TAGLINE, 7.0, 40.0, 48.0, regular, SLATE_500);

        let right_x = 385.0;
        text(layer, "ORDER REFERENCE", 8.0, right_x, 25.0, bold, SLATE_900);
        text(layer, self.order_ref, 8.0, right_x, 35.0, regular, SLATE_700);
        text(layer, "GENERATED ON", 8.0, right_x, 50.0, bold, SLATE_900);
        text(layer, &self.timestamp, 8.0, right_x, 60.0, regular, SLATE_700);

        if let Some(client) = self
            .order
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            text(layer, "CLIENT:", 8.0, 40.0, 62.0, bold, SLATE_900);
            text(layer, &client.to_uppercase(), 8.0, 75.0, 62.0, regular, SLATE_700);
        }

        let label = format!("PAGE {page_number} OF {}", self.page_count);
        text_right(layer, &label, 7.0, 555.0, 62.0, regular, SLATE_400);
    }

    fn draw_table_head(&self, layer: &PdfLayerReference) {
        let bold = &self.fonts.bold;
        fill_rect(
            layer,
            TABLE_X,
            TABLE_HEAD_Y,
            TABLE_WIDTH,
            TABLE_HEAD_HEIGHT,
            SLATE_800,
        );

        let y = TABLE_HEAD_Y + 6.0;
        text(layer, "S.NO", 8.0, 45.0, y, bold, WHITE);
        text(layer, "IMAGE", 8.0, 85.0, y, bold, WHITE);
        text(layer, "PRODUCT DETAILS", 8.0, DETAILS_X, y, bold, WHITE);
        text_right(layer, "UNIT PRICE", 8.0, 410.0, y, bold, WHITE);
        text_center(layer, "QTY", 8.0, 440.0, y, bold, WHITE);
        text_right(layer, "SUBTOTAL", 8.0, 550.0, y, bold, WHITE);
    }

    fn draw_row(&self, layer: &PdfLayerReference, slot: RowSlot, item: &LineItem) {
        let (regular, bold) = (&self.fonts.regular, &self.fonts.bold);
        let y = slot.y;

        if slot.shaded {
            fill_rect(layer, TABLE_X, y, TABLE_WIDTH, ROW_HEIGHT, SLATE_50);
        }

        let index = (slot.item + 1).to_string();
        text(layer, &index, 8.0, 45.0, y + 22.0, regular, SLATE_600);

        let image = item
            .image_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .and_then(|u| self.images.load(u));
        match image {
            Some(image) => draw_image(layer, &image, IMAGE_X, y + 6.0),
            None => {
                stroke_rect(layer, IMAGE_X, y + 6.0, IMAGE_BOX, IMAGE_BOX, SLATE_300);
                text_center(
                    layer,
                    "NO IMAGE",
                    6.0,
                    IMAGE_X + IMAGE_BOX / 2.0,
                    y + 24.0,
                    regular,
                    SLATE_400,
                );
            }
        }

        let name = fit_width(&item.name, 9.0, NAME_WIDTH);
        text(layer, &name, 9.0, DETAILS_X, y + 10.0, bold, SLATE_900);
        let sku = item
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("N/A");
        text(layer, sku, 7.0, DETAILS_X, y + 24.0, regular, SLATE_500);

        let mut detail_y = y + 34.0;
        if let Some(brand) = item.brand.as_deref().filter(|b| !b.trim().is_empty()) {
            text(layer, &format!("Brand: {brand}"), 7.0, DETAILS_X, detail_y, regular, SLATE_600);
            detail_y += 9.0;
        }
        if let Some(comment) = item.comment.as_deref().filter(|c| !c.trim().is_empty()) {
            let note = fit_width(&format!("Note: {}", comment.trim()), 7.0, NAME_WIDTH);
            text(layer, &note, 7.0, DETAILS_X, detail_y, regular, SLATE_500);
        }

        let price = format_plain(item.unit_price);
        text_right(layer, &price, 9.0, 410.0, y + 22.0, regular, SLATE_900);
        text_center(layer, &format!("x{}", item.qty), 9.0, 440.0, y + 22.0, bold, SLATE_900);
        // grand_total succeeded, so every subtotal fits
        let subtotal = item.subtotal().map(format_plain).unwrap_or_default();
        text_right(layer, &subtotal, 9.0, 550.0, y + 22.0, bold, SLATE_900);

        hline(layer, TABLE_X, TABLE_X + TABLE_WIDTH, y + ROW_HEIGHT, SLATE_200);
    }

    fn draw_summary(&self, layer: &PdfLayerReference, y: f32) {
        fill_rect(layer, SUMMARY_X, y, SUMMARY_WIDTH, SUMMARY_HEIGHT, SLATE_800);
        text(
            layer,
            "GRAND TOTAL (INR)",
            7.0,
            SUMMARY_X + 12.0,
            y + 10.0,
            &self.fonts.regular,
            SLATE_400,
        );
        let total = format!("INR {}", format_inr(self.grand_total));
        text_right(
            layer,
            &total,
            13.0,
            SUMMARY_X + SUMMARY_WIDTH - 13.0,
            y + 22.0,
            &self.fonts.bold,
            WHITE,
        );
    }
}

// ---------------------------------------------------------------------------
// Drawing primitives (top-left coordinates in points)
// ---------------------------------------------------------------------------

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn flip(y: f32) -> f32 {
    PAGE_HEIGHT - y
}

fn color(hex: u32) -> Color {
    let channel = |shift: u32| f32::from(u8::try_from((hex >> shift) & 0xff).unwrap_or(0)) / 255.0;
    Color::Rgb(Rgb::new(channel(16), channel(8), channel(0), None))
}

fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::new(mm(x), mm(flip(y + h)), mm(x + w), mm(flip(y)))
}

fn fill_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, fill: u32) {
    layer.set_fill_color(color(fill));
    layer.add_rect(rect(x, y, w, h).with_mode(PaintMode::Fill));
}

fn stroke_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, stroke: u32) {
    layer.set_outline_color(color(stroke));
    layer.set_outline_thickness(0.2);
    layer.add_rect(rect(x, y, w, h).with_mode(PaintMode::Stroke));
}

fn hline(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32, stroke: u32) {
    layer.set_outline_color(color(stroke));
    layer.set_outline_thickness(0.1);
    layer.add_line(Line {
        points: vec![
            (Point::new(mm(x1), mm(flip(y))), false),
            (Point::new(mm(x2), mm(flip(y))), false),
        ],
        is_closed: false,
    });
}

/// Draw `value` with its top edge at `y`.
fn text(
    layer: &PdfLayerReference,
    value: &str,
    size: f32,
    x: f32,
    y: f32,
    font: &IndirectFontRef,
    fill: u32,
) {
    let baseline = y + size * 0.8;
    layer.set_fill_color(color(fill));
    layer.use_text(printable(value), size, mm(x), mm(flip(baseline)), font);
}

fn text_right(
    layer: &PdfLayerReference,
    value: &str,
    size: f32,
    right: f32,
    y: f32,
    font: &IndirectFontRef,
    fill: u32,
) {
    let x = right - text_width(value, size);
    text(layer, value, size, x, y, font, fill);
}

fn text_center(
    layer: &PdfLayerReference,
    value: &str,
    size: f32,
    center: f32,
    y: f32,
    font: &IndirectFontRef,
    fill: u32,
) {
    let x = center - text_width(value, size) / 2.0;
    text(layer, value, size, x, y, font, fill);
}

/// Scale `image` to fit the square image cell, centred, keeping aspect ratio.
fn draw_image(layer: &PdfLayerReference, image: &DynamicImage, x: f32, y: f32) {
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (image.width() as f32, image.height() as f32);
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let scale = (IMAGE_BOX / w).min(IMAGE_BOX / h);
    let (drawn_w, drawn_h) = (w * scale, h * scale);
    let left = x + (IMAGE_BOX - drawn_w) / 2.0;
    let bottom = y + (IMAGE_BOX - drawn_h) / 2.0 + drawn_h;

    Image::from_dynamic_image(image).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm(left)),
            translate_y: Some(mm(flip(bottom))),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(72.0),
            ..ImageTransform::default()
        },
    );
}

// ---------------------------------------------------------------------------
// Text metrics for the built-in Helvetica faces
// ---------------------------------------------------------------------------

/// Built-in fonts only cover single-byte text; anything outside printable
/// ASCII is replaced.
fn printable(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() {
                c
            } else {
                '?'
            }
        })
        .collect()
}

/// Approximate advance width in points, using Helvetica's per-1000 em widths
/// for the glyph classes that appear in prices and labels.
fn text_width(value: &str, size: f32) -> f32 {
    let units: u32 = value
        .chars()
        .map(|c| match c {
            '0'..='9' => 556,
            ' ' | ',' | '.' | ':' | 'i' | 'j' | 'l' | 'I' | '!' | '/' => 278,
            'f' | 't' | 'r' => 333,
            'M' | 'W' | 'm' | 'w' => 833,
            'A'..='Z' => 667,
            'a'..='z' => 500,
            _ => 556,
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let em = units as f32 / 1000.0;
    em * size
}

/// Trim `value` with a trailing `...` until it fits in `max_width` points.
fn fit_width(value: &str, size: f32, max_width: f32) -> String {
    let value = printable(value.trim());
    if text_width(&value, size) <= max_width {
        return value;
    }
    let ellipsis_width = text_width("...", size);
    let mut out = String::new();
    for c in value.chars() {
        let mut candidate = out.clone();
        candidate.push(c);
        if text_width(&candidate, size) + ellipsis_width > max_width {
            break;
        }
        out = candidate;
    }
    format!("{}...", out.trim_end())
}
