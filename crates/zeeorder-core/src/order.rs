//! Order drafts and export payloads.
//!
//! A cart is never persisted. The browsing client builds one, then posts its
//! line items once to produce a PDF.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of an order being exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub sku: Option<String>,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub comment: Option<String>,
}

impl LineItem {
    /// `unit_price × qty`, or `None` if the product overflows [`Decimal`].
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.qty))
    }
}

/// Request body for an order export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderExport {
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl OrderExport {
    /// Reference printed on the sheet and used as the download file name.
    #[must_use]
    pub fn order_ref(&self) -> String {
        match self.order_number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => format!("ZeeReOrder-{n}"),
            _ => "ZeeReOrder-TEMP".to_string(),
        }
    }

    /// Exact sum of every line's `unit_price × qty`.
    ///
    /// Returns `None` when any subtotal or the running sum overflows.
    #[must_use]
    pub fn grand_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.subtotal()?))
    }
}

/// The subset of a product row a cart needs to remember.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: CartProduct,
    pub qty: u32,
    pub comment: String,
}

/// Ordered set of chosen products, keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn qty_of(&self, product_id: Uuid) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product.id == product_id)
            .map_or(0, |l| l.qty)
    }

    /// Set the quantity for `product`. A quantity of zero or less removes the
    /// line; otherwise an existing line is updated in place or a new line is
    /// appended.
    pub fn set_qty(&mut self, product: CartProduct, qty: i64) {
        let position = self.lines.iter().position(|l| l.product.id == product.id);
        let qty = u32::try_from(qty).unwrap_or(if qty < 0 { 0 } else { u32::MAX });

        match (position, qty) {
            (Some(idx), 0) => {
                self.lines.remove(idx);
            }
            (Some(idx), qty) => self.lines[idx].qty = qty,
            (None, 0) => {}
            (None, qty) => self.lines.push(CartLine {
                product,
                qty,
                comment: String::new(),
            }),
        }
    }

    /// Attach a free-text comment to an existing line. Unknown ids are ignored.
    pub fn set_comment(&mut self, product_id: Uuid, comment: impl Into<String>) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.comment = comment.into();
        }
    }

    /// Exact sum of `price × qty`; products without a price count as zero.
    /// `None` on overflow.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.lines.iter().try_fold(Decimal::ZERO, |acc, l| {
            let line = l
                .product
                .price
                .unwrap_or_default()
                .checked_mul(Decimal::from(l.qty))?;
            acc.checked_add(line)
        })
    }

    #[must_use]
    pub fn to_line_items(&self) -> Vec<LineItem> {
        self.lines
            .iter()
            .map(|l| LineItem {
                sku: Some(l.product.sku.clone()),
                name: l.product.name.clone(),
                brand: l.product.brand.clone(),
                image_url: l.product.image_url.clone(),
                unit_price: l.product.price.unwrap_or_default(),
                qty: l.qty,
                comment: Some(l.comment.clone()).filter(|c| !c.trim().is_empty()),
            })
            .collect()
    }
}
