//! Product rows: one row per perishable product, carrying the current
//! box/kg balance (the inventory projection) plus pricing.
//!
//! Balances on a row are only ever changed by an applied sale allocation
//! or an approved movement; nothing edits a quantity field directly.

use crate::error::StockError;
use crate::types::{Qty, TimeStamp};
use crate::utils;
use chrono::Utc;
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct Product {
    #[n(0)]
    pub product_id: String,
    #[n(1)]
    pub tenant_id: String,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub quantity_box: u64,
    #[n(4)]
    pub quantity_kg: Qty,
    #[n(5)]
    pub box_to_kg_ratio: Qty, // kg yielded by converting one box
    #[n(6)]
    pub price_per_box: Qty,
    #[n(7)]
    pub price_per_kg: Qty,
    #[n(8)]
    pub cost_per_box: Qty,
    #[n(9)]
    pub cost_per_kg: Qty,
    #[n(10)]
    pub created_at: TimeStamp<Utc>,
}

/// The closed set of product fields an edit movement may change.
/// Quantities are deliberately absent: stock only moves through the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum ProductField {
    #[n(0)]
    Name,
    #[n(1)]
    PricePerBox,
    #[n(2)]
    PricePerKg,
    #[n(3)]
    CostPerBox,
    #[n(4)]
    CostPerKg,
    #[n(5)]
    BoxToKgRatio,
}

impl ProductField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::PricePerBox => "price_per_box",
            ProductField::PricePerKg => "price_per_kg",
            ProductField::CostPerBox => "cost_per_box",
            ProductField::CostPerKg => "cost_per_kg",
            ProductField::BoxToKgRatio => "box_to_kg_ratio",
        }
    }
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Draft for constructing a product row. Nothing is persisted until the
// draft passes build() and the create movement is approved.
#[derive(Debug, Default)]
pub struct ProductDraft {
    tenant_id: String,
    name: String,
    quantity_box: u64,
    quantity_kg: Decimal,
    box_to_kg_ratio: Decimal,
    price_per_box: Decimal,
    price_per_kg: Decimal,
    cost_per_box: Decimal,
    cost_per_kg: Decimal,
}

impl ProductDraft {
    pub fn new(tenant_id: &str, name: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }
    pub fn quantity_box(mut self, boxes: u64) -> Self {
        self.quantity_box = boxes;
        self
    }
    pub fn quantity_kg(mut self, kg: Decimal) -> Self {
        self.quantity_kg = kg;
        self
    }
    pub fn box_to_kg_ratio(mut self, ratio: Decimal) -> Self {
        self.box_to_kg_ratio = ratio;
        self
    }
    pub fn price_per_box(mut self, price: Decimal) -> Self {
        self.price_per_box = price;
        self
    }
    pub fn price_per_kg(mut self, price: Decimal) -> Self {
        self.price_per_kg = price;
        self
    }
    pub fn cost_per_box(mut self, cost: Decimal) -> Self {
        self.cost_per_box = cost;
        self
    }
    pub fn cost_per_kg(mut self, cost: Decimal) -> Self {
        self.cost_per_kg = cost;
        self
    }

    /// Validate the draft and mint the product row.
    pub fn build(self) -> Result<Product, StockError> {
        if self.name.trim().is_empty() {
            return Err(StockError::validation("product name must not be empty"));
        }
        if self.box_to_kg_ratio <= Decimal::ZERO {
            return Err(StockError::validation(
                "box_to_kg_ratio must be a positive number of kg per box",
            ));
        }
        if self.quantity_kg < Decimal::ZERO {
            return Err(StockError::validation("quantity_kg must not be negative"));
        }
        for (label, value) in [
            ("price_per_box", self.price_per_box),
            ("price_per_kg", self.price_per_kg),
            ("cost_per_box", self.cost_per_box),
            ("cost_per_kg", self.cost_per_kg),
        ] {
            if value < Decimal::ZERO {
                return Err(StockError::validation(format!(
                    "{label} must not be negative"
                )));
            }
        }

        Ok(Product {
            product_id: utils::product_id()?,
            tenant_id: self.tenant_id,
            name: self.name,
            quantity_box: self.quantity_box,
            quantity_kg: Qty(self.quantity_kg),
            box_to_kg_ratio: Qty(self.box_to_kg_ratio),
            price_per_box: Qty(self.price_per_box),
            price_per_kg: Qty(self.price_per_kg),
            cost_per_box: Qty(self.cost_per_box),
            cost_per_kg: Qty(self.cost_per_kg),
            created_at: TimeStamp::new(),
        })
    }
}

impl Product {
    /// Total sellable quantity expressed in kg: loose kg plus the kg
    /// equivalent of every unopened box.
    pub fn total_available_kg(&self) -> Decimal {
        self.quantity_kg.0 + Decimal::from(self.quantity_box) * self.box_to_kg_ratio.0
    }

    /// Current value of an editable field, text-encoded the way edit
    /// movements record old/new values.
    pub fn field_value(&self, field: ProductField) -> String {
        match field {
            ProductField::Name => self.name.clone(),
            ProductField::PricePerBox => self.price_per_box.to_string(),
            ProductField::PricePerKg => self.price_per_kg.to_string(),
            ProductField::CostPerBox => self.cost_per_box.to_string(),
            ProductField::CostPerKg => self.cost_per_kg.to_string(),
            ProductField::BoxToKgRatio => self.box_to_kg_ratio.to_string(),
        }
    }

    /// Apply an approved field edit. The new value is parsed according to
    /// the field it targets; a value that fails to parse or violates the
    /// field's own constraint fails the edit.
    pub fn apply_edit(&mut self, field: ProductField, new_value: &str) -> Result<(), StockError> {
        match field {
            ProductField::Name => {
                if new_value.trim().is_empty() {
                    return Err(StockError::validation("product name must not be empty"));
                }
                self.name = new_value.to_string();
            }
            ProductField::BoxToKgRatio => {
                let ratio = parse_decimal(field, new_value)?;
                if ratio <= Decimal::ZERO {
                    return Err(StockError::validation(
                        "box_to_kg_ratio must be a positive number of kg per box",
                    ));
                }
                self.box_to_kg_ratio = Qty(ratio);
            }
            ProductField::PricePerBox => self.price_per_box = parse_money(field, new_value)?,
            ProductField::PricePerKg => self.price_per_kg = parse_money(field, new_value)?,
            ProductField::CostPerBox => self.cost_per_box = parse_money(field, new_value)?,
            ProductField::CostPerKg => self.cost_per_kg = parse_money(field, new_value)?,
        }
        Ok(())
    }
}

fn parse_decimal(field: ProductField, value: &str) -> Result<Decimal, StockError> {
    Decimal::from_str_exact(value.trim())
        .map_err(|_| StockError::validation(format!("{field} expects a decimal, got {value:?}")))
}

fn parse_money(field: ProductField, value: &str) -> Result<Qty, StockError> {
    let amount = parse_decimal(field, value)?;
    if amount < Decimal::ZERO {
        return Err(StockError::validation(format!(
            "{field} must not be negative"
        )));
    }
    Ok(Qty(amount))
}
