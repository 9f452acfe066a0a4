//! Movement records: the append-only inventory ledger.
//!
//! A movement is immutable once written, apart from its status and the
//! resolution stamped on it when it leaves `Pending`. Each kind carries
//! only the fields valid for it, so a damaged movement cannot exist
//! without its damage-report reference and an edit cannot exist without
//! its field diff.

use crate::error::StockError;
use crate::product::{Product, ProductField};
use crate::types::{Qty, TimeStamp};
use crate::utils;
use chrono::Utc;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub enum MovementKind {
    /// Stock written off against a damage report. Deltas are <= 0.
    #[n(0)]
    Damaged {
        #[n(0)]
        report_id: String,
        #[n(1)]
        box_change: i64,
        #[n(2)]
        kg_change: Qty,
    },
    /// Stock received against an addition record. Deltas are >= 0.
    #[n(1)]
    NewStock {
        #[n(0)]
        addition_id: String,
        #[n(1)]
        box_change: i64,
        #[n(2)]
        kg_change: Qty,
    },
    /// Signed adjustment against a correction record.
    #[n(2)]
    StockCorrection {
        #[n(0)]
        correction_id: String,
        #[n(1)]
        box_change: i64,
        #[n(2)]
        kg_change: Qty,
    },
    /// Intended change to a single non-quantity product field.
    #[n(3)]
    ProductEdit {
        #[n(0)]
        field: ProductField,
        #[n(1)]
        old_value: String,
        #[n(2)]
        new_value: String,
    },
    /// Intended removal of the product row. Keeps the name for display
    /// after the row is gone.
    #[n(4)]
    ProductDelete {
        #[n(0)]
        product_name: String,
    },
    /// Intended new product row, carried in full until approved.
    #[n(5)]
    ProductCreate {
        #[n(0)]
        product: Product,
    },
}

impl MovementKind {
    pub fn name(&self) -> &'static str {
        match self {
            MovementKind::Damaged { .. } => "damaged",
            MovementKind::NewStock { .. } => "new_stock",
            MovementKind::StockCorrection { .. } => "stock_correction",
            MovementKind::ProductEdit { .. } => "product_edit",
            MovementKind::ProductDelete { .. } => "product_delete",
            MovementKind::ProductCreate { .. } => "product_create",
        }
    }

    /// Box delta this movement applies to the projection once completed.
    /// Zero for the product-mutation kinds.
    pub fn box_delta(&self) -> i64 {
        match self {
            MovementKind::Damaged { box_change, .. }
            | MovementKind::NewStock { box_change, .. }
            | MovementKind::StockCorrection { box_change, .. } => *box_change,
            _ => 0,
        }
    }

    /// Kg delta this movement applies to the projection once completed.
    pub fn kg_delta(&self) -> Decimal {
        match self {
            MovementKind::Damaged { kg_change, .. }
            | MovementKind::NewStock { kg_change, .. }
            | MovementKind::StockCorrection { kg_change, .. } => kg_change.0,
            _ => Decimal::ZERO,
        }
    }

    /// Per-kind delta and reference rules, checked before anything is
    /// written to the ledger.
    pub fn validate(&self) -> Result<(), StockError> {
        match self {
            MovementKind::Damaged {
                report_id,
                box_change,
                kg_change,
            } => {
                require_reference("damaged", "damage report", report_id)?;
                if *box_change > 0 || kg_change.0 > Decimal::ZERO {
                    return Err(StockError::validation(
                        "damaged movements can only remove stock",
                    ));
                }
                require_nonzero_deltas("damaged", *box_change, kg_change.0)
            }
            MovementKind::NewStock {
                addition_id,
                box_change,
                kg_change,
            } => {
                require_reference("new_stock", "stock addition", addition_id)?;
                if *box_change < 0 || kg_change.0 < Decimal::ZERO {
                    return Err(StockError::validation(
                        "new_stock movements can only add stock",
                    ));
                }
                require_nonzero_deltas("new_stock", *box_change, kg_change.0)
            }
            MovementKind::StockCorrection {
                correction_id,
                box_change,
                kg_change,
            } => {
                require_reference("stock_correction", "correction record", correction_id)?;
                require_nonzero_deltas("stock_correction", *box_change, kg_change.0)
            }
            MovementKind::ProductEdit {
                old_value,
                new_value,
                ..
            } => {
                if old_value == new_value {
                    return Err(StockError::validation(
                        "product_edit must change the field's value",
                    ));
                }
                Ok(())
            }
            MovementKind::ProductDelete { .. } | MovementKind::ProductCreate { .. } => Ok(()),
        }
    }
}

fn require_reference(kind: &str, label: &str, reference: &str) -> Result<(), StockError> {
    if reference.trim().is_empty() {
        return Err(StockError::validation(format!(
            "{kind} movements require a {label} reference"
        )));
    }
    Ok(())
}

fn require_nonzero_deltas(kind: &str, box_change: i64, kg_change: Decimal) -> Result<(), StockError> {
    if box_change == 0 && kg_change.is_zero() {
        return Err(StockError::validation(format!(
            "{kind} movements must move at least some boxes or kg"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum MovementStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Completed,
    #[n(2)]
    Cancelled,
    #[n(3)]
    Rejected,
}

impl MovementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementStatus::Pending => "pending",
            MovementStatus::Completed => "completed",
            MovementStatus::Cancelled => "cancelled",
            MovementStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MovementStatus::Pending)
    }
}

/// Who resolved a pending record, when, and (for rejections) why.
#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct Resolution {
    #[n(0)]
    pub by: String,
    #[n(1)]
    pub reason: Option<String>,
    #[n(2)]
    pub at: TimeStamp<Utc>,
}

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct Movement {
    #[n(0)]
    pub movement_id: String,
    #[n(1)]
    pub tenant_id: String,
    #[n(2)]
    pub product_id: String,
    #[n(3)]
    pub kind: MovementKind,
    #[n(4)]
    pub status: MovementStatus,
    #[n(5)]
    pub performed_by: String,
    #[n(6)]
    pub created_at: TimeStamp<Utc>,
    #[n(7)]
    pub resolution: Option<Resolution>,
}

impl Movement {
    /// A freshly minted movement always starts `Pending` and unresolved.
    pub fn new(
        tenant_id: &str,
        product_id: &str,
        kind: MovementKind,
        performed_by: &str,
    ) -> Result<Self, StockError> {
        Ok(Self {
            movement_id: utils::movement_id()?,
            tenant_id: tenant_id.to_string(),
            product_id: product_id.to_string(),
            kind,
            status: MovementStatus::Pending,
            performed_by: performed_by.to_string(),
            created_at: TimeStamp::new(),
            resolution: None,
        })
    }
}
