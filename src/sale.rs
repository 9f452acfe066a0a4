//! Sale rows and sale audits.
//!
//! A sale is written in the same transaction as the allocation that funds
//! it. After that, the only way to change or remove it is a sale audit:
//! a proposed diff that sits pending until a manager or admin resolves it.

use crate::error::StockError;
use crate::movement::Resolution;
use crate::types::{PaymentMethod, Qty, TimeStamp};
use crate::utils;
use chrono::Utc;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct Sale {
    #[n(0)]
    pub sale_id: String,
    #[n(1)]
    pub tenant_id: String,
    #[n(2)]
    pub product_id: String,
    #[n(3)]
    pub boxes_quantity: u64,
    #[n(4)]
    pub kg_quantity: Qty,
    #[n(5)]
    pub payment_method: PaymentMethod,
    #[n(6)]
    pub total_amount: Qty,
    #[n(7)]
    pub profit_per_box: Qty,
    #[n(8)]
    pub profit_per_kg: Qty,
    #[n(9)]
    pub performed_by: String,
    #[n(10)]
    pub created_at: TimeStamp<Utc>,
}

/// Requested changes to a completed sale. Only quantities and the payment
/// method are editable after the fact; payment status and client identity
/// are settled the moment the sale exists.
#[derive(Debug, Clone, Default)]
pub struct SaleChanges {
    pub boxes_quantity: Option<u64>,
    pub kg_quantity: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
}

/// The diff a sale audit proposes. Exactly one kind per audit record.
#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub enum SaleAuditKind {
    #[n(0)]
    QuantityChange {
        #[n(0)]
        old_boxes: u64,
        #[n(1)]
        old_kg: Qty,
        #[n(2)]
        new_boxes: u64,
        #[n(3)]
        new_kg: Qty,
    },
    #[n(1)]
    PaymentMethodChange {
        #[n(0)]
        old: PaymentMethod,
        #[n(1)]
        new: PaymentMethod,
    },
    /// Snapshot of the sale being voided, kept for display after the sale
    /// row is gone.
    #[n(2)]
    Deletion {
        #[n(0)]
        boxes: u64,
        #[n(1)]
        kg: Qty,
        #[n(2)]
        payment_method: PaymentMethod,
    },
}

impl SaleAuditKind {
    pub fn name(&self) -> &'static str {
        match self {
            SaleAuditKind::QuantityChange { .. } => "quantity_change",
            SaleAuditKind::PaymentMethodChange { .. } => "payment_method_change",
            SaleAuditKind::Deletion { .. } => "deletion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum ApprovalStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct SaleAudit {
    #[n(0)]
    pub audit_id: String,
    #[n(1)]
    pub tenant_id: String,
    /// Cleared when a deletion is approved; the audit itself persists as
    /// the record of the sale that was removed.
    #[n(2)]
    pub sale_id: Option<String>,
    #[n(3)]
    pub kind: SaleAuditKind,
    #[n(4)]
    pub reason: String,
    #[n(5)]
    pub performed_by: String,
    #[n(6)]
    pub approval_status: ApprovalStatus,
    #[n(7)]
    pub created_at: TimeStamp<Utc>,
    #[n(8)]
    pub resolution: Option<Resolution>,
}

impl SaleAudit {
    pub(crate) fn new(
        tenant_id: &str,
        sale_id: &str,
        kind: SaleAuditKind,
        reason: &str,
        performed_by: &str,
    ) -> Result<Self, StockError> {
        Ok(Self {
            audit_id: utils::audit_id()?,
            tenant_id: tenant_id.to_string(),
            sale_id: Some(sale_id.to_string()),
            kind,
            reason: reason.to_string(),
            performed_by: performed_by.to_string(),
            approval_status: ApprovalStatus::Pending,
            created_at: TimeStamp::new(),
            resolution: None,
        })
    }

    /// The approver recorded on resolution, if any.
    pub fn approved_by(&self) -> Option<&str> {
        match self.approval_status {
            ApprovalStatus::Approved => self.resolution.as_ref().map(|r| r.by.as_str()),
            _ => None,
        }
    }
}
