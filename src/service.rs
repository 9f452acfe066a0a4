//! Service layer API for stock accounting and approval workflow operations.
//!
//! Every operation takes the authenticated [`Actor`] explicitly and runs
//! its writes inside a sled transaction, so a projection update and the
//! ledger entry that justifies it commit together or not at all. Status
//! transitions re-read the record inside the transaction and abort unless
//! it is still pending; the loser of a concurrent approval race gets
//! [`StockError::AlreadyResolved`], never a silent double-application.

use crate::allocation;
use crate::error::StockError;
use crate::movement::{Movement, MovementKind, MovementStatus, Resolution};
use crate::product::Product;
use crate::sale::{ApprovalStatus, Sale, SaleAudit, SaleAuditKind, SaleChanges};
use crate::store::{self, LedgerStore};
use crate::types::{Actor, PaymentMethod, Qty, TimeStamp};
use crate::utils;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, abort};
use std::sync::Arc;

pub struct StockService {
    store: LedgerStore,
}

impl StockService {
    pub fn open(db: Arc<sled::Db>) -> Result<Self, StockError> {
        Ok(Self {
            store: LedgerStore::open(db)?,
        })
    }

    // SALES

    /// Allocate and record a sale. Applied immediately: the stock debit
    /// and the sale row commit in one transaction. Retroactive changes to
    /// the sale go through the audit workflow instead.
    pub fn create_sale(
        &self,
        actor: &Actor,
        product_id: &str,
        requested_kg: Decimal,
        requested_boxes: u64,
        payment_method: PaymentMethod,
    ) -> Result<Sale, StockError> {
        let sale_id = utils::sale_id()?;
        let created_at = TimeStamp::new();

        let result = (&self.store.products, &self.store.sales).transaction(
            |(products, sales)| -> ConflictableTransactionResult<(Sale, Vec<String>), StockError> {
                let Some(raw) = products.get(product_id.as_bytes())? else {
                    return abort(StockError::not_found("product", product_id));
                };
                let mut product: Product = decode_tx(&raw)?;
                if product.tenant_id != actor.tenant_id {
                    return abort(StockError::not_found("product", product_id));
                }

                let alloc = match allocation::allocate(&product, requested_kg, requested_boxes) {
                    Ok(alloc) => alloc,
                    Err(err) => return abort(err),
                };
                product.quantity_box = alloc.boxes_after;
                product.quantity_kg = Qty(alloc.kg_after);

                let sale = Sale {
                    sale_id: sale_id.clone(),
                    tenant_id: actor.tenant_id.clone(),
                    product_id: product.product_id.clone(),
                    boxes_quantity: requested_boxes,
                    kg_quantity: Qty(requested_kg),
                    payment_method,
                    total_amount: Qty(alloc.total_amount),
                    profit_per_box: Qty(product.price_per_box.0 - product.cost_per_box.0),
                    profit_per_kg: Qty(product.price_per_kg.0 - product.cost_per_kg.0),
                    performed_by: actor.actor_id.clone(),
                    created_at: created_at.clone(),
                };

                products.insert(product.product_id.as_bytes(), encode_tx(&product)?)?;
                sales.insert(sale.sale_id.as_bytes(), encode_tx(&sale)?)?;
                Ok((sale, alloc.steps))
            },
        );
        let (sale, steps) = store::run(result)?;

        tracing::info!(
            sale_id = %sale.sale_id,
            product_id,
            total_amount = %sale.total_amount,
            "sale allocated"
        );
        for step in &steps {
            tracing::debug!(sale_id = %sale.sale_id, "{step}");
        }
        Ok(sale)
    }

    // MOVEMENTS

    /// Record a pending movement. Nothing touches the projection until a
    /// manager or admin approves it.
    pub fn submit_movement(
        &self,
        actor: &Actor,
        product_id: &str,
        kind: MovementKind,
    ) -> Result<Movement, StockError> {
        kind.validate()?;

        match &kind {
            MovementKind::ProductCreate { product } => {
                if product.product_id != product_id {
                    return Err(StockError::validation(
                        "product_create movement id must match the drafted product",
                    ));
                }
                if product.tenant_id != actor.tenant_id {
                    return Err(StockError::validation(
                        "drafted product belongs to a different tenant",
                    ));
                }
                if self.store.product(product_id)?.is_some() {
                    return Err(StockError::validation(format!(
                        "product {product_id} already exists"
                    )));
                }
            }
            MovementKind::ProductEdit {
                field,
                old_value,
                new_value,
            } => {
                let product = self.tenant_product(actor, product_id)?.ok_or_else(|| {
                    StockError::InvalidMovementReference {
                        product_id: product_id.to_string(),
                    }
                })?;
                if product.field_value(*field) != *old_value {
                    return Err(StockError::validation(format!(
                        "recorded old value for {field} is stale; re-read the product and resubmit"
                    )));
                }
                // surface a malformed new value at submission, not approval
                product.clone().apply_edit(*field, new_value)?;
            }
            _ => {
                if self.tenant_product(actor, product_id)?.is_none() {
                    return Err(StockError::InvalidMovementReference {
                        product_id: product_id.to_string(),
                    });
                }
            }
        }

        let movement = Movement::new(&actor.tenant_id, product_id, kind, &actor.actor_id)?;
        self.store.insert_movement(&movement)?;

        tracing::info!(
            movement_id = %movement.movement_id,
            kind = movement.kind.name(),
            product_id,
            "movement submitted for approval"
        );
        Ok(movement)
    }

    /// Approve a pending movement: flip it to completed and apply its
    /// effect to the projection, atomically. A second approval of the
    /// same movement fails with `AlreadyResolved` and applies nothing.
    pub fn approve_movement(
        &self,
        movement_id: &str,
        actor: &Actor,
    ) -> Result<Movement, StockError> {
        self.ensure_approver(actor, "approve movements")?;
        let resolved_at = TimeStamp::new();

        let result = (&self.store.movements, &self.store.products).transaction(
            |(movements, products)| -> ConflictableTransactionResult<Movement, StockError> {
                let Some(raw) = movements.get(movement_id.as_bytes())? else {
                    return abort(StockError::not_found("movement", movement_id));
                };
                let mut movement: Movement = decode_tx(&raw)?;
                if movement.tenant_id != actor.tenant_id {
                    return abort(StockError::not_found("movement", movement_id));
                }
                if movement.status != MovementStatus::Pending {
                    return abort(StockError::already_resolved("movement", movement_id));
                }

                match &movement.kind {
                    MovementKind::ProductCreate { product } => {
                        if products.get(product.product_id.as_bytes())?.is_some() {
                            return abort(StockError::validation(format!(
                                "product {} already exists",
                                product.product_id
                            )));
                        }
                        products.insert(product.product_id.as_bytes(), encode_tx(product)?)?;
                    }
                    MovementKind::ProductDelete { .. } => {
                        if products.remove(movement.product_id.as_bytes())?.is_none() {
                            return abort(StockError::InvalidMovementReference {
                                product_id: movement.product_id.clone(),
                            });
                        }
                    }
                    MovementKind::ProductEdit {
                        field, new_value, ..
                    } => {
                        let Some(raw) = products.get(movement.product_id.as_bytes())? else {
                            return abort(StockError::InvalidMovementReference {
                                product_id: movement.product_id.clone(),
                            });
                        };
                        let mut product: Product = decode_tx(&raw)?;
                        if let Err(err) = product.apply_edit(*field, new_value) {
                            return abort(err);
                        }
                        products.insert(product.product_id.as_bytes(), encode_tx(&product)?)?;
                    }
                    MovementKind::Damaged { .. }
                    | MovementKind::NewStock { .. }
                    | MovementKind::StockCorrection { .. } => {
                        let Some(raw) = products.get(movement.product_id.as_bytes())? else {
                            return abort(StockError::InvalidMovementReference {
                                product_id: movement.product_id.clone(),
                            });
                        };
                        let mut product: Product = decode_tx(&raw)?;
                        let boxes_after = product.quantity_box as i64 + movement.kind.box_delta();
                        let kg_after = product.quantity_kg.0 + movement.kind.kg_delta();
                        if boxes_after < 0 || kg_after < Decimal::ZERO {
                            return abort(StockError::validation(format!(
                                "movement {movement_id} would drive stock below zero"
                            )));
                        }
                        product.quantity_box = boxes_after as u64;
                        product.quantity_kg = Qty(kg_after);
                        products.insert(product.product_id.as_bytes(), encode_tx(&product)?)?;
                    }
                }

                movement.status = MovementStatus::Completed;
                movement.resolution = Some(Resolution {
                    by: actor.actor_id.clone(),
                    reason: None,
                    at: resolved_at.clone(),
                });
                movements.insert(movement_id.as_bytes(), encode_tx(&movement)?)?;
                Ok(movement)
            },
        );
        let movement = store::run(result)?;

        tracing::info!(
            movement_id,
            kind = movement.kind.name(),
            approver = %actor.actor_id,
            "movement approved and applied"
        );
        Ok(movement)
    }

    /// Reject a pending movement. The projection is untouched; the reason
    /// is persisted with the record.
    pub fn reject_movement(
        &self,
        movement_id: &str,
        actor: &Actor,
        reason: &str,
    ) -> Result<Movement, StockError> {
        self.ensure_approver(actor, "reject movements")?;
        if reason.trim().is_empty() {
            return Err(StockError::validation("a rejection requires a reason"));
        }

        let movement = self.resolve_movement(
            movement_id,
            actor,
            MovementStatus::Rejected,
            Some(reason.to_string()),
            None,
        )?;
        tracing::warn!(movement_id, approver = %actor.actor_id, reason, "movement rejected");
        Ok(movement)
    }

    /// Withdraw a pending movement. Only the original requester may do
    /// this; approvers use reject instead.
    pub fn cancel_movement(
        &self,
        movement_id: &str,
        actor: &Actor,
    ) -> Result<Movement, StockError> {
        let movement = self.resolve_movement(
            movement_id,
            actor,
            MovementStatus::Cancelled,
            None,
            Some(&actor.actor_id),
        )?;
        tracing::info!(movement_id, "movement cancelled by requester");
        Ok(movement)
    }

    /// Shared pending -> terminal transition for the paths that do not
    /// touch the projection.
    fn resolve_movement(
        &self,
        movement_id: &str,
        actor: &Actor,
        status: MovementStatus,
        reason: Option<String>,
        required_requester: Option<&str>,
    ) -> Result<Movement, StockError> {
        let resolved_at = TimeStamp::new();

        let result = self.store.movements.transaction(
            |movements| -> ConflictableTransactionResult<Movement, StockError> {
                let Some(raw) = movements.get(movement_id.as_bytes())? else {
                    return abort(StockError::not_found("movement", movement_id));
                };
                let mut movement: Movement = decode_tx(&raw)?;
                if movement.tenant_id != actor.tenant_id {
                    return abort(StockError::not_found("movement", movement_id));
                }
                if let Some(requester) = required_requester {
                    if movement.performed_by != requester {
                        return abort(StockError::Unauthorized {
                            actor_id: actor.actor_id.clone(),
                            action: "cancel another requester's movement",
                        });
                    }
                }
                if movement.status != MovementStatus::Pending {
                    return abort(StockError::already_resolved("movement", movement_id));
                }

                movement.status = status;
                movement.resolution = Some(Resolution {
                    by: actor.actor_id.clone(),
                    reason: reason.clone(),
                    at: resolved_at.clone(),
                });
                movements.insert(movement_id.as_bytes(), encode_tx(&movement)?)?;
                Ok(movement)
            },
        );
        store::run(result)
    }

    // SALE AUDITS

    /// Propose a retroactive edit to a completed sale. The diff is
    /// restricted to quantities or the payment method, one per proposal,
    /// and a sale can only carry one pending audit at a time.
    pub fn propose_sale_edit(
        &self,
        sale_id: &str,
        actor: &Actor,
        changes: SaleChanges,
        reason: &str,
    ) -> Result<SaleAudit, StockError> {
        let sale = self.require_sale(actor, sale_id)?;

        let quantity_changed = changes
            .boxes_quantity
            .is_some_and(|boxes| boxes != sale.boxes_quantity)
            || changes.kg_quantity.is_some_and(|kg| kg != sale.kg_quantity.0);
        let payment_changed = changes
            .payment_method
            .is_some_and(|method| method != sale.payment_method);

        if quantity_changed && payment_changed {
            return Err(StockError::validation(
                "quantities and payment method cannot change in one proposal",
            ));
        }

        let kind = if quantity_changed {
            let new_boxes = changes.boxes_quantity.unwrap_or(sale.boxes_quantity);
            let new_kg = changes.kg_quantity.unwrap_or(sale.kg_quantity.0);
            if new_kg < Decimal::ZERO {
                return Err(StockError::validation("kg_quantity must not be negative"));
            }
            if new_boxes == 0 && new_kg.is_zero() {
                return Err(StockError::validation(
                    "a sale cannot be edited down to nothing; propose a deletion instead",
                ));
            }
            SaleAuditKind::QuantityChange {
                old_boxes: sale.boxes_quantity,
                old_kg: sale.kg_quantity,
                new_boxes,
                new_kg: Qty(new_kg),
            }
        } else if let Some(new) = changes.payment_method {
            if !payment_changed {
                return Err(StockError::validation(
                    "proposed changes match the sale as recorded",
                ));
            }
            SaleAuditKind::PaymentMethodChange {
                old: sale.payment_method,
                new,
            }
        } else {
            return Err(StockError::validation(
                "proposed changes match the sale as recorded",
            ));
        };

        self.insert_audit(actor, &sale, kind, reason)
    }

    /// Propose voiding a completed sale, restoring its quantities on
    /// approval.
    pub fn propose_sale_deletion(
        &self,
        sale_id: &str,
        actor: &Actor,
        reason: &str,
    ) -> Result<SaleAudit, StockError> {
        let sale = self.require_sale(actor, sale_id)?;

        let kind = SaleAuditKind::Deletion {
            boxes: sale.boxes_quantity,
            kg: sale.kg_quantity,
            payment_method: sale.payment_method,
        };
        self.insert_audit(actor, &sale, kind, reason)
    }

    fn insert_audit(
        &self,
        actor: &Actor,
        sale: &Sale,
        kind: SaleAuditKind,
        reason: &str,
    ) -> Result<SaleAudit, StockError> {
        if reason.trim().is_empty() {
            return Err(StockError::validation(
                "a sale audit proposal requires a reason",
            ));
        }

        let audit = SaleAudit::new(
            &actor.tenant_id,
            &sale.sale_id,
            kind,
            reason,
            &actor.actor_id,
        )?;

        let result = (&self.store.sale_audits, &self.store.pending_audits).transaction(
            |(audits, pending)| -> ConflictableTransactionResult<(), StockError> {
                if pending.get(sale.sale_id.as_bytes())?.is_some() {
                    return abort(StockError::ConflictingPendingAudit {
                        sale_id: sale.sale_id.clone(),
                    });
                }
                audits.insert(audit.audit_id.as_bytes(), encode_tx(&audit)?)?;
                pending.insert(sale.sale_id.as_bytes(), audit.audit_id.as_bytes())?;
                Ok(())
            },
        );
        store::run(result)?;

        tracing::info!(
            audit_id = %audit.audit_id,
            sale_id = %sale.sale_id,
            kind = audit.kind.name(),
            "sale audit proposed"
        );
        Ok(audit)
    }

    /// Approve a pending sale audit and apply its diff to the sale and
    /// the projection in one transaction.
    ///
    /// A quantity change is applied as reverse-then-reallocate: the old
    /// quantities are returned to stock and the new quantities are
    /// allocated fresh, so the projection ends up exactly where a sale of
    /// the new quantities would have left it. An increase that no longer
    /// fits fails the approval; nothing is clamped.
    pub fn approve_sale_audit(
        &self,
        audit_id: &str,
        actor: &Actor,
    ) -> Result<SaleAudit, StockError> {
        self.ensure_approver(actor, "approve sale audits")?;
        let resolved_at = TimeStamp::new();

        let trees = (
            &self.store.sale_audits,
            &self.store.sales,
            &self.store.products,
            &self.store.pending_audits,
        );
        let result = trees.transaction(
            |(audits, sales, products, pending)| -> ConflictableTransactionResult<SaleAudit, StockError> {
                let Some(raw) = audits.get(audit_id.as_bytes())? else {
                    return abort(StockError::not_found("sale audit", audit_id));
                };
                let mut audit: SaleAudit = decode_tx(&raw)?;
                if audit.tenant_id != actor.tenant_id {
                    return abort(StockError::not_found("sale audit", audit_id));
                }
                if audit.approval_status != ApprovalStatus::Pending {
                    return abort(StockError::already_resolved("sale audit", audit_id));
                }
                let Some(sale_id) = audit.sale_id.clone() else {
                    return abort(StockError::validation(
                        "pending audit is missing its sale reference",
                    ));
                };
                let Some(raw) = sales.get(sale_id.as_bytes())? else {
                    return abort(StockError::not_found("sale", &sale_id));
                };
                let mut sale: Sale = decode_tx(&raw)?;

                match &audit.kind {
                    SaleAuditKind::QuantityChange {
                        old_boxes,
                        old_kg,
                        new_boxes,
                        new_kg,
                    } => {
                        let Some(raw) = products.get(sale.product_id.as_bytes())? else {
                            return abort(StockError::not_found("product", &sale.product_id));
                        };
                        let mut product: Product = decode_tx(&raw)?;

                        // return the old quantities, then allocate the new
                        // ones against that baseline
                        product.quantity_box += old_boxes;
                        product.quantity_kg = Qty(product.quantity_kg.0 + old_kg.0);
                        let alloc =
                            match allocation::allocate(&product, new_kg.0, *new_boxes) {
                                Ok(alloc) => alloc,
                                Err(err) => return abort(err),
                            };
                        product.quantity_box = alloc.boxes_after;
                        product.quantity_kg = Qty(alloc.kg_after);

                        sale.boxes_quantity = *new_boxes;
                        sale.kg_quantity = *new_kg;
                        sale.total_amount = Qty(alloc.total_amount);

                        products.insert(product.product_id.as_bytes(), encode_tx(&product)?)?;
                        sales.insert(sale.sale_id.as_bytes(), encode_tx(&sale)?)?;
                    }
                    SaleAuditKind::PaymentMethodChange { new, .. } => {
                        sale.payment_method = *new;
                        sales.insert(sale.sale_id.as_bytes(), encode_tx(&sale)?)?;
                    }
                    SaleAuditKind::Deletion { boxes, kg, .. } => {
                        let Some(raw) = products.get(sale.product_id.as_bytes())? else {
                            return abort(StockError::not_found("product", &sale.product_id));
                        };
                        let mut product: Product = decode_tx(&raw)?;
                        product.quantity_box += boxes;
                        product.quantity_kg = Qty(product.quantity_kg.0 + kg.0);

                        products.insert(product.product_id.as_bytes(), encode_tx(&product)?)?;
                        sales.remove(sale.sale_id.as_bytes())?;
                        audit.sale_id = None;
                    }
                }

                audit.approval_status = ApprovalStatus::Approved;
                audit.resolution = Some(Resolution {
                    by: actor.actor_id.clone(),
                    reason: None,
                    at: resolved_at.clone(),
                });
                audits.insert(audit.audit_id.as_bytes(), encode_tx(&audit)?)?;
                pending.remove(sale_id.as_bytes())?;
                Ok(audit)
            },
        );
        let audit = store::run(result)?;

        tracing::info!(
            audit_id,
            kind = audit.kind.name(),
            approver = %actor.actor_id,
            "sale audit approved and applied"
        );
        Ok(audit)
    }

    /// Reject a pending sale audit. Sale and projection are untouched.
    pub fn reject_sale_audit(
        &self,
        audit_id: &str,
        actor: &Actor,
        reason: &str,
    ) -> Result<SaleAudit, StockError> {
        self.ensure_approver(actor, "reject sale audits")?;
        if reason.trim().is_empty() {
            return Err(StockError::validation("a rejection requires a reason"));
        }
        let resolved_at = TimeStamp::new();

        let result = (&self.store.sale_audits, &self.store.pending_audits).transaction(
            |(audits, pending)| -> ConflictableTransactionResult<SaleAudit, StockError> {
                let Some(raw) = audits.get(audit_id.as_bytes())? else {
                    return abort(StockError::not_found("sale audit", audit_id));
                };
                let mut audit: SaleAudit = decode_tx(&raw)?;
                if audit.tenant_id != actor.tenant_id {
                    return abort(StockError::not_found("sale audit", audit_id));
                }
                if audit.approval_status != ApprovalStatus::Pending {
                    return abort(StockError::already_resolved("sale audit", audit_id));
                }

                audit.approval_status = ApprovalStatus::Rejected;
                audit.resolution = Some(Resolution {
                    by: actor.actor_id.clone(),
                    reason: Some(reason.to_string()),
                    at: resolved_at.clone(),
                });
                audits.insert(audit.audit_id.as_bytes(), encode_tx(&audit)?)?;
                if let Some(sale_id) = &audit.sale_id {
                    pending.remove(sale_id.as_bytes())?;
                }
                Ok(audit)
            },
        );
        let audit = store::run(result)?;

        tracing::warn!(audit_id, approver = %actor.actor_id, reason, "sale audit rejected");
        Ok(audit)
    }

    // READS

    pub fn product(&self, actor: &Actor, product_id: &str) -> Result<Option<Product>, StockError> {
        self.tenant_product(actor, product_id)
    }

    pub fn sale(&self, actor: &Actor, sale_id: &str) -> Result<Option<Sale>, StockError> {
        Ok(self
            .store
            .sale(sale_id)?
            .filter(|sale| sale.tenant_id == actor.tenant_id))
    }

    pub fn movement(
        &self,
        actor: &Actor,
        movement_id: &str,
    ) -> Result<Option<Movement>, StockError> {
        Ok(self
            .store
            .movement(movement_id)?
            .filter(|movement| movement.tenant_id == actor.tenant_id))
    }

    pub fn sale_audit(
        &self,
        actor: &Actor,
        audit_id: &str,
    ) -> Result<Option<SaleAudit>, StockError> {
        Ok(self
            .store
            .sale_audit(audit_id)?
            .filter(|audit| audit.tenant_id == actor.tenant_id))
    }

    /// Current projection across the tenant's products.
    pub fn stock_snapshot(&self, actor: &Actor) -> Result<Vec<Product>, StockError> {
        let mut products: Vec<Product> = self
            .store
            .all_products()?
            .into_iter()
            .filter(|product| product.tenant_id == actor.tenant_id)
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    pub fn movements_for_product(
        &self,
        actor: &Actor,
        product_id: &str,
    ) -> Result<Vec<Movement>, StockError> {
        self.ledger_query(actor, |movement| movement.product_id == product_id)
    }

    pub fn movements_by_status(
        &self,
        actor: &Actor,
        status: MovementStatus,
    ) -> Result<Vec<Movement>, StockError> {
        self.ledger_query(actor, |movement| movement.status == status)
    }

    pub fn movements_in_range(
        &self,
        actor: &Actor,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Movement>, StockError> {
        self.ledger_query(actor, |movement| {
            let at = movement.created_at.to_datetime_utc();
            from <= at && at <= to
        })
    }

    pub fn audits_for_sale(
        &self,
        actor: &Actor,
        sale_id: &str,
    ) -> Result<Vec<SaleAudit>, StockError> {
        let mut audits: Vec<SaleAudit> = self
            .store
            .all_sale_audits()?
            .into_iter()
            .filter(|audit| {
                audit.tenant_id == actor.tenant_id && audit.sale_id.as_deref() == Some(sale_id)
            })
            .collect();
        audits.sort_by_key(|audit| audit.created_at.to_datetime_utc());
        Ok(audits)
    }

    fn ledger_query(
        &self,
        actor: &Actor,
        keep: impl Fn(&Movement) -> bool,
    ) -> Result<Vec<Movement>, StockError> {
        let mut movements: Vec<Movement> = self
            .store
            .all_movements()?
            .into_iter()
            .filter(|movement| movement.tenant_id == actor.tenant_id && keep(movement))
            .collect();
        movements.sort_by_key(|movement| movement.created_at.to_datetime_utc());
        Ok(movements)
    }

    fn tenant_product(
        &self,
        actor: &Actor,
        product_id: &str,
    ) -> Result<Option<Product>, StockError> {
        Ok(self
            .store
            .product(product_id)?
            .filter(|product| product.tenant_id == actor.tenant_id))
    }

    fn require_sale(&self, actor: &Actor, sale_id: &str) -> Result<Sale, StockError> {
        self.sale(actor, sale_id)?
            .ok_or_else(|| StockError::not_found("sale", sale_id))
    }

    fn ensure_approver(&self, actor: &Actor, action: &'static str) -> Result<(), StockError> {
        if actor.role.can_approve() {
            Ok(())
        } else {
            Err(StockError::Unauthorized {
                actor_id: actor.actor_id.clone(),
                action,
            })
        }
    }
}

fn encode_tx<T: minicbor::Encode<()>>(
    value: &T,
) -> Result<Vec<u8>, ConflictableTransactionError<StockError>> {
    store::encode(value).map_err(ConflictableTransactionError::Abort)
}

fn decode_tx<T>(raw: &[u8]) -> Result<T, ConflictableTransactionError<StockError>>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    store::decode(raw).map_err(ConflictableTransactionError::Abort)
}
