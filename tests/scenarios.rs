//! End-to-end workflow scenarios against a real (temporary) sled store.

use anyhow::Context;
use rust_decimal::Decimal;
use std::sync::Arc;
use stock_approval::{
    StockError, StockService,
    movement::{MovementKind, MovementStatus},
    product::{Product, ProductDraft, ProductField},
    sale::{ApprovalStatus, SaleChanges},
    types::{Actor, PaymentMethod, Qty, Role},
};
use tempfile::{TempDir, tempdir};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn staff() -> Actor {
    Actor::new("tenant_fishmart", "user_staff", Role::Staff)
}

fn manager() -> Actor {
    Actor::new("tenant_fishmart", "user_manager", Role::Manager)
}

// Sled uses file-based locking to prevent concurrent access, so each test
// opens its own database under a temp dir for simplified cleanup.
fn open_service(name: &str) -> anyhow::Result<(TempDir, StockService)> {
    let temp_dir = tempdir()?;
    let db = sled::open(temp_dir.path().join(name))?;
    let service = StockService::open(Arc::new(db))?;
    Ok((temp_dir, service))
}

/// 10 boxes / 15.5 kg loose, 10 kg per box, 2.60/kg, 24.00/box. Created
/// through the workflow like any other product: drafted, submitted as a
/// product_create movement, approved by a manager.
fn seed_salmon(service: &StockService) -> anyhow::Result<Product> {
    let draft = ProductDraft::new(&staff().tenant_id, "atlantic salmon")
        .quantity_box(10)
        .quantity_kg(d("15.5"))
        .box_to_kg_ratio(d("10"))
        .price_per_box(d("24.00"))
        .price_per_kg(d("2.60"))
        .cost_per_box(d("18.00"))
        .cost_per_kg(d("1.90"))
        .build()?;
    let product_id = draft.product_id.clone();

    let movement = service.submit_movement(
        &staff(),
        &product_id,
        MovementKind::ProductCreate { product: draft },
    )?;
    service.approve_movement(&movement.movement_id, &manager())?;

    service
        .product(&staff(), &product_id)?
        .context("product missing after approved create")
}

fn stock_of(service: &StockService, product_id: &str) -> anyhow::Result<(u64, Decimal)> {
    let product = service
        .product(&staff(), product_id)?
        .context("product not found")?;
    Ok((product.quantity_box, product.quantity_kg.0))
}

#[test]
fn sale_covered_by_loose_kg() -> anyhow::Result<()> {
    let (_dir, service) = open_service("sale_loose_kg.db")?;
    let product = seed_salmon(&service)?;

    let sale = service
        .create_sale(
            &staff(),
            &product.product_id,
            d("10"),
            0,
            PaymentMethod::Cash,
        )
        .context("sale failed")?;

    assert_eq!(sale.total_amount, Qty(d("26.00")));
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("5.5")));
    Ok(())
}

#[test]
fn sale_converts_a_box_and_returns_excess() -> anyhow::Result<()> {
    let (_dir, service) = open_service("sale_one_box.db")?;
    let product = seed_salmon(&service)?;

    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("20"),
        0,
        PaymentMethod::Card,
    )?;

    assert_eq!(sale.total_amount, Qty(d("52.00")));
    assert_eq!(stock_of(&service, &product.product_id)?, (9, d("5.5")));
    Ok(())
}

#[test]
fn sale_consuming_stock_exactly() -> anyhow::Result<()> {
    let (_dir, service) = open_service("sale_exact.db")?;
    let product = seed_salmon(&service)?;

    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("25.5"),
        0,
        PaymentMethod::Cash,
    )?;

    assert_eq!(sale.total_amount, Qty(d("66.30")));
    assert_eq!(stock_of(&service, &product.product_id)?, (9, d("0")));
    Ok(())
}

#[test]
fn sale_converting_several_boxes() -> anyhow::Result<()> {
    let (_dir, service) = open_service("sale_four_boxes.db")?;
    let product = seed_salmon(&service)?;

    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("50"),
        0,
        PaymentMethod::Transfer,
    )?;

    assert_eq!(sale.total_amount, Qty(d("130.00")));
    assert_eq!(stock_of(&service, &product.product_id)?, (6, d("5.5")));
    Ok(())
}

#[test]
fn oversized_sale_reports_what_is_available() -> anyhow::Result<()> {
    let (_dir, service) = open_service("sale_oversized.db")?;
    let product = seed_salmon(&service)?;

    let err = service
        .create_sale(
            &staff(),
            &product.product_id,
            d("120"),
            0,
            PaymentMethod::Cash,
        )
        .unwrap_err();

    match err {
        StockError::InsufficientStock {
            requested_kg,
            available_kg,
        } => {
            assert_eq!(requested_kg, d("120"));
            assert_eq!(available_kg, d("115.5"));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    // the failed allocation must not have touched the projection
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("15.5")));
    Ok(())
}

#[test]
fn new_stock_applies_once_and_only_once() -> anyhow::Result<()> {
    let (_dir, service) = open_service("new_stock_once.db")?;
    let product = seed_salmon(&service)?;

    let movement = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::NewStock {
            addition_id: "addition-2024-117".into(),
            box_change: 5,
            kg_change: Qty::ZERO,
        },
    )?;
    // nothing applied while pending
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("15.5")));

    let approved = service.approve_movement(&movement.movement_id, &manager())?;
    assert_eq!(approved.status, MovementStatus::Completed);
    assert_eq!(stock_of(&service, &product.product_id)?, (15, d("15.5")));

    // a second approval loses the race and applies nothing
    let err = service
        .approve_movement(&movement.movement_id, &manager())
        .unwrap_err();
    assert!(matches!(err, StockError::AlreadyResolved { .. }));
    assert_eq!(stock_of(&service, &product.product_id)?, (15, d("15.5")));
    Ok(())
}

#[test]
fn staff_cannot_approve_or_reject() -> anyhow::Result<()> {
    let (_dir, service) = open_service("staff_gate.db")?;
    let product = seed_salmon(&service)?;

    let movement = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::Damaged {
            report_id: "damage-31".into(),
            box_change: -1,
            kg_change: Qty::ZERO,
        },
    )?;

    let err = service
        .approve_movement(&movement.movement_id, &staff())
        .unwrap_err();
    assert!(matches!(err, StockError::Unauthorized { .. }));

    let err = service
        .reject_movement(&movement.movement_id, &staff(), "not convinced")
        .unwrap_err();
    assert!(matches!(err, StockError::Unauthorized { .. }));

    // still pending, still unapplied
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("15.5")));
    Ok(())
}

#[test]
fn rejected_movement_is_terminal() -> anyhow::Result<()> {
    let (_dir, service) = open_service("reject_terminal.db")?;
    let product = seed_salmon(&service)?;

    let movement = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::StockCorrection {
            correction_id: "recount-9".into(),
            box_change: 2,
            kg_change: Qty(d("-1.5")),
        },
    )?;

    let rejected = service.reject_movement(&movement.movement_id, &manager(), "recount disputed")?;
    assert_eq!(rejected.status, MovementStatus::Rejected);
    let resolution = rejected.resolution.context("rejection not recorded")?;
    assert_eq!(resolution.reason.as_deref(), Some("recount disputed"));
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("15.5")));

    // reject-then-approve is impossible
    let err = service
        .approve_movement(&movement.movement_id, &manager())
        .unwrap_err();
    assert!(matches!(err, StockError::AlreadyResolved { .. }));
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("15.5")));
    Ok(())
}

#[test]
fn only_the_requester_may_cancel() -> anyhow::Result<()> {
    let (_dir, service) = open_service("cancel_requester.db")?;
    let product = seed_salmon(&service)?;

    let movement = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::NewStock {
            addition_id: "addition-5".into(),
            box_change: 1,
            kg_change: Qty::ZERO,
        },
    )?;

    let other = Actor::new("tenant_fishmart", "user_other", Role::Staff);
    let err = service
        .cancel_movement(&movement.movement_id, &other)
        .unwrap_err();
    assert!(matches!(err, StockError::Unauthorized { .. }));

    let cancelled = service.cancel_movement(&movement.movement_id, &staff())?;
    assert_eq!(cancelled.status, MovementStatus::Cancelled);

    let err = service
        .approve_movement(&movement.movement_id, &manager())
        .unwrap_err();
    assert!(matches!(err, StockError::AlreadyResolved { .. }));
    Ok(())
}

#[test]
fn damaged_stock_is_written_off_after_approval() -> anyhow::Result<()> {
    let (_dir, service) = open_service("damaged.db")?;
    let product = seed_salmon(&service)?;

    let movement = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::Damaged {
            report_id: "damage-12".into(),
            box_change: -2,
            kg_change: Qty(d("-3.5")),
        },
    )?;
    service.approve_movement(&movement.movement_id, &manager())?;

    assert_eq!(stock_of(&service, &product.product_id)?, (8, d("12")));
    Ok(())
}

#[test]
fn correction_below_zero_fails_at_approval() -> anyhow::Result<()> {
    let (_dir, service) = open_service("correction_negative.db")?;
    let product = seed_salmon(&service)?;

    let movement = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::StockCorrection {
            correction_id: "recount-2".into(),
            box_change: -11,
            kg_change: Qty::ZERO,
        },
    )?;
    let err = service
        .approve_movement(&movement.movement_id, &manager())
        .unwrap_err();
    assert!(matches!(err, StockError::Validation(_)));

    // the failed approval left the movement pending and stock intact
    let movement = service
        .movement(&staff(), &movement.movement_id)?
        .context("movement vanished")?;
    assert_eq!(movement.status, MovementStatus::Pending);
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("15.5")));
    Ok(())
}

#[test]
fn product_edit_and_delete_through_the_workflow() -> anyhow::Result<()> {
    let (_dir, service) = open_service("product_lifecycle.db")?;
    let product = seed_salmon(&service)?;

    let edit = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::ProductEdit {
            field: ProductField::PricePerKg,
            old_value: "2.60".into(),
            new_value: "3.10".into(),
        },
    )?;
    service.approve_movement(&edit.movement_id, &manager())?;

    let edited = service
        .product(&staff(), &product.product_id)?
        .context("product missing")?;
    assert_eq!(edited.price_per_kg, Qty(d("3.10")));

    // a stale old value is refused at submission
    let err = service
        .submit_movement(
            &staff(),
            &product.product_id,
            MovementKind::ProductEdit {
                field: ProductField::PricePerKg,
                old_value: "2.60".into(),
                new_value: "3.40".into(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, StockError::Validation(_)));

    let delete = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::ProductDelete {
            product_name: edited.name.clone(),
        },
    )?;
    service.approve_movement(&delete.movement_id, &manager())?;
    assert!(service.product(&staff(), &product.product_id)?.is_none());
    Ok(())
}

#[test]
fn quantity_edit_round_trips_the_projection() -> anyhow::Result<()> {
    let (_dir, service) = open_service("edit_round_trip.db")?;
    let product = seed_salmon(&service)?;

    // sell 20 kg: 15.5 loose + one converted box, leaving 9 / 5.5
    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("20"),
        0,
        PaymentMethod::Cash,
    )?;
    assert_eq!(stock_of(&service, &product.product_id)?, (9, d("5.5")));

    // shrink the sale to 10 kg; after approval the projection must equal
    // what selling 10 kg from the original 10 / 15.5 would have produced
    let audit = service.propose_sale_edit(
        &sale.sale_id,
        &staff(),
        SaleChanges {
            kg_quantity: Some(d("10")),
            ..SaleChanges::default()
        },
        "customer took half the order",
    )?;
    let approved = service.approve_sale_audit(&audit.audit_id, &manager())?;
    assert_eq!(approved.approval_status, ApprovalStatus::Approved);
    assert_eq!(approved.approved_by(), Some("user_manager"));

    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("5.5")));
    let sale = service
        .sale(&staff(), &sale.sale_id)?
        .context("sale missing")?;
    assert_eq!(sale.kg_quantity, Qty(d("10")));
    assert_eq!(sale.total_amount, Qty(d("26.00")));
    Ok(())
}

#[test]
fn quantity_increase_fails_approval_when_stock_ran_out() -> anyhow::Result<()> {
    let (_dir, service) = open_service("edit_insufficient.db")?;
    let product = seed_salmon(&service)?;

    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("10"),
        0,
        PaymentMethod::Cash,
    )?;
    // drain the rest of the stock with a second sale (105.5 kg remain)
    service.create_sale(
        &staff(),
        &product.product_id,
        d("105.5"),
        0,
        PaymentMethod::Cash,
    )?;

    let audit = service.propose_sale_edit(
        &sale.sale_id,
        &staff(),
        SaleChanges {
            kg_quantity: Some(d("40")),
            ..SaleChanges::default()
        },
        "customer wants more after all",
    )?;
    let err = service
        .approve_sale_audit(&audit.audit_id, &manager())
        .unwrap_err();
    assert!(matches!(err, StockError::InsufficientStock { .. }));

    // nothing was clamped: sale, audit and projection are as they were
    let audit = service
        .sale_audit(&staff(), &audit.audit_id)?
        .context("audit missing")?;
    assert_eq!(audit.approval_status, ApprovalStatus::Pending);
    let sale = service
        .sale(&staff(), &sale.sale_id)?
        .context("sale missing")?;
    assert_eq!(sale.kg_quantity, Qty(d("10")));
    assert_eq!(stock_of(&service, &product.product_id)?, (0, d("0")));
    Ok(())
}

#[test]
fn payment_method_change_leaves_stock_alone() -> anyhow::Result<()> {
    let (_dir, service) = open_service("payment_change.db")?;
    let product = seed_salmon(&service)?;

    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("10"),
        0,
        PaymentMethod::Cash,
    )?;

    let audit = service.propose_sale_edit(
        &sale.sale_id,
        &staff(),
        SaleChanges {
            payment_method: Some(PaymentMethod::Card),
            ..SaleChanges::default()
        },
        "paid by card at the till",
    )?;
    service.approve_sale_audit(&audit.audit_id, &manager())?;

    let sale = service
        .sale(&staff(), &sale.sale_id)?
        .context("sale missing")?;
    assert_eq!(sale.payment_method, PaymentMethod::Card);
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("5.5")));
    Ok(())
}

#[test]
fn approved_deletion_restores_stock_and_voids_the_sale() -> anyhow::Result<()> {
    let (_dir, service) = open_service("deletion.db")?;
    let product = seed_salmon(&service)?;

    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("20"),
        1,
        PaymentMethod::Cash,
    )?;
    assert_eq!(stock_of(&service, &product.product_id)?, (8, d("5.5")));

    let audit = service.propose_sale_deletion(&sale.sale_id, &staff(), "entered twice")?;
    let approved = service.approve_sale_audit(&audit.audit_id, &manager())?;

    // the audit record persists, pointing at no sale
    assert_eq!(approved.sale_id, None);
    assert!(service.sale(&staff(), &sale.sale_id)?.is_none());
    assert_eq!(stock_of(&service, &product.product_id)?, (9, d("25.5")));
    Ok(())
}

#[test]
fn a_sale_carries_at_most_one_pending_audit() -> anyhow::Result<()> {
    let (_dir, service) = open_service("one_pending_audit.db")?;
    let product = seed_salmon(&service)?;

    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("10"),
        0,
        PaymentMethod::Cash,
    )?;

    let first = service.propose_sale_edit(
        &sale.sale_id,
        &staff(),
        SaleChanges {
            kg_quantity: Some(d("8")),
            ..SaleChanges::default()
        },
        "short by two kilos",
    )?;

    let err = service
        .propose_sale_deletion(&sale.sale_id, &staff(), "or void it entirely")
        .unwrap_err();
    assert!(matches!(err, StockError::ConflictingPendingAudit { .. }));

    // once resolved, a new proposal is accepted
    service.reject_sale_audit(&first.audit_id, &manager(), "quantity was right")?;
    service.propose_sale_deletion(&sale.sale_id, &staff(), "customer returned the order")?;
    Ok(())
}

#[test]
fn rejected_audit_changes_nothing_and_stays_terminal() -> anyhow::Result<()> {
    let (_dir, service) = open_service("audit_reject.db")?;
    let product = seed_salmon(&service)?;

    let sale = service.create_sale(
        &staff(),
        &product.product_id,
        d("10"),
        0,
        PaymentMethod::Cash,
    )?;
    let audit = service.propose_sale_edit(
        &sale.sale_id,
        &staff(),
        SaleChanges {
            kg_quantity: Some(d("5")),
            ..SaleChanges::default()
        },
        "scale was off",
    )?;

    let rejected = service.reject_sale_audit(&audit.audit_id, &manager(), "scale checked fine")?;
    assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
    assert_eq!(stock_of(&service, &product.product_id)?, (10, d("5.5")));

    let err = service
        .approve_sale_audit(&audit.audit_id, &manager())
        .unwrap_err();
    assert!(matches!(err, StockError::AlreadyResolved { .. }));
    Ok(())
}

#[test]
fn ledger_queries_follow_product_and_status() -> anyhow::Result<()> {
    let (_dir, service) = open_service("ledger_queries.db")?;
    let product = seed_salmon(&service)?;

    let addition = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::NewStock {
            addition_id: "addition-1".into(),
            box_change: 3,
            kg_change: Qty::ZERO,
        },
    )?;
    service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::Damaged {
            report_id: "damage-1".into(),
            box_change: -1,
            kg_change: Qty::ZERO,
        },
    )?;
    service.approve_movement(&addition.movement_id, &manager())?;

    let for_product = service.movements_for_product(&staff(), &product.product_id)?;
    assert_eq!(for_product.len(), 3); // create + addition + damage

    let pending = service.movements_by_status(&staff(), MovementStatus::Pending)?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind.name(), "damaged");

    let completed = service.movements_by_status(&staff(), MovementStatus::Completed)?;
    assert_eq!(completed.len(), 2);

    let now = chrono::Utc::now();
    let ranged = service.movements_in_range(
        &staff(),
        now - chrono::Duration::hours(1),
        now + chrono::Duration::hours(1),
    )?;
    assert_eq!(ranged.len(), 3);
    Ok(())
}

#[test]
fn tenants_never_see_each_other() -> anyhow::Result<()> {
    let (_dir, service) = open_service("tenant_isolation.db")?;
    let product = seed_salmon(&service)?;

    let intruder = Actor::new("tenant_other", "user_intruder", Role::Admin);

    assert!(service.product(&intruder, &product.product_id)?.is_none());
    assert!(service.stock_snapshot(&intruder)?.is_empty());

    let err = service
        .create_sale(
            &intruder,
            &product.product_id,
            d("1"),
            0,
            PaymentMethod::Cash,
        )
        .unwrap_err();
    assert!(matches!(err, StockError::NotFound { .. }));

    let movement = service.submit_movement(
        &staff(),
        &product.product_id,
        MovementKind::NewStock {
            addition_id: "addition-1".into(),
            box_change: 1,
            kg_change: Qty::ZERO,
        },
    )?;
    let err = service
        .approve_movement(&movement.movement_id, &intruder)
        .unwrap_err();
    assert!(matches!(err, StockError::NotFound { .. }));
    Ok(())
}
