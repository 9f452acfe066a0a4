//! Allocation engine: decides how a requested sale quantity is drawn from
//! mixed box/kg stock.
//!
//! Pure and deterministic. Boxes requested as boxes are reserved whole;
//! requested kg comes from loose stock first and any shortfall is covered
//! by converting `ceil(shortfall / ratio)` boxes, with the leftover kg
//! returned to the loose balance rather than discarded. Monetary totals
//! are rounded to 2 dp once, at the end.

use crate::error::StockError;
use crate::product::Product;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Signed breakdown of where a fulfilled request came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationDeltas {
    pub boxes_sold_direct: u64,
    pub kg_from_loose: Decimal,
    pub boxes_converted: u64,
    pub kg_from_boxes: Decimal,
    pub kg_returned_to_loose: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub deltas: AllocationDeltas,
    /// Human-readable trace of each step, for audit display.
    pub steps: Vec<String>,
    /// kg and box portions priced independently, rounded to 2 dp.
    pub total_amount: Decimal,
    pub boxes_after: u64,
    pub kg_after: Decimal,
}

/// Fulfill a sale request against the product's current balances.
///
/// Fails with [`StockError::InsufficientStock`] when the request exceeds
/// what boxes and loose kg together can cover, reporting both sides in kg
/// equivalent. The product row itself is untouched; the caller applies
/// `boxes_after`/`kg_after` in the same transaction as the sale write.
pub fn allocate(
    product: &Product,
    requested_kg: Decimal,
    requested_boxes: u64,
) -> Result<Allocation, StockError> {
    if requested_kg < Decimal::ZERO {
        return Err(StockError::validation("requested kg must not be negative"));
    }
    if requested_kg.is_zero() && requested_boxes == 0 {
        return Err(StockError::validation(
            "a sale must request at least some boxes or kg",
        ));
    }

    let ratio = product.box_to_kg_ratio.0;
    let requested_equivalent_kg = requested_kg + Decimal::from(requested_boxes) * ratio;
    let insufficient = || StockError::InsufficientStock {
        requested_kg: requested_equivalent_kg,
        available_kg: product.total_available_kg(),
    };

    let mut boxes = product.quantity_box;
    let mut kg = product.quantity_kg.0;
    let mut steps = Vec::new();

    // Box portion: reserved whole, never sourced by converting kg back.
    if requested_boxes > 0 {
        if boxes < requested_boxes {
            return Err(insufficient());
        }
        boxes -= requested_boxes;
        steps.push(format!("reserved {requested_boxes} boxes from box stock"));
    }

    let mut kg_from_loose = Decimal::ZERO;
    let mut boxes_converted = 0u64;
    let mut kg_from_boxes = Decimal::ZERO;
    let mut kg_returned = Decimal::ZERO;

    // Kg portion: loose stock first, boxes only to cover the shortfall.
    if requested_kg > Decimal::ZERO {
        kg_from_loose = requested_kg.min(kg);
        kg -= kg_from_loose;
        if kg_from_loose > Decimal::ZERO {
            steps.push(format!("used {kg_from_loose} kg of loose stock"));
        }

        let shortfall = requested_kg - kg_from_loose;
        if shortfall > Decimal::ZERO {
            // ceil, never floor: a partial box shortfall still opens a
            // whole box and the excess goes back to loose stock.
            let needed = (shortfall / ratio).ceil();
            boxes_converted = needed.to_u64().ok_or_else(|| {
                StockError::validation(format!("box conversion count {needed} is out of range"))
            })?;
            if boxes < boxes_converted {
                return Err(insufficient());
            }

            kg_from_boxes = Decimal::from(boxes_converted) * ratio;
            kg_returned = kg_from_boxes - shortfall;
            boxes -= boxes_converted;
            kg += kg_returned;
            steps.push(format!(
                "converted {boxes_converted} boxes into {kg_from_boxes} kg ({kg_returned} kg returned to loose stock)"
            ));
        }
    }

    let total_amount = (requested_kg * product.price_per_kg.0
        + Decimal::from(requested_boxes) * product.price_per_box.0)
        .round_dp(2);

    Ok(Allocation {
        deltas: AllocationDeltas {
            boxes_sold_direct: requested_boxes,
            kg_from_loose,
            boxes_converted,
            kg_from_boxes,
            kg_returned_to_loose: kg_returned,
        },
        steps,
        total_amount,
        boxes_after: boxes,
        kg_after: kg,
    })
}
