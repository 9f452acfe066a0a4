use rust_decimal::Decimal;

#[derive(thiserror::Error, Debug)]
pub enum StockError {
    #[error(
        "insufficient stock: requested {requested_kg} kg equivalent, only {available_kg} kg equivalent on hand"
    )]
    InsufficientStock {
        requested_kg: Decimal,
        available_kg: Decimal,
    },
    #[error("movement references product {product_id}, which does not exist")]
    InvalidMovementReference { product_id: String },
    #[error("{entity} {id} has already been resolved")]
    AlreadyResolved { entity: &'static str, id: String },
    #[error("actor {actor_id} is not permitted to {action}")]
    Unauthorized {
        actor_id: String,
        action: &'static str,
    },
    #[error("sale {sale_id} already has a pending audit")]
    ConflictingPendingAudit { sale_id: String },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("codec failure: {0}")]
    Codec(String),
}

impl StockError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        StockError::Validation(msg.into())
    }

    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        StockError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn already_resolved(entity: &'static str, id: &str) -> Self {
        StockError::AlreadyResolved {
            entity,
            id: id.to_string(),
        }
    }
}
