//! Identifier construction helpers
//!
//! Every record id is a fresh uuid7 encoded as a bech32m string with an
//! entity-specific human-readable prefix, so ids stay sortable by creation
//! time and self-describing in logs and exports.

use crate::error::StockError;
use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> Result<String, StockError> {
    let hrp = bech32::Hrp::parse(hrp)
        .map_err(|e| StockError::validation(format!("invalid id prefix {hrp:?}: {e}")))?;
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())
        .map_err(|e| StockError::validation(format!("failed to encode id: {e}")))
}

pub fn product_id() -> Result<String, StockError> {
    new_uuid_to_bech32("product_")
}

pub fn movement_id() -> Result<String, StockError> {
    new_uuid_to_bech32("mv_")
}

pub fn sale_id() -> Result<String, StockError> {
    new_uuid_to_bech32("sale_")
}

pub fn audit_id() -> Result<String, StockError> {
    new_uuid_to_bech32("audit_")
}
