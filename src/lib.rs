//! Stock accounting and approval workflow engine for perishable goods
//! sold in two interchangeable units: whole boxes and loose kilograms.
//!
//! The crate is built from three pieces: a pure [`allocation`] engine
//! that decides how a sale request is drawn from mixed box/kg stock, an
//! append-only movement ledger that records every inventory-affecting
//! event, and the pending/approve/reject workflow in [`service`] that
//! gates stock additions, corrections, product mutations and retroactive
//! sale edits behind manager approval.

pub mod allocation;
pub mod error;
pub mod movement;
pub mod product;
pub mod sale;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

pub use error::StockError;
pub use service::StockService;
