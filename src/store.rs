//! Sled-backed ledger store.
//!
//! One tree per record family, plus an index tree that holds at most one
//! pending audit id per sale. Movements and audits are append-only: the
//! only rewrite the service layer ever performs on them is the status
//! transition out of `Pending`, and that happens inside a serializable
//! sled transaction so concurrent approvals cannot both win.

use crate::error::StockError;
use crate::movement::Movement;
use crate::product::Product;
use crate::sale::{Sale, SaleAudit};
use sled::transaction::TransactionError;
use sled::{Db, Tree};
use std::sync::Arc;

pub struct LedgerStore {
    pub(crate) products: Tree,
    pub(crate) movements: Tree,
    pub(crate) sales: Tree,
    pub(crate) sale_audits: Tree,
    /// sale_id -> audit_id for the single pending audit a sale may have.
    pub(crate) pending_audits: Tree,
}

impl LedgerStore {
    pub fn open(db: Arc<Db>) -> Result<Self, StockError> {
        Ok(Self {
            products: db.open_tree("products")?,
            movements: db.open_tree("movements")?,
            sales: db.open_tree("sales")?,
            sale_audits: db.open_tree("sale_audits")?,
            pending_audits: db.open_tree("pending_audits")?,
        })
    }

    pub fn product(&self, product_id: &str) -> Result<Option<Product>, StockError> {
        self.fetch(&self.products, product_id)
    }

    pub fn movement(&self, movement_id: &str) -> Result<Option<Movement>, StockError> {
        self.fetch(&self.movements, movement_id)
    }

    pub fn sale(&self, sale_id: &str) -> Result<Option<Sale>, StockError> {
        self.fetch(&self.sales, sale_id)
    }

    pub fn sale_audit(&self, audit_id: &str) -> Result<Option<SaleAudit>, StockError> {
        self.fetch(&self.sale_audits, audit_id)
    }

    pub(crate) fn insert_movement(&self, movement: &Movement) -> Result<(), StockError> {
        self.movements
            .insert(movement.movement_id.as_bytes(), encode(movement)?)?;
        Ok(())
    }

    pub fn all_products(&self) -> Result<Vec<Product>, StockError> {
        scan(&self.products)
    }

    pub fn all_movements(&self) -> Result<Vec<Movement>, StockError> {
        scan(&self.movements)
    }

    pub fn all_sale_audits(&self) -> Result<Vec<SaleAudit>, StockError> {
        scan(&self.sale_audits)
    }

    fn fetch<T>(&self, tree: &Tree, id: &str) -> Result<Option<T>, StockError>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        tree.get(id.as_bytes())?.map(|raw| decode(&raw)).transpose()
    }
}

pub(crate) fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, StockError> {
    minicbor::to_vec(value).map_err(|e| StockError::Codec(e.to_string()))
}

pub(crate) fn decode<T>(raw: &[u8]) -> Result<T, StockError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    minicbor::decode(raw).map_err(|e| StockError::Codec(e.to_string()))
}

fn scan<T>(tree: &Tree) -> Result<Vec<T>, StockError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    tree.iter()
        .map(|entry| {
            let (_, raw) = entry?;
            decode(&raw)
        })
        .collect()
}

/// Collapse a sled transaction result: aborts carry our own error type,
/// storage failures surface as `Storage`.
pub(crate) fn run<T>(result: Result<T, TransactionError<StockError>>) -> Result<T, StockError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(StockError::Storage(err)),
    }
}
