use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockkeep_core::{DomainError, DomainResult, Entity, ProductId, SaleId};

/// Immutable record of one sale against a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEvent {
    pub id: SaleId,
    pub product_id: ProductId,
    pub quantity_sold: i64,
    pub sold_at: NaiveDate,
}

impl Entity for SaleEvent {
    type Id = SaleId;

    fn id(&self) -> SaleId {
        self.id
    }
}

/// Command: SellProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellProduct {
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

impl SellProduct {
    pub fn new(product_id: ProductId, quantity: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            product_id,
            quantity,
            occurred_at,
        }
    }

    /// Calendar date (UTC) the sale is booked under.
    pub fn sold_on(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("sale quantity must be greater than zero"));
        }
        Ok(())
    }
}

/// Outcome of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale: SaleEvent,
    /// Stock left on the product after this sale.
    pub remaining: i64,
}

/// Decide a sale against the quantity currently on hand.
///
/// `available` is `None` when the product does not exist. Returns the new
/// quantity to persist; no partial sales.
pub fn plan_sale(cmd: &SellProduct, available: Option<i64>) -> DomainResult<i64> {
    cmd.validate()?;

    let Some(available) = available else {
        return Err(DomainError::not_found(cmd.product_id));
    };

    if available < cmd.quantity {
        return Err(DomainError::insufficient_stock(
            cmd.product_id,
            cmd.quantity,
            available,
        ));
    }

    Ok(available - cmd.quantity)
}
