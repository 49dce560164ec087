use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockkeep_core::{DomainError, DomainResult, Entity, ProductId};

/// Non-negative unit price.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct UnitPrice(Decimal);

impl UnitPrice {
    pub const ZERO: UnitPrice = UnitPrice(Decimal::ZERO);

    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(Self(amount.normalize()))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for UnitPrice {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitPrice> for Decimal {
    fn from(value: UnitPrice) -> Self {
        value.0
    }
}

impl FromStr for UnitPrice {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation(format!("price '{}' is not a number: {}", s, e)))?;
        Self::new(amount)
    }
}

impl core::fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A stocked catalog entry.
///
/// `quantity` is never negative; only a sale lowers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: UnitPrice,
    pub registered_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl Product {
    /// Materialize a product from a validated registration and the id the store assigned.
    pub fn from_registration(id: ProductId, cmd: &RegisterProduct) -> Self {
        Self {
            id,
            name: cmd.name.trim().to_string(),
            quantity: cmd.quantity,
            unit_price: cmd.unit_price,
            registered_at: cmd.occurred_at,
        }
    }
}

/// Command: RegisterProduct (catalog insert).
///
/// Duplicate names are allowed; each registration is its own lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProduct {
    pub name: String,
    pub quantity: i64,
    pub unit_price: UnitPrice,
    pub occurred_at: DateTime<Utc>,
}

impl RegisterProduct {
    pub fn new(
        name: impl Into<String>,
        quantity: i64,
        unit_price: UnitPrice,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            occurred_at,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(())
    }
}
