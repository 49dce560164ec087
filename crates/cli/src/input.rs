//! Raw command-line text to domain commands.
//!
//! Arguments arrive as strings so that malformed numbers surface as
//! `DomainError::Validation` rather than as clap usage errors.

use chrono::{DateTime, Utc};

use stockkeep_core::{DomainError, DomainResult, ProductId};
use stockkeep_inventory::{RegisterProduct, ReportDate, SellProduct, UnitPrice};

fn parse_int<T: std::str::FromStr>(field: &str, raw: &str) -> DomainResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| DomainError::validation(format!("{field} must be a whole number, got '{raw}'")))
}

pub fn product_id(raw: &str) -> DomainResult<ProductId> {
    parse_int::<i64>("product id", raw).map(ProductId::new)
}

pub fn register_product(
    name: &str,
    quantity: &str,
    price: &str,
    now: DateTime<Utc>,
) -> DomainResult<RegisterProduct> {
    let quantity = parse_int::<i64>("quantity", quantity)?;
    let unit_price: UnitPrice = price.trim().parse()?;
    let cmd = RegisterProduct::new(name, quantity, unit_price, now);
    cmd.validate()?;
    Ok(cmd)
}

pub fn sell_product(product: &str, quantity: &str, now: DateTime<Utc>) -> DomainResult<SellProduct> {
    let cmd = SellProduct::new(product_id(product)?, parse_int("quantity", quantity)?, now);
    cmd.validate()?;
    Ok(cmd)
}

pub fn report_date(day: &str, month: &str, year: &str) -> DomainResult<ReportDate> {
    ReportDate::from_parts(
        parse_int("day", day)?,
        parse_int("month", month)?,
        parse_int("year", year)?,
    )
}
