//! Quote retrieval as a unit computation.

use super::UnitContext;
use crate::domain::error::UnitError;
use crate::domain::quote::QuoteRecord;
use tracing::info;

pub fn quote(ctx: &UnitContext<'_>, symbol: &str) -> Result<QuoteRecord, UnitError> {
    info!(symbol, "retrieving detail quote");
    ctx.quote(symbol)
}
