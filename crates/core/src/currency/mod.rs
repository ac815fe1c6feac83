//! Multi-currency handling and exchange rates.

pub mod codec;
pub mod exchange;

#[cfg(test)]
mod props;

pub use codec::MoneyCodec;
pub use exchange::{parse_currency, ExchangeRate, FxRateService, RateTable, RateUpsert};
