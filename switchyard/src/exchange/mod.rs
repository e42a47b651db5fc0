//! Message exchanges: patterns, normalized messages and the exchange lifecycle.

pub use exchange::{ExchangeBuilder, MessageExchange};
pub use exchange_error::ExchangeError;
pub use message::{Fault, NormalizedMessage};
pub use pattern::{ExchangePattern, ExchangeStatus};
pub use snapshot::{ExchangeSnapshot, SNAPSHOT_VERSION};

#[allow(clippy::module_inception)]
mod exchange;
mod exchange_error;
mod message;
mod pattern;
mod snapshot;
