mod amount;
mod record;

pub use amount::Amount;
pub use record::{RevenueRecord, Source};
