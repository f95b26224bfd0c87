//! Market data port trait.

use chrono::NaiveDate;

use crate::domain::error::DataError;
use crate::domain::ohlcv::{BarSize, Series};

/// Source of historical bars. Implementations are shared across worker
/// threads by the batch runner.
pub trait DataPort: Send + Sync {
    /// Bars for `instrument` with timestamps in `start..=end` (whole days).
    fn fetch(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
        bar_size: BarSize,
    ) -> Result<Series, DataError>;
}
