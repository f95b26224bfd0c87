//! Outbound notification port trait.

use crate::domain::analysis::SignalAlert;
use crate::domain::batch::RunReport;
use crate::domain::error::FinbotError;

/// Receives finished, immutable records. Nothing flows back into the engine.
pub trait NotifierPort {
    fn notify_signal(&self, alert: &SignalAlert) -> Result<(), FinbotError>;

    fn notify_report(&self, report: &RunReport) -> Result<(), FinbotError>;
}
