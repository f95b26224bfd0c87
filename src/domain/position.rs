//! Open positions and closed trades.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub instrument: String,
    /// Whole units, always positive (long only).
    pub quantity: i64,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
    pub stop_loss_price: f64,
    pub entry_commission: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.entry_price)
    }

    /// A stop price of zero disables the stop.
    pub fn should_stop_loss(&self, low: f64) -> bool {
        self.stop_loss_price > 0.0 && low <= self.stop_loss_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitReason {
    Signal,
    StopLoss,
    EndOfPeriod,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::EndOfPeriod => write!(f, "end_of_period"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trade {
    pub instrument: String,
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: i64,
    pub gross_pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub net_pnl: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn duration_days(&self) -> f64 {
        (self.exit_timestamp - self.entry_timestamp).num_seconds() as f64 / 86_400.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_position() -> Position {
        Position {
            instrument: "BHP".into(),
            quantity: 100,
            entry_price: 50.0,
            entry_timestamp: ts(15),
            stop_loss_price: 49.0,
            entry_commission: 5.0,
        }
    }

    #[test]
    fn market_value_and_pnl() {
        let pos = sample_position();
        assert!((pos.market_value(55.0) - 5500.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(45.0) + 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_loss_on_low() {
        let pos = sample_position();
        assert!(pos.should_stop_loss(49.0));
        assert!(pos.should_stop_loss(48.0));
        assert!(!pos.should_stop_loss(49.5));
    }

    #[test]
    fn zero_stop_disabled() {
        let mut pos = sample_position();
        pos.stop_loss_price = 0.0;
        assert!(!pos.should_stop_loss(0.0));
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::StopLoss.to_string(), "stop_loss");
        assert_eq!(ExitReason::EndOfPeriod.to_string(), "end_of_period");
        assert_eq!(ExitReason::Signal.to_string(), "signal");
    }

    #[test]
    fn trade_duration_in_days() {
        let trade = Trade {
            instrument: "BHP".into(),
            entry_timestamp: ts(1),
            exit_timestamp: ts(11),
            entry_price: 10.0,
            exit_price: 11.0,
            quantity: 1,
            gross_pnl: 1.0,
            commission: 0.1,
            net_pnl: 0.9,
            exit_reason: ExitReason::Signal,
        };
        assert!((trade.duration_days() - 10.0).abs() < f64::EPSILON);
        assert!(trade.is_win());
    }
}
