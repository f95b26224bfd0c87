//! Trade execution: sizing, commissions and stop-loss exits.
//!
//! Fills happen at the price handed in (the bar close, or the stop price for
//! a stop-out). Commission is a flat rate on traded value, charged on entry
//! and on exit.

use chrono::NaiveDateTime;

use super::account::Account;
use super::position::{ExitReason, Position, Trade};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionConfig {
    pub commission_rate: f64,
    /// Fraction of equity committed per entry, in (0, 1].
    pub position_fraction: f64,
    /// Stop distance below entry as a fraction; 0 disables the stop.
    pub stop_loss_pct: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.001,
            position_fraction: 0.1,
            stop_loss_pct: 0.02,
        }
    }
}

pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission_rate
}

/// Whole units affordable with `position_fraction` of `equity`, commission included.
pub fn position_quantity(equity: f64, price: f64, config: &ExecutionConfig) -> i64 {
    if !(price.is_finite() && price > 0.0) || equity <= 0.0 {
        return 0;
    }
    let budget = config.position_fraction * equity;
    (budget / (price * (1.0 + config.commission_rate))).floor() as i64
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: i64,
        execution_price: f64,
        cost: f64,
        commission: f64,
    },
    AlreadyOpen,
    InsufficientCapital,
}

/// Open a long position at `price`.
///
/// Sizing uses current equity, which equals cash while flat. Cash is debited
/// the notional plus commission; the stop sits `stop_loss_pct` below entry.
pub fn enter_long(
    account: &mut Account,
    instrument: &str,
    price: f64,
    timestamp: NaiveDateTime,
    config: &ExecutionConfig,
) -> EntryResult {
    if !account.is_flat() {
        return EntryResult::AlreadyOpen;
    }

    let quantity = position_quantity(account.cash, price, config);
    if quantity <= 0 {
        return EntryResult::InsufficientCapital;
    }

    let cost = quantity as f64 * price;
    let commission = calculate_commission(cost, config);
    if cost + commission > account.cash {
        return EntryResult::InsufficientCapital;
    }
    account.cash -= cost + commission;

    let stop_loss_price = if config.stop_loss_pct > 0.0 {
        price * (1.0 - config.stop_loss_pct)
    } else {
        0.0
    };

    account.position = Some(Position {
        instrument: instrument.to_string(),
        quantity,
        entry_price: price,
        entry_timestamp: timestamp,
        stop_loss_price,
        entry_commission: commission,
    });

    tracing::debug!(instrument, quantity, price, "opened long position");

    EntryResult::Entered {
        quantity,
        execution_price: price,
        cost,
        commission,
    }
}

/// Result of an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub quantity: i64,
    pub exit_price: f64,
    pub exit_value: f64,
    pub exit_commission: f64,
    pub net_pnl: f64,
}

/// Close the open position at `price`, crediting proceeds net of commission
/// and appending a [`Trade`]. Returns `None` when flat.
pub fn exit_position(
    account: &mut Account,
    price: f64,
    timestamp: NaiveDateTime,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = account.position.take()?;

    let exit_value = position.market_value(price);
    let exit_commission = calculate_commission(exit_value, config);
    let gross_pnl = position.unrealized_pnl(price);
    let commission = position.entry_commission + exit_commission;
    let net_pnl = gross_pnl - commission;

    account.cash += exit_value - exit_commission;

    tracing::debug!(
        instrument = %position.instrument,
        price,
        net_pnl,
        reason = %reason,
        "closed position"
    );

    account.record_trade(Trade {
        instrument: position.instrument,
        entry_timestamp: position.entry_timestamp,
        exit_timestamp: timestamp,
        entry_price: position.entry_price,
        exit_price: price,
        quantity: position.quantity,
        gross_pnl,
        commission,
        net_pnl,
        exit_reason: reason,
    });

    Some(ExitResult {
        quantity: position.quantity,
        exit_price: price,
        exit_value,
        exit_commission,
        net_pnl,
    })
}

/// Force-close at the stop price when the bar's low reaches it.
pub fn check_stop_loss(
    account: &mut Account,
    low: f64,
    timestamp: NaiveDateTime,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let stop = account
        .position
        .as_ref()
        .filter(|pos| pos.should_stop_loss(low))?
        .stop_loss_price;
    exit_position(account, stop, timestamp, ExitReason::StopLoss, config)
}
