//! Plain-text notifier: short alert messages written to any `Write` sink.

use std::io::Write;
use std::sync::Mutex;

use crate::domain::analysis::SignalAlert;
use crate::domain::batch::RunReport;
use crate::domain::error::FinbotError;
use crate::ports::notifier_port::NotifierPort;

const STRENGTH_SLOTS: usize = 5;

/// Five-slot bar, e.g. `███░░` for 0.6.
pub fn strength_bar(strength: f64) -> String {
    let filled = ((strength.clamp(0.0, 1.0) * STRENGTH_SLOTS as f64) as usize).min(STRENGTH_SLOTS);
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(STRENGTH_SLOTS - filled)
    )
}

pub fn format_signal_alert(alert: &SignalAlert) -> String {
    let signal = &alert.signal;
    let mut out = String::new();
    out.push_str("TRADING SIGNAL\n\n");
    out.push_str(&format!("Symbol: {}\n", alert.instrument));
    out.push_str(&format!("Signal: {}\n", signal.direction));
    out.push_str(&format!("Strategy: {}\n", signal.source_strategy));
    out.push_str(&format!("Price: ${:.2}\n", alert.price));
    out.push_str(&format!(
        "Strength: {} ({:.0}%)\n",
        strength_bar(signal.strength),
        signal.strength * 100.0
    ));
    if !signal.supporting_strategies.is_empty() {
        let names: Vec<&str> = signal
            .supporting_strategies
            .iter()
            .map(String::as_str)
            .collect();
        out.push_str(&format!("Supporting: {}\n", names.join(", ")));
    }
    out.push_str(&format!("\nTime: {}\n", alert.timestamp));
    out
}

pub fn format_run_summary(report: &RunReport) -> String {
    let mut out = String::from("BACKTEST RESULTS\n");
    for instrument in report.instruments() {
        let Some(best) = report.best_for(instrument) else {
            continue;
        };
        let m = &best.metrics;
        out.push_str(&format!("\nSymbol: {instrument}\n"));
        out.push_str(&format!("Best Strategy: {}\n", best.strategy));
        out.push_str(&format!("Total Return: {:.2}%\n", m.total_return * 100.0));
        out.push_str(&format!("Win Rate: {:.2}%\n", m.win_rate * 100.0));
        out.push_str(&format!(
            "Signal Accuracy: {:.2}%\n",
            m.signal_accuracy * 100.0
        ));
    }
    for failure in &report.failures {
        out.push_str(&format!(
            "\nSymbol: {}\nNo data: {}\n",
            failure.instrument, failure.error
        ));
    }
    out
}

pub struct TextNotifier<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> TextNotifier<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, FinbotError> {
        self.writer.into_inner().map_err(|e| FinbotError::Notify {
            reason: e.to_string(),
        })
    }

    fn send(&self, message: &str) -> Result<(), FinbotError> {
        let mut writer = self.writer.lock().map_err(|e| FinbotError::Notify {
            reason: e.to_string(),
        })?;
        writeln!(writer, "{message}")
            .and_then(|_| writer.flush())
            .map_err(|e| FinbotError::Notify {
                reason: e.to_string(),
            })
    }
}

impl<W: Write + Send> NotifierPort for TextNotifier<W> {
    fn notify_signal(&self, alert: &SignalAlert) -> Result<(), FinbotError> {
        self.send(&format_signal_alert(alert))
    }

    fn notify_report(&self, report: &RunReport) -> Result<(), FinbotError> {
        self.send(&format_run_summary(report))
    }
}
