//! Configuration validation.
//!
//! Runs once at construction; any failure is fatal before a run starts.

use crate::domain::config::{FinbotConfig, is_member_name};
use crate::domain::error::FinbotError;

pub fn validate_config(config: &FinbotConfig) -> Result<(), FinbotError> {
    validate_engine(config)?;
    validate_dates(config)?;
    validate_rsi(config)?;
    validate_macd(config)?;
    validate_bollinger(config)?;
    validate_ma_crossover(config)?;
    validate_volume(config)?;
    validate_learned_model(config)?;
    validate_ensemble(config)?;
    Ok(())
}

fn require_positive_period(section: &str, key: &str, value: usize) -> Result<(), FinbotError> {
    if value == 0 {
        return Err(FinbotError::invalid(
            section,
            key,
            format!("{key} must be at least 1"),
        ));
    }
    Ok(())
}

fn validate_engine(config: &FinbotConfig) -> Result<(), FinbotError> {
    let bt = &config.backtest;
    let exec = &bt.execution;
    let eval = &config.evaluation;

    if !(bt.initial_capital > 0.0) {
        return Err(FinbotError::invalid(
            "engine",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    if !(0.0..1.0).contains(&exec.commission_rate) {
        return Err(FinbotError::invalid(
            "engine",
            "commission_rate",
            "commission_rate must be in [0, 1)",
        ));
    }
    if !(exec.position_fraction > 0.0 && exec.position_fraction <= 1.0) {
        return Err(FinbotError::invalid(
            "engine",
            "position_fraction",
            "position_fraction must be in (0, 1]",
        ));
    }
    if !(0.0..1.0).contains(&exec.stop_loss_pct) {
        return Err(FinbotError::invalid(
            "engine",
            "stop_loss_pct",
            "stop_loss_pct must be in [0, 1)",
        ));
    }
    require_positive_period("engine", "accuracy_horizon", eval.accuracy_horizon)?;
    if !(eval.periods_per_year > 0.0) {
        return Err(FinbotError::invalid(
            "engine",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    if !(0.0..1.0).contains(&eval.risk_free_rate) {
        return Err(FinbotError::invalid(
            "engine",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &FinbotConfig) -> Result<(), FinbotError> {
    if config.data.start >= config.data.end {
        return Err(FinbotError::invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_rsi(config: &FinbotConfig) -> Result<(), FinbotError> {
    let rsi = &config.rsi;
    require_positive_period("rsi", "period", rsi.period)?;
    for (key, value) in [
        ("oversold_threshold", rsi.oversold_threshold),
        ("overbought_threshold", rsi.overbought_threshold),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(FinbotError::invalid(
                "rsi",
                key,
                format!("{key} must be between 0 and 100"),
            ));
        }
    }
    if rsi.oversold_threshold >= rsi.overbought_threshold {
        return Err(FinbotError::invalid(
            "rsi",
            "oversold_threshold",
            "oversold_threshold must be below overbought_threshold",
        ));
    }
    Ok(())
}

fn validate_macd(config: &FinbotConfig) -> Result<(), FinbotError> {
    let macd = &config.macd;
    require_positive_period("macd", "fast_period", macd.fast_period)?;
    require_positive_period("macd", "slow_period", macd.slow_period)?;
    require_positive_period("macd", "signal_period", macd.signal_period)?;
    if macd.fast_period >= macd.slow_period {
        return Err(FinbotError::invalid(
            "macd",
            "fast_period",
            "fast_period must be below slow_period",
        ));
    }
    Ok(())
}

fn validate_bollinger(config: &FinbotConfig) -> Result<(), FinbotError> {
    require_positive_period("bollinger", "period", config.bollinger.period)?;
    if !(config.bollinger.std_dev > 0.0) {
        return Err(FinbotError::invalid(
            "bollinger",
            "std_dev",
            "std_dev must be positive",
        ));
    }
    Ok(())
}

fn validate_ma_crossover(config: &FinbotConfig) -> Result<(), FinbotError> {
    let ma = &config.ma_crossover;
    require_positive_period("ma_crossover", "short_period", ma.short_period)?;
    require_positive_period("ma_crossover", "long_period", ma.long_period)?;
    if ma.short_period >= ma.long_period {
        return Err(FinbotError::invalid(
            "ma_crossover",
            "short_period",
            "short_period must be below long_period",
        ));
    }
    Ok(())
}

fn validate_volume(config: &FinbotConfig) -> Result<(), FinbotError> {
    require_positive_period("volume", "period", config.volume.period)?;
    if !(config.volume.threshold >= 0.0) {
        return Err(FinbotError::invalid(
            "volume",
            "threshold",
            "threshold must be non-negative",
        ));
    }
    Ok(())
}

fn validate_learned_model(config: &FinbotConfig) -> Result<(), FinbotError> {
    const S: &str = "learned_model";
    let lm = &config.learned_model;

    require_positive_period(S, "n_estimators", lm.forest.n_estimators)?;
    require_positive_period(S, "max_depth", lm.forest.max_depth)?;
    require_positive_period(S, "min_samples_leaf", lm.forest.min_samples_leaf)?;
    if lm.forest.min_samples_split < 2 {
        return Err(FinbotError::invalid(
            S,
            "min_samples_split",
            "min_samples_split must be at least 2",
        ));
    }
    require_positive_period(S, "rsi_period", lm.features.rsi_period)?;
    require_positive_period(S, "min_training_samples", lm.min_training_samples)?;

    if lm.features.horizons.is_empty() {
        return Err(FinbotError::invalid(S, "horizons", "horizons must not be empty"));
    }
    if lm.features.horizons.contains(&0) {
        return Err(FinbotError::invalid(
            S,
            "horizons",
            "every horizon must be at least 1",
        ));
    }

    if !(0.0 <= lm.sell_threshold
        && lm.sell_threshold < lm.buy_threshold
        && lm.buy_threshold <= 1.0)
    {
        return Err(FinbotError::invalid(
            S,
            "buy_threshold",
            "thresholds must satisfy 0 <= sell_threshold < buy_threshold <= 1",
        ));
    }
    if !(0.0..=100.0).contains(&lm.rsi_boost_below) {
        return Err(FinbotError::invalid(
            S,
            "rsi_boost_below",
            "rsi_boost_below must be between 0 and 100",
        ));
    }
    if !(lm.rsi_boost_factor >= 1.0) {
        return Err(FinbotError::invalid(
            S,
            "rsi_boost_factor",
            "rsi_boost_factor must be at least 1",
        ));
    }
    Ok(())
}

fn validate_ensemble(config: &FinbotConfig) -> Result<(), FinbotError> {
    if config.members.is_empty() {
        return Err(FinbotError::invalid(
            "engine",
            "strategies",
            "at least one strategy must be enabled",
        ));
    }
    for name in &config.members {
        if !is_member_name(name) {
            return Err(FinbotError::UnknownStrategy(name.clone()));
        }
    }
    if let Some(dup) = config
        .members
        .iter()
        .enumerate()
        .find(|(i, name)| config.members[..*i].contains(name))
        .map(|(_, name)| name)
    {
        return Err(FinbotError::invalid(
            "engine",
            "strategies",
            format!("duplicate strategy: {dup}"),
        ));
    }

    for (name, weight) in &config.ensemble.weights {
        if !(*weight >= 0.0) {
            return Err(FinbotError::invalid(
                "ensemble",
                name,
                "weights must be non-negative",
            ));
        }
    }
    if !(config.total_member_weight() > 0.0) {
        return Err(FinbotError::invalid(
            "ensemble",
            "weights",
            "weights of enabled strategies sum to zero",
        ));
    }

    let threshold = config.ensemble.consensus_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(FinbotError::invalid(
            "ensemble",
            "consensus_threshold",
            "consensus_threshold must be in (0, 1]",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const DATA: &str =
        "[data]\nwatchlist = AAPL\nstart_date = 2023-01-01\nend_date = 2024-01-01\n";

    fn load(extra: &str) -> Result<FinbotConfig, FinbotError> {
        let adapter = FileConfigAdapter::from_string(&format!("{DATA}{extra}")).unwrap();
        FinbotConfig::from_port(&adapter)
    }

    fn invalid_key(extra: &str) -> String {
        match load(extra) {
            Err(FinbotError::InvalidConfiguration { key, .. }) => key,
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(load("").is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        assert_eq!(invalid_key("[engine]\ninitial_capital = 0\n"), "initial_capital");
        assert_eq!(invalid_key("[engine]\ninitial_capital = -100\n"), "initial_capital");
    }

    #[test]
    fn commission_negative_fails() {
        assert_eq!(invalid_key("[engine]\ncommission_rate = -0.001\n"), "commission_rate");
    }

    #[test]
    fn position_fraction_bounds() {
        assert_eq!(invalid_key("[engine]\nposition_fraction = 0\n"), "position_fraction");
        assert_eq!(invalid_key("[engine]\nposition_fraction = 1.5\n"), "position_fraction");
        assert!(load("[engine]\nposition_fraction = 1.0\n").is_ok());
    }

    #[test]
    fn stop_loss_negative_fails() {
        assert_eq!(invalid_key("[engine]\nstop_loss_pct = -0.02\n"), "stop_loss_pct");
    }

    #[test]
    fn accuracy_horizon_zero_fails() {
        assert_eq!(invalid_key("[engine]\naccuracy_horizon = 0\n"), "accuracy_horizon");
    }

    #[test]
    fn start_after_end_fails() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nwatchlist = AAPL\nstart_date = 2024-06-01\nend_date = 2024-01-01\n",
        )
        .unwrap();
        let err = FinbotConfig::from_port(&adapter).unwrap_err();
        assert!(
            matches!(err, FinbotError::InvalidConfiguration { key, .. } if key == "start_date")
        );
    }

    #[test]
    fn rsi_thresholds() {
        assert_eq!(invalid_key("[rsi]\noversold_threshold = -5\n"), "oversold_threshold");
        assert_eq!(
            invalid_key("[rsi]\noversold_threshold = 70\noverbought_threshold = 30\n"),
            "oversold_threshold"
        );
        assert_eq!(invalid_key("[rsi]\noverbought_threshold = 120\n"), "overbought_threshold");
    }

    #[test]
    fn macd_fast_must_be_below_slow() {
        assert_eq!(
            invalid_key("[macd]\nfast_period = 26\nslow_period = 12\n"),
            "fast_period"
        );
        assert_eq!(invalid_key("[macd]\nsignal_period = 0\n"), "signal_period");
    }

    #[test]
    fn bollinger_std_dev_positive() {
        assert_eq!(invalid_key("[bollinger]\nstd_dev = 0\n"), "std_dev");
    }

    #[test]
    fn ma_crossover_order() {
        assert_eq!(
            invalid_key("[ma_crossover]\nshort_period = 30\nlong_period = 10\n"),
            "short_period"
        );
    }

    #[test]
    fn volume_threshold_non_negative() {
        assert_eq!(invalid_key("[volume]\nthreshold = -1\n"), "threshold");
    }

    #[test]
    fn learned_model_thresholds() {
        assert_eq!(
            invalid_key("[learned_model]\nbuy_threshold = 0.3\nsell_threshold = 0.4\n"),
            "buy_threshold"
        );
        assert_eq!(invalid_key("[learned_model]\nhorizons = 2, 0\n"), "horizons");
        assert_eq!(invalid_key("[learned_model]\nmin_samples_split = 1\n"), "min_samples_split");
    }

    #[test]
    fn negative_weight_fails() {
        assert_eq!(invalid_key("[ensemble]\nmacd = -1.0\n"), "macd");
    }

    #[test]
    fn zero_total_weight_fails() {
        assert_eq!(
            invalid_key("[engine]\nstrategies = rsi, macd\n[ensemble]\nrsi = 0\nmacd = 0\n"),
            "weights"
        );
    }

    #[test]
    fn consensus_threshold_bounds() {
        assert_eq!(
            invalid_key("[ensemble]\nconsensus_threshold = 0\n"),
            "consensus_threshold"
        );
        assert_eq!(
            invalid_key("[ensemble]\nconsensus_threshold = 1.2\n"),
            "consensus_threshold"
        );
    }

    #[test]
    fn unknown_member_fails() {
        let err = load("[engine]\nstrategies = rsi, momentum\n").unwrap_err();
        assert!(matches!(err, FinbotError::UnknownStrategy(name) if name == "momentum"));
        let err = load("[engine]\nstrategies = composite\n").unwrap_err();
        assert!(matches!(err, FinbotError::UnknownStrategy(name) if name == "composite"));
    }

    #[test]
    fn duplicate_member_fails() {
        assert_eq!(invalid_key("[engine]\nstrategies = rsi, RSI\n"), "strategies");
    }
}
