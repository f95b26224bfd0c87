//! Typed engine configuration built once from a [`ConfigPort`].
//!
//! Sections: `[engine]`, `[data]`, `[rsi]`, `[macd]`, `[bollinger]`,
//! `[ma_crossover]`, `[volume]`, `[learned_model]`, `[ensemble]`. Missing
//! keys take the defaults of the corresponding domain config.

use chrono::NaiveDate;

use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::validate_config;
use crate::domain::error::FinbotError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::features::FeatureConfig;
use crate::domain::metrics::EvaluationConfig;
use crate::domain::model::ForestConfig;
use crate::domain::ohlcv::BarSize;
use crate::domain::strategy::{
    BOLLINGER, BollingerConfig, BollingerStrategy, COMPOSITE, Composite, CompositeConfig,
    LEARNED_MODEL, LearnedModelConfig, LearnedModelStrategy, MA_CROSSOVER, MACD, MEMBER_NAMES,
    MaCrossoverConfig, MaCrossoverStrategy, MacdConfig, MacdStrategy, RSI, RsiConfig, RsiStrategy,
    Strategy, VOLUME, VolumeConfig, VolumeStrategy,
};
use crate::domain::watchlist::Watchlist;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub watchlist: Watchlist,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bar_size: BarSize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinbotConfig {
    pub data: DataConfig,
    pub backtest: BacktestConfig,
    pub evaluation: EvaluationConfig,
    pub rsi: RsiConfig,
    pub macd: MacdConfig,
    pub bollinger: BollingerConfig,
    pub ma_crossover: MaCrossoverConfig,
    pub volume: VolumeConfig,
    pub learned_model: LearnedModelConfig,
    pub ensemble: CompositeConfig,
    /// Enabled member strategies, in evaluation order.
    pub members: Vec<String>,
}

impl FinbotConfig {
    /// Reads and validates every section. Invalid values are fatal here.
    pub fn from_port(port: &dyn ConfigPort) -> Result<Self, FinbotError> {
        let config = FinbotConfig {
            data: build_data_config(port)?,
            backtest: build_backtest_config(port)?,
            evaluation: build_evaluation_config(port)?,
            rsi: build_rsi_config(port)?,
            macd: build_macd_config(port)?,
            bollinger: build_bollinger_config(port)?,
            ma_crossover: build_ma_crossover_config(port)?,
            volume: build_volume_config(port)?,
            learned_model: build_learned_model_config(port)?,
            ensemble: build_ensemble_config(port),
            members: build_member_list(port),
        };
        validate_config(&config)?;
        Ok(config)
    }

    /// Builds one strategy by name; `composite` builds the full ensemble.
    pub fn build_strategy(&self, name: &str) -> Result<Strategy, FinbotError> {
        let strategy = match name {
            RSI => Strategy::Rsi(RsiStrategy::new(self.rsi.clone())),
            MACD => Strategy::Macd(MacdStrategy::new(self.macd.clone())),
            BOLLINGER => Strategy::Bollinger(BollingerStrategy::new(self.bollinger.clone())),
            MA_CROSSOVER => {
                Strategy::MaCrossover(MaCrossoverStrategy::new(self.ma_crossover.clone()))
            }
            VOLUME => Strategy::Volume(VolumeStrategy::new(self.volume.clone())),
            LEARNED_MODEL => Strategy::LearnedModel(Box::new(LearnedModelStrategy::new(
                self.learned_model.clone(),
            ))),
            COMPOSITE => Strategy::Composite(self.composite()?),
            other => return Err(FinbotError::UnknownStrategy(other.to_string())),
        };
        Ok(strategy)
    }

    pub fn member_strategies(&self) -> Result<Vec<Strategy>, FinbotError> {
        self.members
            .iter()
            .map(|name| {
                if !is_member_name(name) {
                    return Err(FinbotError::UnknownStrategy(name.clone()));
                }
                self.build_strategy(name)
            })
            .collect()
    }

    pub fn composite(&self) -> Result<Composite, FinbotError> {
        Ok(Composite::from_members(
            self.member_strategies()?,
            &self.ensemble,
        ))
    }

    /// Every enabled member followed by the composite.
    pub fn all_strategies(&self) -> Result<Vec<Strategy>, FinbotError> {
        let mut strategies = self.member_strategies()?;
        strategies.push(Strategy::Composite(self.composite()?));
        Ok(strategies)
    }

    /// Sum of ensemble weights over the enabled members.
    pub fn total_member_weight(&self) -> f64 {
        self.members
            .iter()
            .map(|name| self.ensemble.weight_for(name))
            .sum()
    }
}

fn get_usize(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, FinbotError> {
    let value = port.get_int(section, key, default as i64);
    usize::try_from(value)
        .map_err(|_| FinbotError::invalid(section, key, format!("{key} must be non-negative")))
}

fn parse_date(port: &dyn ConfigPort, key: &str) -> Result<NaiveDate, FinbotError> {
    let raw = port
        .get_string("data", key)
        .ok_or_else(|| FinbotError::ConfigMissing {
            section: "data".into(),
            key: key.into(),
        })?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| FinbotError::invalid("data", key, "invalid date format (expected YYYY-MM-DD)"))
}

pub fn build_data_config(port: &dyn ConfigPort) -> Result<DataConfig, FinbotError> {
    let raw = port
        .get_string("data", "watchlist")
        .ok_or_else(|| FinbotError::ConfigMissing {
            section: "data".into(),
            key: "watchlist".into(),
        })?;
    let watchlist =
        Watchlist::parse(&raw).map_err(|e| FinbotError::invalid("data", "watchlist", e.to_string()))?;

    let bar_size = match port.get_string("data", "bar_size") {
        Some(s) => s
            .parse::<BarSize>()
            .map_err(|e| FinbotError::invalid("data", "bar_size", e))?,
        None => BarSize::default(),
    };

    Ok(DataConfig {
        watchlist,
        start: parse_date(port, "start_date")?,
        end: parse_date(port, "end_date")?,
        bar_size,
    })
}

pub fn build_backtest_config(port: &dyn ConfigPort) -> Result<BacktestConfig, FinbotError> {
    let defaults = BacktestConfig::default();
    let exec = ExecutionConfig::default();
    Ok(BacktestConfig {
        initial_capital: port.get_double("engine", "initial_capital", defaults.initial_capital),
        execution: ExecutionConfig {
            commission_rate: port.get_double("engine", "commission_rate", exec.commission_rate),
            position_fraction: port.get_double(
                "engine",
                "position_fraction",
                exec.position_fraction,
            ),
            stop_loss_pct: port.get_double("engine", "stop_loss_pct", exec.stop_loss_pct),
        },
        warmup_bars: get_usize(port, "engine", "warmup_bars", defaults.warmup_bars)?,
        retrain_interval: get_usize(port, "engine", "retrain_interval", defaults.retrain_interval)?,
    })
}

pub fn build_evaluation_config(port: &dyn ConfigPort) -> Result<EvaluationConfig, FinbotError> {
    let defaults = EvaluationConfig::default();
    Ok(EvaluationConfig {
        accuracy_horizon: get_usize(port, "engine", "accuracy_horizon", defaults.accuracy_horizon)?,
        periods_per_year: port.get_double("engine", "periods_per_year", defaults.periods_per_year),
        risk_free_rate: port.get_double("engine", "risk_free_rate", defaults.risk_free_rate),
    })
}

pub fn build_rsi_config(port: &dyn ConfigPort) -> Result<RsiConfig, FinbotError> {
    let d = RsiConfig::default();
    Ok(RsiConfig {
        period: get_usize(port, "rsi", "period", d.period)?,
        oversold_threshold: port.get_double("rsi", "oversold_threshold", d.oversold_threshold),
        overbought_threshold: port.get_double("rsi", "overbought_threshold", d.overbought_threshold),
    })
}

pub fn build_macd_config(port: &dyn ConfigPort) -> Result<MacdConfig, FinbotError> {
    let d = MacdConfig::default();
    Ok(MacdConfig {
        fast_period: get_usize(port, "macd", "fast_period", d.fast_period)?,
        slow_period: get_usize(port, "macd", "slow_period", d.slow_period)?,
        signal_period: get_usize(port, "macd", "signal_period", d.signal_period)?,
    })
}

pub fn build_bollinger_config(port: &dyn ConfigPort) -> Result<BollingerConfig, FinbotError> {
    let d = BollingerConfig::default();
    Ok(BollingerConfig {
        period: get_usize(port, "bollinger", "period", d.period)?,
        std_dev: port.get_double("bollinger", "std_dev", d.std_dev),
    })
}

pub fn build_ma_crossover_config(port: &dyn ConfigPort) -> Result<MaCrossoverConfig, FinbotError> {
    let d = MaCrossoverConfig::default();
    Ok(MaCrossoverConfig {
        short_period: get_usize(port, "ma_crossover", "short_period", d.short_period)?,
        long_period: get_usize(port, "ma_crossover", "long_period", d.long_period)?,
    })
}

pub fn build_volume_config(port: &dyn ConfigPort) -> Result<VolumeConfig, FinbotError> {
    let d = VolumeConfig::default();
    Ok(VolumeConfig {
        period: get_usize(port, "volume", "period", d.period)?,
        threshold: port.get_double("volume", "threshold", d.threshold),
    })
}

pub fn build_learned_model_config(port: &dyn ConfigPort) -> Result<LearnedModelConfig, FinbotError> {
    const S: &str = "learned_model";
    let d = LearnedModelConfig::default();

    let horizons = match port.get_list(S, "horizons") {
        Some(items) => items
            .iter()
            .map(|h| {
                h.parse::<usize>().map_err(|_| {
                    FinbotError::invalid(S, "horizons", format!("'{h}' is not a whole number"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => d.features.horizons.clone(),
    };

    Ok(LearnedModelConfig {
        forest: ForestConfig {
            n_estimators: get_usize(port, S, "n_estimators", d.forest.n_estimators)?,
            max_depth: get_usize(port, S, "max_depth", d.forest.max_depth)?,
            min_samples_split: get_usize(port, S, "min_samples_split", d.forest.min_samples_split)?,
            min_samples_leaf: get_usize(port, S, "min_samples_leaf", d.forest.min_samples_leaf)?,
            seed: get_usize(port, S, "seed", d.forest.seed as usize)? as u64,
        },
        features: FeatureConfig {
            horizons,
            rsi_period: get_usize(port, S, "rsi_period", d.features.rsi_period)?,
        },
        buy_threshold: port.get_double(S, "buy_threshold", d.buy_threshold),
        sell_threshold: port.get_double(S, "sell_threshold", d.sell_threshold),
        rsi_boost_below: port.get_double(S, "rsi_boost_below", d.rsi_boost_below),
        rsi_boost_factor: port.get_double(S, "rsi_boost_factor", d.rsi_boost_factor),
        min_training_samples: get_usize(port, S, "min_training_samples", d.min_training_samples)?,
    })
}

/// `[ensemble]`: `consensus_threshold` plus one weight per member name.
pub fn build_ensemble_config(port: &dyn ConfigPort) -> CompositeConfig {
    let mut config = CompositeConfig::default();
    config.consensus_threshold =
        port.get_double("ensemble", "consensus_threshold", config.consensus_threshold);
    for name in MEMBER_NAMES {
        let current = config.weight_for(name);
        config
            .weights
            .insert(name.to_string(), port.get_double("ensemble", name, current));
    }
    config
}

/// `[engine] strategies`, lower-cased; every member when absent.
pub fn build_member_list(port: &dyn ConfigPort) -> Vec<String> {
    match port.get_list("engine", "strategies") {
        Some(names) => names.into_iter().map(|n| n.to_lowercase()).collect(),
        None => MEMBER_NAMES.iter().map(|n| n.to_string()).collect(),
    }
}

/// True for names that can sit inside the ensemble.
pub fn is_member_name(name: &str) -> bool {
    MEMBER_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const MINIMAL: &str = "[data]\nwatchlist = aapl,msft\nstart_date = 2023-01-01\nend_date = 2024-01-01\n";

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = FinbotConfig::from_port(&make_config(MINIMAL)).unwrap();
        assert_eq!(config.data.watchlist.instruments(), ["AAPL", "MSFT"]);
        assert_eq!(config.data.bar_size, BarSize::Day);
        assert_eq!(config.backtest, BacktestConfig::default());
        assert_eq!(config.rsi, RsiConfig::default());
        assert_eq!(config.learned_model, LearnedModelConfig::default());
        assert_eq!(config.members.len(), 6);
        assert_eq!(config.ensemble, CompositeConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let content = format!(
            "{MINIMAL}bar_size = 1m\n\
             [engine]\ninitial_capital = 5000\nstop_loss_pct = 0.05\nstrategies = RSI, macd\nretrain_interval = 20\n\
             [rsi]\noversold_threshold = 25\n\
             [learned_model]\nhorizons = 2, 5, 60\nn_estimators = 50\n\
             [ensemble]\nconsensus_threshold = 0.7\nmacd = 2.0\n"
        );
        let config = FinbotConfig::from_port(&make_config(&content)).unwrap();
        assert_eq!(config.data.bar_size, BarSize::Minute);
        assert_eq!(config.backtest.initial_capital, 5000.0);
        assert_eq!(config.backtest.execution.stop_loss_pct, 0.05);
        assert_eq!(config.backtest.retrain_interval, 20);
        assert_eq!(config.members, vec!["rsi", "macd"]);
        assert_eq!(config.rsi.oversold_threshold, 25.0);
        assert_eq!(config.learned_model.features.horizons, vec![2, 5, 60]);
        assert_eq!(config.learned_model.forest.n_estimators, 50);
        assert_eq!(config.ensemble.consensus_threshold, 0.7);
        assert_eq!(config.ensemble.weight_for("macd"), 2.0);
        assert_eq!(config.total_member_weight(), 3.0);
    }

    #[test]
    fn missing_watchlist_fails() {
        let err = FinbotConfig::from_port(&make_config(
            "[data]\nstart_date = 2023-01-01\nend_date = 2024-01-01\n",
        ))
        .unwrap_err();
        assert!(matches!(err, FinbotError::ConfigMissing { key, .. } if key == "watchlist"));
    }

    #[test]
    fn bad_date_fails() {
        let err = FinbotConfig::from_port(&make_config(
            "[data]\nwatchlist = AAPL\nstart_date = 2023/01/01\nend_date = 2024-01-01\n",
        ))
        .unwrap_err();
        assert!(
            matches!(err, FinbotError::InvalidConfiguration { key, .. } if key == "start_date")
        );
    }

    #[test]
    fn negative_period_fails() {
        let content = format!("{MINIMAL}[rsi]\nperiod = -3\n");
        let err = FinbotConfig::from_port(&make_config(&content)).unwrap_err();
        assert!(matches!(err, FinbotError::InvalidConfiguration { section, .. } if section == "rsi"));
    }

    #[test]
    fn bad_horizon_fails() {
        let content = format!("{MINIMAL}[learned_model]\nhorizons = 2, five\n");
        let err = FinbotConfig::from_port(&make_config(&content)).unwrap_err();
        assert!(
            matches!(err, FinbotError::InvalidConfiguration { key, .. } if key == "horizons")
        );
    }

    #[test]
    fn build_strategy_by_name() {
        let config = FinbotConfig::from_port(&make_config(MINIMAL)).unwrap();
        assert_eq!(config.build_strategy("volume").unwrap().name(), "volume");
        let composite = config.build_strategy("composite").unwrap();
        match composite {
            Strategy::Composite(c) => assert_eq!(c.members().len(), 6),
            other => panic!("expected composite, got {}", other.name()),
        }
        assert!(matches!(
            config.build_strategy("momentum"),
            Err(FinbotError::UnknownStrategy(name)) if name == "momentum"
        ));
    }

    #[test]
    fn all_strategies_end_with_composite() {
        let content = format!("{MINIMAL}[engine]\nstrategies = rsi,volume\n");
        let config = FinbotConfig::from_port(&make_config(&content)).unwrap();
        let names: Vec<&str> = config
            .all_strategies()
            .unwrap()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, vec!["rsi", "volume", "composite"]);
    }
}
