//! Watchlist of instruments to analyze or backtest.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Watchlist {
    instruments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty instrument in watchlist")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),

    #[error("watchlist is empty")]
    Empty,
}

impl Watchlist {
    /// Parses a comma-separated list. Symbols are trimmed and upper-cased;
    /// order is kept.
    pub fn parse(input: &str) -> Result<Self, WatchlistError> {
        if input.trim().is_empty() {
            return Err(WatchlistError::Empty);
        }

        let mut instruments = Vec::new();
        let mut seen = HashSet::new();

        for token in input.split(',') {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                return Err(WatchlistError::EmptyToken);
            }
            let symbol = trimmed.to_uppercase();
            if !seen.insert(symbol.clone()) {
                return Err(WatchlistError::DuplicateInstrument(symbol));
            }
            instruments.push(symbol);
        }

        Ok(Self { instruments })
    }

    pub fn single(instrument: &str) -> Self {
        Self {
            instruments: vec![instrument.trim().to_uppercase()],
        }
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic() {
        let w = Watchlist::parse("AAPL,MSFT,GOOGL").unwrap();
        assert_eq!(w.instruments(), ["AAPL", "MSFT", "GOOGL"]);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn parse_trims_and_uppercases() {
        let w = Watchlist::parse("  aapl , Msft ,tsla").unwrap();
        assert_eq!(w.instruments(), ["AAPL", "MSFT", "TSLA"]);
    }

    #[test]
    fn parse_empty_token() {
        assert_eq!(
            Watchlist::parse("AAPL,,MSFT"),
            Err(WatchlistError::EmptyToken)
        );
    }

    #[test]
    fn parse_duplicate() {
        assert_eq!(
            Watchlist::parse("AAPL,msft,aapl"),
            Err(WatchlistError::DuplicateInstrument("AAPL".into()))
        );
    }

    #[test]
    fn parse_blank() {
        assert_eq!(Watchlist::parse("   "), Err(WatchlistError::Empty));
    }

    #[test]
    fn single_normalizes() {
        assert_eq!(Watchlist::single(" nvda ").instruments(), ["NVDA"]);
    }
}
