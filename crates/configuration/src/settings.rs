use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analytics: AnalyticsConfig,
    pub logging: Logging,
}

/// Tunables for the Trading Analytics Engine.
///
/// Every field has a default, so a user can omit the `[analytics]` section
/// (or any key inside it) from their toml and still get sensible behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Minimum number of closed trades before any aggregate metric is reported.
    pub min_trades_for_analysis: usize,
    /// Minimum trades a pattern group needs to be considered for best/worst selection.
    pub min_group_sample: usize,
    /// Confidence rating (1-10) at or above which a trade counts as "high confidence".
    pub high_confidence_threshold: u8,
    /// Annual risk-free rate as a fraction (0.06 = 6%).
    pub annual_risk_free_rate: Decimal,
    pub trading_days_per_year: u32,
    /// Lower bound of the recommended position size, in percent of capital.
    pub kelly_floor_pct: Decimal,
    /// Upper bound of the recommended position size, in percent of capital.
    pub kelly_cap_pct: Decimal,
    /// Trades per active day at which overtrading risk starts to rise.
    pub overtrading_low_per_day: Decimal,
    /// Trades per active day at which overtrading risk saturates at 100.
    pub overtrading_high_per_day: Decimal,
    /// Number of most recent trades used for momentum and outlook.
    pub recency_window: usize,
    /// Size increase over the losing trade, in percent, that marks a revenge trade.
    pub revenge_size_increase_pct: Decimal,
    /// Maximum gap between a loss's exit and the next entry for a revenge trade.
    pub revenge_window_minutes: i64,
    /// Multiplier applied to the flagged-pair ratio to obtain the revenge risk score.
    pub revenge_risk_multiplier: Decimal,
    /// Risk assumed for trades without a stop-loss, in percent of entry price.
    pub default_risk_pct: Decimal,
    /// Average risk below which a trader is classified as conservative.
    pub conservative_risk_pct: Decimal,
    /// Average risk below which a trader is classified as moderate.
    pub moderate_risk_pct: Decimal,
    /// Drawdown percentage above which a risk warning is raised.
    pub high_drawdown_pct: Decimal,
    /// Recent win rate (percent) below which a risk warning is raised.
    pub low_win_rate_pct: Decimal,
    /// Number of strategies suggested by the predictive stage.
    pub max_suggestions: usize,
    /// Run the performance, behaviour and pattern stages on the rayon pool.
    pub parallel_stages: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_trades_for_analysis: 3,
            min_group_sample: 2,
            high_confidence_threshold: 8,
            annual_risk_free_rate: dec!(0.06),
            trading_days_per_year: 252,
            kelly_floor_pct: dec!(1),
            kelly_cap_pct: dec!(25),
            overtrading_low_per_day: dec!(5),
            overtrading_high_per_day: dec!(10),
            recency_window: 20,
            revenge_size_increase_pct: dec!(20),
            revenge_window_minutes: 60,
            revenge_risk_multiplier: dec!(200),
            default_risk_pct: dec!(5),
            conservative_risk_pct: dec!(2),
            moderate_risk_pct: dec!(5),
            high_drawdown_pct: dec!(20),
            low_win_rate_pct: dec!(40),
            max_suggestions: 3,
            parallel_stages: true,
        }
    }
}

impl AnalyticsConfig {
    /// The per-trade risk-free hurdle used by the Sharpe ratio.
    pub fn daily_risk_free_rate(&self) -> Decimal {
        self.annual_risk_free_rate / Decimal::from(self.trading_days_per_year)
    }

    /// Rejects settings that would make the engine's formulas meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));
        let hundred = dec!(100);

        if self.min_trades_for_analysis == 0 {
            return invalid("min_trades_for_analysis must be at least 1");
        }
        if self.min_group_sample == 0 {
            return invalid("min_group_sample must be at least 1");
        }
        if !(1..=10).contains(&self.high_confidence_threshold) {
            return invalid("high_confidence_threshold must be between 1 and 10");
        }
        if self.trading_days_per_year == 0 {
            return invalid("trading_days_per_year must be greater than 0");
        }
        if self.annual_risk_free_rate < Decimal::ZERO || self.annual_risk_free_rate >= Decimal::ONE {
            return invalid("annual_risk_free_rate must be a fraction between 0 and 1");
        }
        if self.kelly_floor_pct < Decimal::ZERO
            || self.kelly_floor_pct > self.kelly_cap_pct
            || self.kelly_cap_pct > hundred
        {
            return invalid("kelly bounds must satisfy 0 <= kelly_floor_pct <= kelly_cap_pct <= 100");
        }
        if self.overtrading_low_per_day < Decimal::ZERO
            || self.overtrading_low_per_day >= self.overtrading_high_per_day
        {
            return invalid("overtrading_low_per_day must be non-negative and below overtrading_high_per_day");
        }
        if self.recency_window == 0 {
            return invalid("recency_window must be at least 1");
        }
        if self.revenge_size_increase_pct < Decimal::ZERO || self.revenge_window_minutes <= 0 {
            return invalid("revenge thresholds must be positive");
        }
        if self.revenge_risk_multiplier <= Decimal::ZERO {
            return invalid("revenge_risk_multiplier must be greater than 0");
        }
        if self.default_risk_pct <= Decimal::ZERO || self.default_risk_pct > hundred {
            return invalid("default_risk_pct must be within (0, 100]");
        }
        if self.conservative_risk_pct <= Decimal::ZERO
            || self.conservative_risk_pct >= self.moderate_risk_pct
        {
            return invalid("conservative_risk_pct must be positive and below moderate_risk_pct");
        }
        for (name, value) in [
            ("high_drawdown_pct", self.high_drawdown_pct),
            ("low_win_rate_pct", self.low_win_rate_pct),
        ] {
            if value < Decimal::ZERO || value > hundred {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a percentage between 0 and 100"
                )));
            }
        }
        Ok(())
    }
}

/// Output format for the fmt subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

/// Contains parameters for the tracing subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Default filter directive, e.g. "info" or "analytics=debug". `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs go to a daily-rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directory: None,
            file_prefix: "tradelens.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_group_sample, 2);
        assert_eq!(config.kelly_cap_pct, dec!(25));
        assert_eq!(config.recency_window, 20);
    }

    #[test]
    fn daily_risk_free_rate_divides_by_trading_days() {
        let config = AnalyticsConfig {
            annual_risk_free_rate: dec!(0.0504),
            trading_days_per_year: 252,
            ..Default::default()
        };
        assert_eq!(config.daily_risk_free_rate(), dec!(0.0002));
    }

    #[test]
    fn inverted_overtrading_thresholds_are_rejected() {
        let config = AnalyticsConfig {
            overtrading_low_per_day: dec!(10),
            overtrading_high_per_day: dec!(5),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn kelly_cap_above_hundred_is_rejected() {
        let config = AnalyticsConfig {
            kelly_cap_pct: dec!(150),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_recency_window_is_rejected() {
        let config = AnalyticsConfig {
            recency_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
