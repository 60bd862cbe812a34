use configuration::AnalyticsConfig;
use core_types::TradeRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::metrics::{self, round};
use crate::patterns::UNSPECIFIED;
use crate::report::{
    BehavioralMetrics, MarketOutlook, Momentum, PatternSet, PerformanceMetrics, PredictiveInsights,
    StrategySuggestion,
};
use crate::window::pnls;

const HOT_WIN_RATE_PCT: Decimal = dec!(60);
const COLD_WIN_RATE_PCT: Decimal = dec!(40);
const MIN_SUCCESS_PCT: Decimal = dec!(5);
const MAX_SUCCESS_PCT: Decimal = dec!(95);

/// Everything a warning rule may look at.
pub struct WarningContext<'a> {
    pub performance: &'a PerformanceMetrics,
    pub behavior: &'a BehavioralMetrics,
    pub config: &'a AnalyticsConfig,
    pub recent_win_rate_pct: Decimal,
    pub trailing_losses: usize,
}

/// A risk warning: fires whenever `applies` holds. All matching rules fire.
pub struct WarningRule {
    pub applies: fn(&WarningContext<'_>) -> bool,
    pub message: fn(&WarningContext<'_>) -> String,
}

pub static WARNING_RULES: &[WarningRule] = &[
    WarningRule {
        applies: |c| c.performance.max_drawdown_pct > c.config.high_drawdown_pct,
        message: |c| {
            format!(
                "Maximum drawdown of {}% exceeds the {}% risk threshold; consider reducing position size.",
                c.performance.max_drawdown_pct, c.config.high_drawdown_pct
            )
        },
    },
    WarningRule {
        applies: |c| c.recent_win_rate_pct < c.config.low_win_rate_pct,
        message: |c| {
            format!(
                "Recent win rate has dropped to {}%; review your last trades before adding risk.",
                c.recent_win_rate_pct
            )
        },
    },
    WarningRule {
        applies: |c| c.behavior.revenge_trading_risk > dec!(50),
        message: |c| {
            format!(
                "{} trades look like revenge trades: larger positions taken soon after a loss.",
                c.behavior.revenge_trades
            )
        },
    },
    WarningRule {
        applies: |c| c.behavior.overtrading_risk > dec!(50),
        message: |c| {
            format!(
                "Averaging {} trades per active day points to overtrading.",
                c.behavior.trades_per_active_day
            )
        },
    },
    WarningRule {
        applies: |c| c.trailing_losses >= 3,
        message: |c| format!("You are on a {}-trade losing streak; consider pausing.", c.trailing_losses),
    },
];

/// Forward-looking estimates built on top of the performance, behaviour and pattern outputs.
#[derive(Debug, Clone, Copy)]
pub struct PredictiveGenerator<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> PredictiveGenerator<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    /// `recent` is the tail of the analysis window used for momentum and outlook.
    pub fn generate(
        &self,
        performance: &PerformanceMetrics,
        behavior: &BehavioralMetrics,
        patterns: &PatternSet,
        recent: &[&TradeRecord],
    ) -> PredictiveInsights {
        let recent_pnls = pnls(recent);
        let recent_win_rate_pct = metrics::pct_of(
            recent_pnls.iter().filter(|p| **p > Decimal::ZERO).count(),
            recent_pnls.len(),
        );
        let momentum = momentum(recent_win_rate_pct);

        let kelly_fraction_pct = self.kelly_fraction_pct(performance);
        let optimal_position_size_pct = kelly_fraction_pct
            .max(self.config.kelly_floor_pct)
            .min(self.config.kelly_cap_pct);

        let context = WarningContext {
            performance,
            behavior,
            config: self.config,
            recent_win_rate_pct: round(recent_win_rate_pct),
            trailing_losses: metrics::trailing_losses(&recent_pnls),
        };
        let risk_warnings = WARNING_RULES
            .iter()
            .filter(|rule| (rule.applies)(&context))
            .map(|rule| (rule.message)(&context))
            .collect();

        PredictiveInsights {
            recent_trades: recent.len(),
            recent_win_rate_pct: round(recent_win_rate_pct),
            momentum,
            next_trade_success_pct: round(next_trade_success(performance.win_rate_pct, momentum)),
            kelly_fraction_pct: round(kelly_fraction_pct),
            optimal_position_size_pct: round(optimal_position_size_pct),
            suggested_strategies: self.suggest_strategies(patterns),
            risk_warnings,
            market_outlook: outlook(recent_win_rate_pct),
        }
    }

    /// Kelly criterion `f* = (p*b - q) / b` in percent of capital.
    ///
    /// With no winners the edge is undefined and the floor applies; with no losers
    /// the payoff ratio is unbounded and `f*` tends to `p`.
    fn kelly_fraction_pct(&self, performance: &PerformanceMetrics) -> Decimal {
        if performance.average_win.is_zero() {
            return self.config.kelly_floor_pct;
        }
        let p = performance.win_rate_pct / Decimal::ONE_HUNDRED;
        let q = Decimal::ONE - p;
        let fraction = match metrics::ratio(performance.average_win, performance.average_loss) {
            Some(b) => (p * b - q) / b,
            None => p,
        };
        fraction * Decimal::ONE_HUNDRED
    }

    fn suggest_strategies(&self, patterns: &PatternSet) -> Vec<StrategySuggestion> {
        let mut candidates: Vec<_> = patterns
            .by_strategy
            .iter()
            .filter(|g| g.eligible && g.key != UNSPECIFIED)
            .collect();
        candidates.sort_by(|a, b| {
            b.win_rate_pct
                .cmp(&a.win_rate_pct)
                .then(b.average_pnl.cmp(&a.average_pnl))
                .then(a.key.cmp(&b.key))
        });
        candidates
            .into_iter()
            .take(self.config.max_suggestions)
            .map(|g| StrategySuggestion {
                strategy: g.key.clone(),
                trades: g.trades,
                win_rate_pct: g.win_rate_pct,
                average_pnl: g.average_pnl,
            })
            .collect()
    }
}

fn momentum(recent_win_rate_pct: Decimal) -> Momentum {
    if recent_win_rate_pct > HOT_WIN_RATE_PCT {
        Momentum::Improving
    } else if recent_win_rate_pct < COLD_WIN_RATE_PCT {
        Momentum::Declining
    } else {
        Momentum::Steady
    }
}

fn next_trade_success(base_win_rate_pct: Decimal, momentum: Momentum) -> Decimal {
    let multiplier = match momentum {
        Momentum::Improving => dec!(1.1),
        Momentum::Declining => dec!(0.9),
        Momentum::Steady => Decimal::ONE,
    };
    (base_win_rate_pct * multiplier).max(MIN_SUCCESS_PCT).min(MAX_SUCCESS_PCT)
}

fn outlook(recent_win_rate_pct: Decimal) -> MarketOutlook {
    if recent_win_rate_pct > HOT_WIN_RATE_PCT {
        MarketOutlook::Positive
    } else if recent_win_rate_pct < COLD_WIN_RATE_PCT {
        MarketOutlook::Cautious
    } else {
        MarketOutlook::Neutral
    }
}
