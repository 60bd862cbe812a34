use configuration::AnalyticsConfig;
use core_types::TradeRecord;
use rust_decimal::Decimal;
use std::time::Duration;

use crate::metrics::{self, round};
use crate::report::{PerformanceMetrics, Ratio};
use crate::window::pnls;

/// A stateless calculator for risk/return metrics over closed trades.
#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    daily_risk_free_rate: Decimal,
}

impl PerformanceAnalyzer {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            daily_risk_free_rate: config.daily_risk_free_rate(),
        }
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// `trades` must be closed and in chronological order. An empty slice yields
    /// the all-zero default report.
    pub fn analyze(&self, trades: &[&TradeRecord]) -> PerformanceMetrics {
        let mut report = PerformanceMetrics::default();
        if trades.is_empty() {
            return report;
        }

        let returns = pnls(trades);
        self.calculate_profitability(&returns, &mut report);
        self.calculate_drawdown(&returns, &mut report);
        self.calculate_ratios(&returns, &mut report);
        self.calculate_time_metrics(trades, &mut report);
        report
    }

    /// Counts, gross figures, averages, profit factor and expectancy.
    fn calculate_profitability(&self, returns: &[Decimal], report: &mut PerformanceMetrics) {
        let n = returns.len();
        let wins: Vec<Decimal> = returns.iter().copied().filter(|r| *r > Decimal::ZERO).collect();
        let losses: Vec<Decimal> = returns.iter().copied().filter(|r| *r < Decimal::ZERO).collect();

        report.total_trades = n;
        report.winning_trades = wins.len();
        report.losing_trades = losses.len();
        report.break_even_trades = n - wins.len() - losses.len();

        let gross_profit = metrics::sum(&wins);
        let gross_loss = metrics::sum(&losses).abs();
        let average_win = metrics::mean(&wins);
        let average_loss = metrics::mean(&losses).abs();

        report.total_pnl = round(metrics::sum(returns));
        report.gross_profit = round(gross_profit);
        report.gross_loss = round(gross_loss);
        report.average_win = round(average_win);
        report.average_loss = round(average_loss);
        report.largest_win = wins.iter().copied().max().unwrap_or(Decimal::ZERO);
        report.largest_loss = losses.iter().copied().min().unwrap_or(Decimal::ZERO).abs();

        report.win_loss_ratio = round(metrics::ratio(average_win, average_loss).unwrap_or(Decimal::ZERO));
        report.profit_factor = match metrics::ratio(gross_profit, gross_loss) {
            Some(pf) => Ratio::Finite(round(pf)),
            None if gross_profit > Decimal::ZERO => Ratio::Unbounded,
            None => Ratio::Finite(Decimal::ZERO),
        };

        let win_rate = Decimal::from(wins.len()) / Decimal::from(n);
        report.win_rate_pct = round(win_rate * Decimal::ONE_HUNDRED);
        report.expectancy = round(win_rate * average_win - (Decimal::ONE - win_rate) * average_loss);

        let (max_wins, max_losses) = metrics::longest_streaks(returns);
        report.max_consecutive_wins = max_wins;
        report.max_consecutive_losses = max_losses;
    }

    /// Maximum drawdown over the cumulative P&L curve.
    fn calculate_drawdown(&self, returns: &[Decimal], report: &mut PerformanceMetrics) {
        let drawdown = metrics::drawdown(returns);
        report.max_drawdown = round(drawdown.max_drawdown);
        report.max_drawdown_pct = round(drawdown.max_drawdown_pct);
    }

    /// Sharpe, Calmar, volatility and consistency.
    fn calculate_ratios(&self, returns: &[Decimal], report: &mut PerformanceMetrics) {
        let mean = metrics::mean(returns);
        let std_dev = metrics::std_dev(returns);

        report.volatility = round(std_dev);

        // Per-trade Sharpe with the daily risk-free hurdle; undefined spread reads as 0.
        report.sharpe_ratio = round(
            metrics::ratio(mean - self.daily_risk_free_rate, std_dev).unwrap_or(Decimal::ZERO),
        );

        report.calmar_ratio = round(
            metrics::ratio(metrics::sum(returns), report.max_drawdown_pct).unwrap_or(Decimal::ZERO),
        );

        report.consistency = if std_dev.is_zero() {
            Decimal::ONE_HUNDRED
        } else {
            match metrics::ratio(std_dev, mean.abs()) {
                Some(cv) => round(metrics::clamp_pct(Decimal::ONE_HUNDRED - metrics::pct(cv))),
                None => Decimal::ZERO,
            }
        };
    }

    fn calculate_time_metrics(&self, trades: &[&TradeRecord], report: &mut PerformanceMetrics) {
        let held: Vec<i64> = trades
            .iter()
            .filter_map(|t| t.holding_period())
            .map(|d| d.num_seconds().max(0))
            .collect();
        if held.is_empty() {
            return;
        }
        let avg_secs = held.iter().sum::<i64>() / held.len() as i64;
        report.average_holding_period = Duration::from_secs(avg_secs.unsigned_abs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::fixtures::{refs, series};
    use rust_decimal_macros::dec;

    fn analyze(pnls: &[Decimal]) -> PerformanceMetrics {
        let records = series(pnls);
        PerformanceAnalyzer::new(&AnalyticsConfig::default()).analyze(&refs(&records))
    }

    #[test]
    fn empty_window_is_all_zero() {
        let report = PerformanceAnalyzer::new(&AnalyticsConfig::default()).analyze(&[]);
        assert_eq!(report, PerformanceMetrics::default());
        assert_eq!(report.profit_factor, Ratio::Finite(Decimal::ZERO));
    }

    #[test]
    fn three_trade_scenario() {
        let report = analyze(&[dec!(100), dec!(-50), dec!(100)]);

        assert_eq!(report.total_trades, 3);
        assert_eq!(report.win_rate_pct, dec!(66.6667));
        assert_eq!(report.average_win, dec!(100));
        assert_eq!(report.average_loss, dec!(50));
        assert_eq!(report.win_loss_ratio, dec!(2));
        assert_eq!(report.profit_factor, Ratio::Finite(dec!(4)));
        assert_eq!(report.total_pnl, dec!(150));
        // 2/3 * 100 - 1/3 * 50
        assert_eq!(report.expectancy, dec!(50));
        assert_eq!(report.max_drawdown, dec!(50));
        assert_eq!(report.max_drawdown_pct, dec!(50));
        assert_eq!(report.calmar_ratio, dec!(3));
    }

    #[test]
    fn single_loss_is_full_drawdown() {
        let report = analyze(&[dec!(-100)]);
        assert_eq!(report.max_drawdown, dec!(100));
        assert_eq!(report.max_drawdown_pct, dec!(100));
        assert_eq!(report.losing_trades, 1);
        assert_eq!(report.profit_factor, Ratio::Finite(Decimal::ZERO));
    }

    #[test]
    fn identical_returns_have_zero_sharpe_and_full_consistency() {
        let report = analyze(&[dec!(40), dec!(40), dec!(40), dec!(40)]);
        assert_eq!(report.sharpe_ratio, Decimal::ZERO);
        assert_eq!(report.volatility, Decimal::ZERO);
        assert_eq!(report.consistency, dec!(100));
    }

    #[test]
    fn no_losses_gives_unbounded_profit_factor() {
        let report = analyze(&[dec!(10), dec!(20)]);
        assert_eq!(report.profit_factor, Ratio::Unbounded);
        assert_eq!(report.win_loss_ratio, Decimal::ZERO);
        assert_eq!(report.max_drawdown, Decimal::ZERO);
        assert_eq!(report.calmar_ratio, Decimal::ZERO);
    }

    #[test]
    fn counts_partition_the_window() {
        let report = analyze(&[dec!(5), dec!(0), dec!(-3), dec!(0), dec!(8), dec!(-1)]);
        assert_eq!(report.winning_trades, 2);
        assert_eq!(report.losing_trades, 2);
        assert_eq!(report.break_even_trades, 2);
        assert_eq!(
            report.winning_trades + report.losing_trades + report.break_even_trades,
            report.total_trades
        );
    }

    #[test]
    fn sharpe_subtracts_daily_risk_free_rate() {
        // mean 15, population std dev 5, hurdle 0.06 / 252
        let report = analyze(&[dec!(10), dec!(20)]);
        let expected = round((dec!(15) - dec!(0.06) / dec!(252)) / dec!(5));
        assert_eq!(report.sharpe_ratio, expected);
        // cv = 5 / 15 -> 100 - 33.33
        assert_eq!(report.consistency, dec!(66.6667));
    }

    #[test]
    fn zero_mean_with_spread_has_zero_consistency() {
        let report = analyze(&[dec!(10), dec!(-10)]);
        assert_eq!(report.consistency, Decimal::ZERO);
    }

    #[test]
    fn extremes_and_streaks() {
        let report = analyze(&[dec!(5), dec!(7), dec!(-2), dec!(-9), dec!(-1), dec!(3)]);
        assert_eq!(report.largest_win, dec!(7));
        assert_eq!(report.largest_loss, dec!(9));
        assert_eq!(report.max_consecutive_wins, 2);
        assert_eq!(report.max_consecutive_losses, 3);
        assert_eq!(report.average_holding_period, Duration::from_secs(30 * 60));
    }
}
