//! Stateless numeric primitives shared by every analyzer.
//!
//! All functions operate on `Decimal` and never panic on empty input or a zero
//! denominator; degenerate cases resolve to zero or `None`.

use rust_decimal::prelude::*;

/// Decimal places kept on every derived metric in a report.
pub const REPORT_DP: u32 = 4;

pub fn sum(values: &[Decimal]) -> Decimal {
    values.iter().fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
}

pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    sum(values) / Decimal::from(values.len())
}

/// Sum of squared deviations from `mean`, or `None` if a square overflows.
fn squared_deviations(values: &[Decimal], mean: Decimal) -> Option<Decimal> {
    values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let deviation = v.checked_sub(mean)?;
        acc.checked_add(deviation.checked_mul(deviation)?)
    })
}

/// Population variance: the mean of squared deviations from the mean.
/// Saturates at `Decimal::MAX` when the squares do not fit.
pub fn population_variance(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    squared_deviations(values, mean(values))
        .map(|total| total / Decimal::from(values.len()))
        .unwrap_or(Decimal::MAX)
}

pub fn std_dev(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let m = mean(values);
    let n = Decimal::from(values.len());
    if let Some(total) = squared_deviations(values, m) {
        return (total / n).sqrt().unwrap_or(Decimal::ZERO);
    }

    // Deviations scaled into [-1, 1] square without overflow.
    let scale = values
        .iter()
        .map(|v| v.saturating_sub(m).abs())
        .max()
        .unwrap_or(Decimal::ZERO);
    if scale.is_zero() {
        return Decimal::ZERO;
    }
    let scaled = values.iter().fold(Decimal::ZERO, |acc, v| {
        let d = v.saturating_sub(m) / scale;
        acc + d * d
    });
    (scaled / n).sqrt().unwrap_or(Decimal::ZERO).saturating_mul(scale)
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// `part / total` expressed as a percentage; 0 when `total` is 0.
pub fn pct_of(part: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) / Decimal::from(total) * Decimal::ONE_HUNDRED
}

/// Expresses a fraction as a percentage, saturating instead of overflowing.
pub fn pct(fraction: Decimal) -> Decimal {
    fraction.saturating_mul(Decimal::ONE_HUNDRED)
}

pub fn clamp_pct(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE_HUNDRED)
}

/// Rounds to `REPORT_DP` places and strips trailing zeros.
pub fn round(value: Decimal) -> Decimal {
    value.round_dp(REPORT_DP).normalize()
}

/// Running cumulative P&L, starting from a flat account.
pub fn equity_curve(pnls: &[Decimal]) -> Vec<Decimal> {
    pnls.iter()
        .scan(Decimal::ZERO, |equity, pnl| {
            *equity = equity.saturating_add(*pnl);
            Some(*equity)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Drawdown {
    /// Largest peak-to-trough decline, in currency.
    pub max_drawdown: Decimal,
    /// The running peak in force when the largest decline was reached.
    pub peak_at_max: Decimal,
    /// `max_drawdown` relative to `peak_at_max`, in percent, clamped to [0, 100].
    pub max_drawdown_pct: Decimal,
}

/// Walks the equity curve of `pnls` tracking the running peak, which starts at zero.
///
/// A decline that was never preceded by a positive peak is reported as a 100%
/// drawdown, since the account lost everything it had gained (nothing) and more.
pub fn drawdown(pnls: &[Decimal]) -> Drawdown {
    let mut peak = Decimal::ZERO;
    let mut result = Drawdown::default();

    for equity in equity_curve(pnls) {
        if equity > peak {
            peak = equity;
        }
        let decline = peak.saturating_sub(equity);
        if decline > result.max_drawdown {
            result.max_drawdown = decline;
            result.peak_at_max = peak;
        }
    }

    result.max_drawdown_pct = if result.max_drawdown.is_zero() {
        Decimal::ZERO
    } else if result.peak_at_max <= Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        ratio(result.max_drawdown, result.peak_at_max)
            .map(|r| clamp_pct(pct(r)))
            .unwrap_or(Decimal::ONE_HUNDRED)
    };
    result
}

/// Longest runs of consecutive wins and consecutive losses. Break-even trades end both runs.
pub fn longest_streaks(pnls: &[Decimal]) -> (usize, usize) {
    let (mut wins, mut losses) = (0usize, 0usize);
    let (mut max_wins, mut max_losses) = (0usize, 0usize);
    for pnl in pnls {
        if *pnl > Decimal::ZERO {
            wins += 1;
            losses = 0;
        } else if *pnl < Decimal::ZERO {
            losses += 1;
            wins = 0;
        } else {
            wins = 0;
            losses = 0;
        }
        max_wins = max_wins.max(wins);
        max_losses = max_losses.max(losses);
    }
    (max_wins, max_losses)
}

/// Number of consecutive losing trades at the end of the sequence.
pub fn trailing_losses(pnls: &[Decimal]) -> usize {
    pnls.iter().rev().take_while(|p| **p < Decimal::ZERO).count()
}
