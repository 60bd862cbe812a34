use chrono::Duration;
use configuration::AnalyticsConfig;
use core_types::TradeRecord;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::metrics::{self, clamp_pct, pct, round};
use crate::report::{BehavioralMetrics, EmotionTrend, RiskTolerance};
use crate::window::pnl;

/// Derives psychological and discipline scores from journaled trades.
///
/// Every score is computable with no optional metadata at all; missing
/// confidence, emotion or stop-loss data produces the neutral value.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorAnalyzer<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> BehaviorAnalyzer<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, trades: &[&TradeRecord]) -> BehavioralMetrics {
        if trades.is_empty() {
            return BehavioralMetrics::default();
        }

        let (revenge_trades, revenge_trading_risk) = self.revenge_trading(trades);
        let trades_per_active_day = trades_per_active_day(trades);
        let average_risk_pct = self.average_risk_pct(trades);

        BehavioralMetrics {
            overconfidence_score: round(self.overconfidence(trades)),
            fear_greed_index: round(fear_greed_index(trades)),
            discipline_score: round(metrics::pct_of(
                trades.iter().filter(|t| t.stop_loss.is_some()).count(),
                trades.len(),
            )),
            overtrading_risk: round(self.overtrading_risk(trades_per_active_day)),
            trades_per_active_day: round(trades_per_active_day),
            revenge_trading_risk: round(revenge_trading_risk),
            revenge_trades,
            emotional_trends: emotion_trends(trades, |t| t.pre_emotion.as_deref()),
            post_trade_emotions: emotion_trends(trades, |t| t.post_emotion.as_deref()),
            average_risk_pct: round(average_risk_pct),
            risk_tolerance: self.classify_risk(average_risk_pct),
        }
    }

    /// How far the win rate of high-confidence trades falls short of the overall win rate.
    fn overconfidence(&self, trades: &[&TradeRecord]) -> Decimal {
        let confident: Vec<&TradeRecord> = trades
            .iter()
            .copied()
            .filter(|t| t.confidence.is_some_and(|c| c >= self.config.high_confidence_threshold))
            .collect();
        if confident.is_empty() {
            return Decimal::ZERO;
        }

        let overall = win_fraction(trades);
        let confident_rate = win_fraction(&confident);
        clamp_pct((overall - confident_rate) * Decimal::ONE_HUNDRED)
    }

    /// Linear ramp between the low and high trades-per-day thresholds.
    fn overtrading_risk(&self, per_day: Decimal) -> Decimal {
        let low = self.config.overtrading_low_per_day;
        let high = self.config.overtrading_high_per_day;
        let scaled = metrics::ratio(per_day - low, high - low).unwrap_or(Decimal::ZERO);
        clamp_pct(pct(scaled))
    }

    /// Flags a trade that follows a loss within the revenge window at a markedly larger size.
    fn revenge_trading(&self, trades: &[&TradeRecord]) -> (usize, Decimal) {
        if trades.len() < 2 {
            return (0, Decimal::ZERO);
        }

        let size_factor = Decimal::ONE + self.config.revenge_size_increase_pct / Decimal::ONE_HUNDRED;
        let window = Duration::minutes(self.config.revenge_window_minutes);

        let flagged = trades
            .windows(2)
            .filter(|pair| {
                let (loss, next) = (pair[0], pair[1]);
                let Some(exit) = loss.exit_time else {
                    return false;
                };
                let gap = next.entry_time - exit;
                pnl(loss) < Decimal::ZERO
                    && next.notional() > loss.notional().saturating_mul(size_factor)
                    && gap >= Duration::zero()
                    && gap <= window
            })
            .count();

        let pairs = Decimal::from(trades.len() - 1);
        let risk = Decimal::from(flagged) / pairs * self.config.revenge_risk_multiplier;
        (flagged, clamp_pct(risk))
    }

    /// Mean per-trade risk as a percentage of entry price, each capped at 100.
    fn average_risk_pct(&self, trades: &[&TradeRecord]) -> Decimal {
        let risks: Vec<Decimal> = trades
            .iter()
            .map(|t| match t.stop_loss {
                Some(stop) => metrics::ratio((t.entry_price - stop).abs(), t.entry_price)
                    .map(|r| clamp_pct(pct(r)))
                    .unwrap_or(self.config.default_risk_pct),
                None => self.config.default_risk_pct,
            })
            .collect();
        metrics::mean(&risks)
    }

    fn classify_risk(&self, average_risk_pct: Decimal) -> RiskTolerance {
        if average_risk_pct < self.config.conservative_risk_pct {
            RiskTolerance::Conservative
        } else if average_risk_pct < self.config.moderate_risk_pct {
            RiskTolerance::Moderate
        } else {
            RiskTolerance::Aggressive
        }
    }
}

fn win_fraction(trades: &[&TradeRecord]) -> Decimal {
    metrics::pct_of(trades.iter().filter(|t| pnl(t) > Decimal::ZERO).count(), trades.len())
        / Decimal::ONE_HUNDRED
}

/// Dispersion of position notional relative to its mean, capped at 100.
fn fear_greed_index(trades: &[&TradeRecord]) -> Decimal {
    let sizes: Vec<Decimal> = trades.iter().map(|t| t.notional()).collect();
    let mean = metrics::mean(&sizes);
    if mean <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    metrics::ratio(metrics::std_dev(&sizes), mean)
        .map(pct)
        .unwrap_or(Decimal::ZERO)
        .min(Decimal::ONE_HUNDRED)
}

/// Trades per distinct (UTC) calendar day on which a trade was entered.
fn trades_per_active_day(trades: &[&TradeRecord]) -> Decimal {
    let days: BTreeSet<_> = trades.iter().map(|t| t.entry_time.date_naive()).collect();
    metrics::ratio(Decimal::from(trades.len()), Decimal::from(days.len())).unwrap_or(Decimal::ZERO)
}

/// Groups trades by a normalised emotion label; unlabelled trades are skipped.
fn emotion_trends<F>(trades: &[&TradeRecord], label: F) -> Vec<EmotionTrend>
where
    F: Fn(&TradeRecord) -> Option<&str>,
{
    let mut groups: BTreeMap<String, Vec<Decimal>> = BTreeMap::new();
    for trade in trades {
        let Some(emotion) = label(*trade).map(|e| e.trim().to_lowercase()) else {
            continue;
        };
        if emotion.is_empty() {
            continue;
        }
        groups.entry(emotion).or_default().push(pnl(trade));
    }

    let mut trends: Vec<EmotionTrend> = groups
        .into_iter()
        .map(|(emotion, outcomes)| EmotionTrend {
            trades: outcomes.len(),
            win_rate_pct: round(metrics::pct_of(
                outcomes.iter().filter(|p| **p > Decimal::ZERO).count(),
                outcomes.len(),
            )),
            average_pnl: round(metrics::mean(&outcomes)),
            emotion,
        })
        .collect();
    // Stable sort keeps the alphabetical order among equal counts.
    trends.sort_by(|a, b| b.trades.cmp(&a.trades));
    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::fixtures::{at, closed, refs, series};
    use core_types::Direction;
    use rust_decimal_macros::dec;

    fn analyze(records: &[TradeRecord]) -> BehavioralMetrics {
        let config = AnalyticsConfig::default();
        BehaviorAnalyzer::new(&config).analyze(&refs(records))
    }

    #[test]
    fn bare_records_produce_neutral_scores() {
        let metrics = analyze(&series(&[dec!(10), dec!(-5), dec!(3)]));
        assert_eq!(metrics.overconfidence_score, Decimal::ZERO);
        assert_eq!(metrics.fear_greed_index, Decimal::ZERO);
        assert_eq!(metrics.discipline_score, Decimal::ZERO);
        assert_eq!(metrics.overtrading_risk, Decimal::ZERO);
        assert!(metrics.emotional_trends.is_empty());
        // No stops: every trade assumes the default 5% risk.
        assert_eq!(metrics.average_risk_pct, dec!(5));
        assert_eq!(metrics.risk_tolerance, RiskTolerance::Aggressive);
    }

    #[test]
    fn confident_losers_raise_overconfidence() {
        let mut records = series(&[dec!(10), dec!(10), dec!(-5), dec!(-5)]);
        records[2] = records[2].clone().with_confidence(9);
        records[3] = records[3].clone().with_confidence(8);
        records[0] = records[0].clone().with_confidence(3);

        // overall 50%, high-confidence 0%
        assert_eq!(analyze(&records).overconfidence_score, dec!(50));
    }

    #[test]
    fn calibrated_confidence_scores_zero() {
        let mut records = series(&[dec!(10), dec!(-5)]);
        records[0] = records[0].clone().with_confidence(10);
        assert_eq!(analyze(&records).overconfidence_score, Decimal::ZERO);
    }

    #[test]
    fn discipline_and_risk_tolerance_follow_stops() {
        let mut records = series(&[dec!(1), dec!(1), dec!(1), dec!(1)]);
        for record in records.iter_mut() {
            // entry 10, stop 9.9 -> 1% risk
            *record = record.clone().with_stop_loss(dec!(9.9));
        }
        let metrics = analyze(&records);
        assert_eq!(metrics.discipline_score, dec!(100));
        assert_eq!(metrics.average_risk_pct, dec!(1));
        assert_eq!(metrics.risk_tolerance, RiskTolerance::Conservative);
    }

    #[test]
    fn moderate_stops_classify_as_moderate() {
        let records: Vec<TradeRecord> = series(&[dec!(1), dec!(-1), dec!(1)])
            .into_iter()
            // entry 10, stop 9.7 -> 3% risk
            .map(|r| r.with_stop_loss(dec!(9.7)))
            .collect();
        let metrics = analyze(&records);
        assert_eq!(metrics.average_risk_pct, dec!(3));
        assert_eq!(metrics.risk_tolerance, RiskTolerance::Moderate);
    }

    #[test]
    fn stop_far_beyond_entry_caps_risk_at_one_hundred() {
        let records: Vec<TradeRecord> = series(&[dec!(-25), dec!(-25), dec!(-25)])
            .into_iter()
            .map(|mut r| {
                r.direction = Direction::Short;
                r.with_stop_loss(dec!(35))
            })
            .collect();
        let metrics = analyze(&records);
        assert_eq!(metrics.average_risk_pct, dec!(100));
        assert_eq!(metrics.risk_tolerance, RiskTolerance::Aggressive);
    }

    #[test]
    fn huge_notionals_do_not_overflow() {
        let mut records = series(&[dec!(1), dec!(2), dec!(3)]);
        records[0].quantity = dec!(50000000000000);
        records[1].quantity = dec!(1);
        records[2].quantity = dec!(90000000000000);
        let metrics = analyze(&records);
        assert!(metrics.fear_greed_index > Decimal::ZERO);
        assert!(metrics.fear_greed_index <= dec!(100));
    }

    #[test]
    fn uneven_sizing_raises_fear_greed() {
        let mut records = series(&[dec!(1), dec!(1)]);
        records[1].quantity = dec!(3);
        // notionals 10 and 30: mean 20, std dev 10
        assert_eq!(analyze(&records).fear_greed_index, dec!(50));
    }

    #[test]
    fn overtrading_ramps_between_thresholds() {
        let records: Vec<TradeRecord> = (0..15).map(|i| closed(dec!(1), at(2, 9, i * 2))).collect();
        let metrics = analyze(&records);
        // 15 trades on one day: (15 - 5) / (10 - 5) saturates
        assert_eq!(metrics.trades_per_active_day, dec!(15));
        assert_eq!(metrics.overtrading_risk, dec!(100));

        let records: Vec<TradeRecord> = (0..7).map(|i| closed(dec!(1), at(2, 9, i * 2))).collect();
        assert_eq!(analyze(&records).overtrading_risk, dec!(40));
    }

    #[test]
    fn larger_trade_soon_after_loss_is_revenge() {
        let loss = closed(dec!(-20), at(3, 10, 0));
        let mut revenge = closed(dec!(5), at(3, 10, 45));
        revenge.quantity = dec!(2);
        let mut calm = closed(dec!(5), at(3, 15, 0));
        calm.quantity = dec!(2);

        let metrics = analyze(&[loss, revenge, calm]);
        assert_eq!(metrics.revenge_trades, 1);
        // 1 of 2 pairs flagged * 200
        assert_eq!(metrics.revenge_trading_risk, dec!(100));
    }

    #[test]
    fn larger_trade_outside_window_is_not_revenge() {
        // Loss exits at 10:30; the next entry comes 90 minutes later.
        let loss = closed(dec!(-20), at(3, 10, 0));
        let mut later = closed(dec!(5), at(3, 12, 0));
        later.quantity = dec!(2);

        let metrics = analyze(&[loss, later]);
        assert_eq!(metrics.revenge_trades, 0);
        assert_eq!(metrics.revenge_trading_risk, Decimal::ZERO);
    }

    #[test]
    fn larger_trade_exactly_at_window_edge_is_revenge() {
        let loss = closed(dec!(-20), at(3, 10, 0));
        let mut edge = closed(dec!(5), at(3, 11, 30));
        edge.quantity = dec!(2);
        assert_eq!(analyze(&[loss, edge]).revenge_trades, 1);
    }

    #[test]
    fn overlapping_trade_is_not_revenge() {
        // Entered at 10:15 while the losing trade was still open until 10:30.
        let loss = closed(dec!(-20), at(3, 10, 0));
        let mut overlap = closed(dec!(5), at(3, 10, 15));
        overlap.quantity = dec!(3);
        assert_eq!(analyze(&[loss, overlap]).revenge_trades, 0);
    }

    #[test]
    fn same_size_after_loss_is_not_revenge() {
        let records = vec![closed(dec!(-20), at(3, 10, 0)), closed(dec!(5), at(3, 10, 40))];
        let metrics = analyze(&records);
        assert_eq!(metrics.revenge_trades, 0);
        assert_eq!(metrics.revenge_trading_risk, Decimal::ZERO);
    }

    #[test]
    fn emotions_group_case_insensitively() {
        let mut records = series(&[dec!(10), dec!(-30), dec!(20), dec!(-4)]);
        records[0] = records[0].clone().with_emotions("Calm", "satisfied");
        records[1] = records[1].clone().with_emotions("FOMO ", "regret");
        records[2] = records[2].clone().with_emotions("calm", "satisfied");
        records[3] = records[3].clone().with_emotions("fomo", "regret");

        let metrics = analyze(&records);
        assert_eq!(metrics.emotional_trends.len(), 2);
        let calm = &metrics.emotional_trends[0];
        assert_eq!(calm.emotion, "calm");
        assert_eq!(calm.trades, 2);
        assert_eq!(calm.average_pnl, dec!(15));
        assert_eq!(calm.win_rate_pct, dec!(100));
        let fomo = &metrics.emotional_trends[1];
        assert_eq!(fomo.average_pnl, dec!(-17));
        assert_eq!(metrics.post_trade_emotions[0].emotion, "regret");
    }
}
