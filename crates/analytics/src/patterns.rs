use chrono::{Datelike, Timelike, Weekday};
use configuration::AnalyticsConfig;
use core_types::TradeRecord;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::metrics::{self, round};
use crate::report::{GroupStats, MarketConditionBreakdown, PatternSet};
use crate::window::pnl;

/// Label used for trades with no value for a grouping key.
pub const UNSPECIFIED: &str = "unspecified";

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    trades: usize,
    wins: usize,
    total_pnl: Decimal,
}

impl Tally {
    fn add(&mut self, trade: &TradeRecord) {
        let outcome = pnl(trade);
        self.trades += 1;
        self.total_pnl += outcome;
        if outcome > Decimal::ZERO {
            self.wins += 1;
        }
    }

    fn into_stats(self, key: String, window_size: usize, min_sample: usize) -> GroupStats {
        GroupStats {
            key,
            trades: self.trades,
            wins: self.wins,
            win_rate_pct: round(metrics::pct_of(self.wins, self.trades)),
            total_pnl: round(self.total_pnl),
            average_pnl: round(
                metrics::ratio(self.total_pnl, Decimal::from(self.trades)).unwrap_or(Decimal::ZERO),
            ),
            share_pct: round(metrics::pct_of(self.trades, window_size)),
            eligible: self.trades >= min_sample,
        }
    }
}

/// Coarse market regime derived from a free-form label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketRegime {
    Bullish,
    Bearish,
    Sideways,
}

impl MarketRegime {
    pub fn classify(label: Option<&str>) -> Self {
        let label = label.unwrap_or_default().to_lowercase();
        if label.contains("bull") {
            MarketRegime::Bullish
        } else if label.contains("bear") {
            MarketRegime::Bearish
        } else {
            MarketRegime::Sideways
        }
    }
}

/// Groups trades along several independent dimensions and reports per-group outcomes.
#[derive(Debug, Clone, Copy)]
pub struct PatternRecognizer<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> PatternRecognizer<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn recognize(&self, trades: &[&TradeRecord]) -> PatternSet {
        let by_strategy = self.group_by_label(trades, |t| t.strategy.as_deref());
        let by_hour_of_day = self.group_by_hour(trades);

        PatternSet {
            best_strategy: best_of(&by_strategy),
            worst_strategy: worst_of(&by_strategy),
            best_hour: best_of(&by_hour_of_day),
            worst_hour: worst_of(&by_hour_of_day),
            by_market_condition: self.group_by_regime(trades),
            by_setup: self.group_by_label(trades, |t| t.setup.as_deref()),
            by_weekday: self.group_by_weekday(trades),
            by_symbol: self.group_by_label(trades, |t| Some(t.symbol.as_str())),
            by_strategy,
            by_hour_of_day,
        }
    }

    fn group_by_label<F>(&self, trades: &[&TradeRecord], label: F) -> Vec<GroupStats>
    where
        F: Fn(&TradeRecord) -> Option<&str>,
    {
        let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
        for trade in trades {
            let key = match label(*trade).map(str::trim) {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => UNSPECIFIED.to_string(),
            };
            tallies.entry(key).or_default().add(trade);
        }

        let mut groups = self.finish(tallies, trades.len());
        groups.sort_by(|a, b| b.trades.cmp(&a.trades));
        groups
    }

    fn group_by_hour(&self, trades: &[&TradeRecord]) -> Vec<GroupStats> {
        let mut tallies: BTreeMap<u32, Tally> = BTreeMap::new();
        for trade in trades {
            tallies.entry(trade.entry_time.hour()).or_default().add(trade);
        }
        self.finish(
            tallies.into_iter().map(|(hour, tally)| (format!("{hour:02}:00"), tally)),
            trades.len(),
        )
    }

    fn group_by_weekday(&self, trades: &[&TradeRecord]) -> Vec<GroupStats> {
        let mut tallies: BTreeMap<u32, (Weekday, Tally)> = BTreeMap::new();
        for trade in trades {
            let day = trade.entry_time.weekday();
            tallies
                .entry(day.num_days_from_monday())
                .or_insert((day, Tally::default()))
                .1
                .add(trade);
        }
        self.finish(
            tallies.into_values().map(|(day, tally)| (day.to_string(), tally)),
            trades.len(),
        )
    }

    fn group_by_regime(&self, trades: &[&TradeRecord]) -> MarketConditionBreakdown {
        let (mut bullish, mut bearish, mut sideways) = (Tally::default(), Tally::default(), Tally::default());
        for trade in trades {
            match MarketRegime::classify(trade.market_condition.as_deref()) {
                MarketRegime::Bullish => bullish.add(trade),
                MarketRegime::Bearish => bearish.add(trade),
                MarketRegime::Sideways => sideways.add(trade),
            }
        }

        let n = trades.len();
        let min = self.config.min_group_sample;
        MarketConditionBreakdown {
            bullish: bullish.into_stats("bullish".to_string(), n, min),
            bearish: bearish.into_stats("bearish".to_string(), n, min),
            sideways: sideways.into_stats("sideways".to_string(), n, min),
        }
    }

    fn finish<I>(&self, tallies: I, window_size: usize) -> Vec<GroupStats>
    where
        I: IntoIterator<Item = (String, Tally)>,
    {
        tallies
            .into_iter()
            .map(|(key, tally)| tally.into_stats(key, window_size, self.config.min_group_sample))
            .collect()
    }
}

/// Orders groups by win rate, then average P&L.
fn rank(a: &GroupStats, b: &GroupStats) -> Ordering {
    a.win_rate_pct
        .cmp(&b.win_rate_pct)
        .then(a.average_pnl.cmp(&b.average_pnl))
}

fn best_of(groups: &[GroupStats]) -> Option<String> {
    groups
        .iter()
        .filter(|g| g.eligible)
        // Equal ranks resolve to the alphabetically first key.
        .max_by(|a, b| rank(a, b).then_with(|| b.key.cmp(&a.key)))
        .map(|g| g.key.clone())
}

/// The weakest eligible group; needs at least two eligible groups to be meaningful.
fn worst_of(groups: &[GroupStats]) -> Option<String> {
    let eligible: Vec<&GroupStats> = groups.iter().filter(|g| g.eligible).collect();
    if eligible.len() < 2 {
        return None;
    }
    eligible
        .into_iter()
        .min_by(|a, b| rank(a, b).then_with(|| a.key.cmp(&b.key)))
        .map(|g| g.key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::fixtures::{at, closed, refs, series};
    use rust_decimal_macros::dec;

    fn recognize(records: &[TradeRecord]) -> PatternSet {
        let config = AnalyticsConfig::default();
        PatternRecognizer::new(&config).recognize(&refs(records))
    }

    #[test]
    fn unlabelled_trades_form_one_unspecified_group() {
        let patterns = recognize(&series(&[dec!(1), dec!(-1), dec!(2)]));
        assert_eq!(patterns.by_strategy.len(), 1);
        let group = &patterns.by_strategy[0];
        assert_eq!(group.key, UNSPECIFIED);
        assert_eq!(group.trades, 3);
        assert_eq!(group.share_pct, dec!(100));
        assert_eq!(patterns.best_strategy.as_deref(), Some(UNSPECIFIED));
        assert_eq!(patterns.worst_strategy, None);
    }

    #[test]
    fn strategies_are_ranked_only_when_eligible() {
        let records = vec![
            closed(dec!(10), at(1, 9, 0)).with_strategy("breakout"),
            closed(dec!(12), at(2, 9, 0)).with_strategy("breakout"),
            closed(dec!(-5), at(3, 9, 0)).with_strategy("pullback"),
            closed(dec!(4), at(4, 9, 0)).with_strategy("pullback"),
            closed(dec!(50), at(5, 9, 0)).with_strategy("news"),
        ];
        let patterns = recognize(&records);

        assert_eq!(patterns.by_strategy.len(), 3);
        let news = patterns.by_strategy.iter().find(|g| g.key == "news").unwrap();
        assert!(!news.eligible);
        assert_eq!(patterns.best_strategy.as_deref(), Some("breakout"));
        assert_eq!(patterns.worst_strategy.as_deref(), Some("pullback"));
    }

    #[test]
    fn market_condition_buckets_by_substring() {
        let records = vec![
            closed(dec!(3), at(1, 9, 0)).with_market_condition("Strong Bull trend"),
            closed(dec!(-3), at(2, 9, 0)).with_market_condition("bearish"),
            closed(dec!(1), at(3, 9, 0)).with_market_condition("choppy"),
            closed(dec!(1), at(4, 9, 0)),
        ];
        let breakdown = recognize(&records).by_market_condition;
        assert_eq!(breakdown.bullish.trades, 1);
        assert_eq!(breakdown.bearish.trades, 1);
        assert_eq!(breakdown.bearish.win_rate_pct, Decimal::ZERO);
        assert_eq!(breakdown.sideways.trades, 2);
        assert!(breakdown.sideways.eligible);
    }

    #[test]
    fn hours_are_ordered_and_labelled() {
        let records = vec![
            closed(dec!(5), at(1, 15, 10)),
            closed(dec!(-2), at(2, 9, 35)),
            closed(dec!(7), at(3, 15, 45)),
            closed(dec!(-1), at(4, 9, 5)),
        ];
        let patterns = recognize(&records);
        let keys: Vec<&str> = patterns.by_hour_of_day.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["09:00", "15:00"]);
        assert_eq!(patterns.best_hour.as_deref(), Some("15:00"));
        assert_eq!(patterns.worst_hour.as_deref(), Some("09:00"));
    }

    #[test]
    fn weekdays_follow_calendar_order() {
        // 2024-05-06 is a Monday, 2024-05-01 a Wednesday.
        let records = vec![closed(dec!(1), at(6, 9, 0)), closed(dec!(1), at(1, 9, 0))];
        let patterns = recognize(&records);
        let keys: Vec<&str> = patterns.by_weekday.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Mon", "Wed"]);
    }

    #[test]
    fn blank_setup_is_unspecified() {
        let records = vec![
            closed(dec!(1), at(1, 9, 0)).with_setup("  "),
            closed(dec!(1), at(2, 9, 0)).with_setup("flag"),
            closed(dec!(1), at(3, 9, 0)).with_setup("flag "),
        ];
        let patterns = recognize(&records);
        assert_eq!(patterns.by_setup[0].key, "flag");
        assert_eq!(patterns.by_setup[0].trades, 2);
        assert_eq!(patterns.by_setup[1].key, UNSPECIFIED);
    }

    #[test]
    fn empty_window_reports_empty_groups() {
        let patterns = recognize(&[]);
        assert!(patterns.by_strategy.is_empty());
        assert_eq!(patterns.by_market_condition.sideways.trades, 0);
        assert_eq!(patterns.best_strategy, None);
    }
}
