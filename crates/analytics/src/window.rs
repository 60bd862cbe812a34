use chrono::{DateTime, Duration, Utc};
use core_types::{RecordStatus, TradeRecord};
use rust_decimal::Decimal;

use crate::report::{ActivitySummary, DataQuality, IssueKind, RecordIssue};

/// The realized P&L of a closed record. Records in a window always carry one.
pub fn pnl(trade: &TradeRecord) -> Decimal {
    trade.profit_loss.unwrap_or(Decimal::ZERO)
}

/// The ordered set of closed trades every aggregate metric is computed over.
///
/// Built from the raw records as they stood at `as_of`: malformed records and
/// records entered or exited after `as_of` are excluded and reported as issues,
/// open positions are counted but not analysed.
#[derive(Debug, Clone)]
pub struct AnalysisWindow<'a> {
    trades: Vec<&'a TradeRecord>,
    total_records: usize,
    open_positions: usize,
    issues: Vec<RecordIssue>,
}

impl<'a> AnalysisWindow<'a> {
    pub fn build(records: &'a [TradeRecord], as_of: DateTime<Utc>) -> Self {
        let mut trades = Vec::with_capacity(records.len());
        let mut open_positions = 0;
        let mut issues = Vec::new();

        for record in records {
            match record.validate() {
                Err(e) => issues.push(RecordIssue {
                    record_id: record.id,
                    kind: IssueKind::Malformed,
                    reason: e.to_string(),
                }),
                Ok(_) if record.entry_time > as_of => issues.push(RecordIssue {
                    record_id: record.id,
                    kind: IssueKind::AfterAsOf,
                    reason: format!("entered at {} after as-of {}", record.entry_time, as_of),
                }),
                Ok(RecordStatus::Closed) => match record.exit_time {
                    Some(exit) if exit > as_of => issues.push(RecordIssue {
                        record_id: record.id,
                        kind: IssueKind::ExitAfterAsOf,
                        reason: format!("exited at {exit} after as-of {as_of}"),
                    }),
                    _ => trades.push(record),
                },
                Ok(RecordStatus::Open) => open_positions += 1,
            }
        }

        // Stable: trades entered at the same instant keep their input order.
        trades.sort_by_key(|t| t.entry_time);

        Self {
            trades,
            total_records: records.len(),
            open_positions,
            issues,
        }
    }

    pub fn trades(&self) -> &[&'a TradeRecord] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn issues(&self) -> &[RecordIssue] {
        &self.issues
    }

    pub fn open_positions(&self) -> usize {
        self.open_positions
    }

    /// The last `n` trades of the window (all of them if fewer exist).
    pub fn recent(&self, n: usize) -> &[&'a TradeRecord] {
        let start = self.trades.len().saturating_sub(n);
        &self.trades[start..]
    }

    pub fn data_quality(&self) -> DataQuality {
        DataQuality {
            total_records: self.total_records,
            closed_trades: self.trades.len(),
            open_positions: self.open_positions,
            issues: self.issues.clone(),
        }
    }

    pub fn activity(&self, as_of: DateTime<Utc>) -> ActivitySummary {
        let first_trade_at = self.trades.first().map(|t| t.entry_time);
        let last_exit_at = self.trades.iter().filter_map(|t| t.exit_time).max();
        let closed_within = |days: i64| {
            let since = as_of - Duration::days(days);
            self.trades
                .iter()
                .filter(|t| t.exit_time.is_some_and(|exit| exit > since))
                .count()
        };

        ActivitySummary {
            first_trade_at,
            last_exit_at,
            days_since_last_trade: last_exit_at.map(|exit| (as_of - exit).num_days()),
            trades_last_7_days: closed_within(7),
            trades_last_30_days: closed_within(30),
        }
    }
}

/// Extracts the realized P&L sequence of `trades` in order.
pub fn pnls(trades: &[&TradeRecord]) -> Vec<Decimal> {
    trades.iter().map(|t| pnl(t)).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use core_types::{Direction, TradeRecord};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    /// A closed long trade held for 30 minutes.
    pub fn closed(pnl: Decimal, entry_time: DateTime<Utc>) -> TradeRecord {
        TradeRecord::open("AAPL", Direction::Long, dec!(10), dec!(1), entry_time).closed_at(
            dec!(10) + pnl,
            entry_time + Duration::minutes(30),
            pnl,
        )
    }

    /// Closed trades entered at 10:00 on consecutive days of May 2024.
    pub fn series(pnls: &[Decimal]) -> Vec<TradeRecord> {
        pnls.iter()
            .enumerate()
            .map(|(i, p)| closed(*p, at(1 + i as u32 % 28, 10, 0)))
            .collect()
    }

    pub fn refs(records: &[TradeRecord]) -> Vec<&TradeRecord> {
        records.iter().collect()
    }
}
