use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::AnalyticsError;

/// A ratio that may legitimately be unbounded, e.g. a profit factor with no losses.
///
/// Serializes as `{"finite": "1.5"}` or `"unbounded"`, never as a float infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ratio {
    Finite(Decimal),
    Unbounded,
}

impl Ratio {
    pub fn finite(&self) -> Option<Decimal> {
        match self {
            Ratio::Finite(value) => Some(*value),
            Ratio::Unbounded => None,
        }
    }

    /// True when the ratio is strictly greater than `threshold`. Unbounded exceeds everything.
    pub fn exceeds(&self, threshold: Decimal) -> bool {
        self.finite().is_none_or(|value| value > threshold)
    }

    /// True when the ratio is finite and strictly below `threshold`.
    pub fn below(&self, threshold: Decimal) -> bool {
        self.finite().is_some_and(|value| value < threshold)
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Ratio::Finite(Decimal::ZERO)
    }
}

/// A stage output, or an explicit marker that too few closed trades were available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Insight<T> {
    Available(T),
    InsufficientData { required: usize, available: usize },
}

impl<T> Insight<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Insight::Available(value) => Some(value),
            Insight::InsufficientData { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Insight::Available(_))
    }

    /// Converts the marker into an `AnalyticsError::NotEnoughData` for callers that
    /// cannot proceed without the value.
    pub fn as_result(&self) -> Result<&T, AnalyticsError> {
        match self {
            Insight::Available(value) => Ok(value),
            Insight::InsufficientData { required, available } => Err(AnalyticsError::NotEnoughData(
                format!("{available} closed trades available, {required} required"),
            )),
        }
    }
}

// ==============================================================================
// Performance
// ==============================================================================

/// Risk/return metrics over the closed trades of the analysis window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // I. Trade counts
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub break_even_trades: usize,
    pub win_rate_pct: Decimal,

    // II. Profitability
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub win_loss_ratio: Decimal,
    pub profit_factor: Ratio,
    pub expectancy: Decimal,

    // III. Risk and drawdown
    pub sharpe_ratio: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    pub calmar_ratio: Decimal,
    pub volatility: Decimal,
    pub consistency: Decimal,

    // IV. Sequencing and time
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    #[serde(with = "humantime_serde")]
    pub average_holding_period: Duration,
}

// ==============================================================================
// Behaviour
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

/// Outcome statistics for trades sharing one emotion label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionTrend {
    pub emotion: String,
    pub trades: usize,
    pub win_rate_pct: Decimal,
    pub average_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BehavioralMetrics {
    pub overconfidence_score: Decimal,
    pub fear_greed_index: Decimal,
    pub discipline_score: Decimal,
    pub overtrading_risk: Decimal,
    pub trades_per_active_day: Decimal,
    pub revenge_trading_risk: Decimal,
    pub revenge_trades: usize,
    pub emotional_trends: Vec<EmotionTrend>,
    pub post_trade_emotions: Vec<EmotionTrend>,
    pub average_risk_pct: Decimal,
    pub risk_tolerance: RiskTolerance,
}

// ==============================================================================
// Patterns
// ==============================================================================

/// Per-group statistics produced by the pattern recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub trades: usize,
    pub wins: usize,
    pub win_rate_pct: Decimal,
    pub total_pnl: Decimal,
    pub average_pnl: Decimal,
    /// Share of the analysis window that falls in this group.
    pub share_pct: Decimal,
    /// Whether the group has enough samples to compete for best/worst.
    pub eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConditionBreakdown {
    pub bullish: GroupStats,
    pub bearish: GroupStats,
    pub sideways: GroupStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    pub by_strategy: Vec<GroupStats>,
    pub by_market_condition: MarketConditionBreakdown,
    pub by_hour_of_day: Vec<GroupStats>,
    pub by_setup: Vec<GroupStats>,
    pub by_weekday: Vec<GroupStats>,
    pub by_symbol: Vec<GroupStats>,
    pub best_strategy: Option<String>,
    pub worst_strategy: Option<String>,
    pub best_hour: Option<String>,
    pub worst_hour: Option<String>,
}

// ==============================================================================
// Predictions
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketOutlook {
    Positive,
    Cautious,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Momentum {
    Improving,
    Steady,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySuggestion {
    pub strategy: String,
    pub trades: usize,
    pub win_rate_pct: Decimal,
    pub average_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveInsights {
    pub recent_trades: usize,
    pub recent_win_rate_pct: Decimal,
    pub momentum: Momentum,
    pub next_trade_success_pct: Decimal,
    /// The raw Kelly fraction in percent; may be negative or above the cap.
    pub kelly_fraction_pct: Decimal,
    /// Kelly fraction clamped to the configured floor and cap.
    pub optimal_position_size_pct: Decimal,
    pub suggested_strategies: Vec<StrategySuggestion>,
    pub risk_warnings: Vec<String>,
    pub market_outlook: MarketOutlook,
}

// ==============================================================================
// Coaching
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
    Strength,
    Weakness,
    ImprovementArea,
    PersonalizedTip,
    MentalGame,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoachingNotes {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub personalized_tips: Vec<String>,
    pub mental_game_advice: Vec<String>,
}

impl CoachingNotes {
    pub fn push(&mut self, category: NoteCategory, message: String) {
        let list = match category {
            NoteCategory::Strength => &mut self.strengths,
            NoteCategory::Weakness => &mut self.weaknesses,
            NoteCategory::ImprovementArea => &mut self.improvement_areas,
            NoteCategory::PersonalizedTip => &mut self.personalized_tips,
            NoteCategory::MentalGame => &mut self.mental_game_advice,
        };
        list.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.improvement_areas.is_empty()
            && self.personalized_tips.is_empty()
            && self.mental_game_advice.is_empty()
    }
}

// ==============================================================================
// Report
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The record violates a structural invariant.
    Malformed,
    /// The record was entered after the as-of instant.
    AfterAsOf,
    /// The record was closed after the as-of instant, so its outcome was not yet known.
    ExitAfterAsOf,
}

/// A non-fatal warning about a record that was left out of the analysis window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIssue {
    pub record_id: Uuid,
    pub kind: IssueKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataQuality {
    pub total_records: usize,
    pub closed_trades: usize,
    pub open_positions: usize,
    pub issues: Vec<RecordIssue>,
}

/// Recency of trading activity relative to the as-of instant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub first_trade_at: Option<DateTime<Utc>>,
    pub last_exit_at: Option<DateTime<Utc>>,
    pub days_since_last_trade: Option<i64>,
    pub trades_last_7_days: usize,
    pub trades_last_30_days: usize,
}

/// The complete output of one analysis run.
///
/// Built fresh from the analysis window on every request and never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub as_of: DateTime<Utc>,
    pub engine_version: String,
    pub data_quality: DataQuality,
    pub activity: ActivitySummary,
    pub performance: Insight<PerformanceMetrics>,
    pub behavior: Insight<BehavioralMetrics>,
    pub patterns: PatternSet,
    pub predictions: Insight<PredictiveInsights>,
    pub coaching: CoachingNotes,
}
