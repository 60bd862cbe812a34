//! Rule-driven coaching notes.
//!
//! Each entry of [`COACHING_RULES`] maps a metric threshold to one message in one
//! category. Adding coaching advice means adding a row; the generator itself
//! never changes.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::report::{
    BehavioralMetrics, CoachingNotes, EmotionTrend, NoteCategory, PatternSet, PerformanceMetrics,
    Ratio, RiskTolerance,
};

/// The stage outputs a coaching rule may inspect.
pub struct CoachingContext<'a> {
    pub performance: &'a PerformanceMetrics,
    pub behavior: &'a BehavioralMetrics,
    pub patterns: &'a PatternSet,
    /// Fewest trades an emotion needs before it can be singled out.
    pub min_group_sample: usize,
}

impl CoachingContext<'_> {
    fn worst_emotion(&self) -> Option<&EmotionTrend> {
        self.behavior
            .emotional_trends
            .iter()
            .filter(|t| t.trades >= self.min_group_sample && t.average_pnl < Decimal::ZERO)
            .min_by(|a, b| a.average_pnl.cmp(&b.average_pnl))
    }

    fn strategy_win_rate(&self, key: &str) -> Decimal {
        self.patterns
            .by_strategy
            .iter()
            .find(|g| g.key == key)
            .map(|g| g.win_rate_pct)
            .unwrap_or_default()
    }
}

pub struct CoachingRule {
    pub category: NoteCategory,
    pub applies: fn(&CoachingContext<'_>) -> bool,
    pub message: fn(&CoachingContext<'_>) -> String,
}

pub static COACHING_RULES: &[CoachingRule] = &[
    // --- Strengths ---
    CoachingRule {
        category: NoteCategory::Strength,
        applies: |c| c.performance.win_loss_ratio > dec!(1.5),
        message: |c| {
            format!(
                "Your average winner is {}x your average loser: you let profits run.",
                c.performance.win_loss_ratio
            )
        },
    },
    CoachingRule {
        category: NoteCategory::Strength,
        applies: |c| c.performance.consistency > dec!(70),
        message: |c| format!("Consistent results (consistency score {}).", c.performance.consistency),
    },
    CoachingRule {
        category: NoteCategory::Strength,
        applies: |c| c.behavior.discipline_score > dec!(80),
        message: |c| {
            format!(
                "Strong risk discipline: {}% of trades had a stop-loss.",
                c.behavior.discipline_score
            )
        },
    },
    CoachingRule {
        category: NoteCategory::Strength,
        applies: |c| c.performance.profit_factor.exceeds(dec!(2)),
        message: |c| match c.performance.profit_factor {
            Ratio::Finite(pf) => format!("Excellent profit factor of {pf}."),
            Ratio::Unbounded => "No losing trades so far: every closed trade was profitable.".to_string(),
        },
    },
    CoachingRule {
        category: NoteCategory::Strength,
        applies: |c| c.performance.win_rate_pct >= dec!(60),
        message: |c| format!("High win rate of {}%.", c.performance.win_rate_pct),
    },
    // --- Weaknesses ---
    CoachingRule {
        category: NoteCategory::Weakness,
        applies: |c| c.performance.max_drawdown_pct > dec!(25),
        message: |c| {
            format!(
                "Deep drawdown of {}% from peak equity.",
                c.performance.max_drawdown_pct
            )
        },
    },
    CoachingRule {
        category: NoteCategory::Weakness,
        applies: |c| c.behavior.overconfidence_score > dec!(20),
        message: |c| {
            format!(
                "High-confidence trades underperform your average (overconfidence score {}).",
                c.behavior.overconfidence_score
            )
        },
    },
    CoachingRule {
        category: NoteCategory::Weakness,
        applies: |c| c.performance.profit_factor.below(dec!(1.2)),
        message: |c| {
            format!(
                "Profit factor of {} leaves little margin over costs.",
                c.performance.profit_factor.finite().unwrap_or_default()
            )
        },
    },
    CoachingRule {
        category: NoteCategory::Weakness,
        applies: |c| c.performance.win_rate_pct < dec!(40),
        message: |c| format!("Low win rate of {}%.", c.performance.win_rate_pct),
    },
    CoachingRule {
        category: NoteCategory::Weakness,
        applies: |c| c.behavior.revenge_trading_risk > dec!(30),
        message: |c| {
            format!(
                "{} trades were sized up shortly after a loss.",
                c.behavior.revenge_trades
            )
        },
    },
    // --- Improvement areas ---
    CoachingRule {
        category: NoteCategory::ImprovementArea,
        applies: |c| c.behavior.discipline_score < dec!(50),
        message: |c| {
            format!(
                "Set a stop-loss on every trade; only {}% of trades had one.",
                c.behavior.discipline_score
            )
        },
    },
    CoachingRule {
        category: NoteCategory::ImprovementArea,
        applies: |c| c.behavior.fear_greed_index > dec!(70),
        message: |_| "Standardise position sizing; your trade sizes vary widely.".to_string(),
    },
    CoachingRule {
        category: NoteCategory::ImprovementArea,
        applies: |c| c.behavior.overtrading_risk > dec!(50),
        message: |c| {
            format!(
                "Cut trade frequency: {} trades per active day is above your plan.",
                c.behavior.trades_per_active_day
            )
        },
    },
    CoachingRule {
        category: NoteCategory::ImprovementArea,
        applies: |c| c.performance.consistency < dec!(40),
        message: |_| "Results swing widely from trade to trade; tighten your entry criteria.".to_string(),
    },
    // --- Personalised tips ---
    CoachingRule {
        category: NoteCategory::PersonalizedTip,
        applies: |c| c.patterns.best_strategy.is_some(),
        message: |c| {
            let name = c.patterns.best_strategy.as_deref().unwrap_or_default();
            format!(
                "Focus on '{}', your best strategy at a {}% win rate.",
                name,
                c.strategy_win_rate(name)
            )
        },
    },
    CoachingRule {
        category: NoteCategory::PersonalizedTip,
        applies: |c| c.patterns.worst_strategy.is_some(),
        message: |c| {
            let name = c.patterns.worst_strategy.as_deref().unwrap_or_default();
            format!(
                "Review or pause '{}', your weakest strategy at a {}% win rate.",
                name,
                c.strategy_win_rate(name)
            )
        },
    },
    CoachingRule {
        category: NoteCategory::PersonalizedTip,
        applies: |c| c.patterns.best_hour.is_some(),
        message: |c| {
            format!(
                "Your best results come from entries around {} UTC.",
                c.patterns.best_hour.as_deref().unwrap_or_default()
            )
        },
    },
    CoachingRule {
        category: NoteCategory::PersonalizedTip,
        applies: |c| {
            let bearish = &c.patterns.by_market_condition.bearish;
            bearish.eligible && bearish.win_rate_pct < dec!(40)
        },
        message: |c| {
            format!(
                "Bearish conditions are costly for you ({}% win rate); trade smaller or sit out.",
                c.patterns.by_market_condition.bearish.win_rate_pct
            )
        },
    },
    CoachingRule {
        category: NoteCategory::PersonalizedTip,
        applies: |c| c.behavior.risk_tolerance == RiskTolerance::Aggressive,
        message: |c| {
            format!(
                "You risk {}% per trade on average; 1-2% keeps a losing streak survivable.",
                c.behavior.average_risk_pct
            )
        },
    },
    // --- Mental game ---
    CoachingRule {
        category: NoteCategory::MentalGame,
        applies: |c| c.behavior.fear_greed_index > dec!(70),
        message: |_| "Sizing swings suggest fear and greed are driving decisions; decide size before the open.".to_string(),
    },
    CoachingRule {
        category: NoteCategory::MentalGame,
        applies: |c| c.behavior.overconfidence_score > dec!(20),
        message: |_| "When you feel most certain, double-check the setup against your plan.".to_string(),
    },
    CoachingRule {
        category: NoteCategory::MentalGame,
        applies: |c| c.behavior.revenge_trading_risk > dec!(30),
        message: |_| "Take a break after a loss before placing the next trade.".to_string(),
    },
    CoachingRule {
        category: NoteCategory::MentalGame,
        applies: |c| c.performance.max_consecutive_losses >= 4,
        message: |c| {
            format!(
                "You have endured a {}-trade losing streak; predefine a daily loss limit.",
                c.performance.max_consecutive_losses
            )
        },
    },
    CoachingRule {
        category: NoteCategory::MentalGame,
        applies: |c| c.worst_emotion().is_some(),
        message: |c| match c.worst_emotion() {
            Some(trend) => format!(
                "Trades entered feeling '{}' average {}; pause when you notice it.",
                trend.emotion, trend.average_pnl
            ),
            None => String::new(),
        },
    },
];

/// Evaluates every rule in table order against the stage outputs.
pub fn generate(context: &CoachingContext<'_>) -> CoachingNotes {
    let mut notes = CoachingNotes::default();
    for rule in COACHING_RULES.iter().filter(|rule| (rule.applies)(context)) {
        notes.push(rule.category, (rule.message)(context));
    }
    notes
}

/// The single note produced when too few trades have been closed.
pub fn insufficient_data(required: usize, available: usize) -> CoachingNotes {
    let mut notes = CoachingNotes::default();
    notes.push(
        NoteCategory::ImprovementArea,
        format!(
            "Log at least {} more closed trades to unlock performance coaching ({} of {} so far).",
            required.saturating_sub(available),
            available,
            required
        ),
    );
    notes
}
