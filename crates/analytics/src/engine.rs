use chrono::{DateTime, Utc};
use configuration::AnalyticsConfig;
use core_types::TradeRecord;

use crate::behavior::BehaviorAnalyzer;
use crate::coaching::{self, CoachingContext};
use crate::error::AnalyticsError;
use crate::patterns::PatternRecognizer;
use crate::performance::PerformanceAnalyzer;
use crate::predictive::PredictiveGenerator;
use crate::report::{BehavioralMetrics, Insight, InsightsReport, PatternSet, PerformanceMetrics};
use crate::window::AnalysisWindow;

/// Runs the full analytics pipeline over a trader's journal.
///
/// Performance, behaviour and pattern analysis are independent reducers over the
/// analysis window; predictions and coaching consume their outputs afterwards.
/// The engine holds only configuration, so one instance can serve any number of
/// requests.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    /// Creates an engine after validating `config`.
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The main entry point: builds a fresh `InsightsReport` from `records` as they
    /// stood at `as_of`.
    ///
    /// Never fails on data. Malformed records are listed in the report's data-quality
    /// section and windows smaller than `min_trades_for_analysis` produce
    /// insufficient-data markers instead of metrics.
    #[tracing::instrument(name = "analytics_analyze", skip_all, fields(records = records.len(), %as_of))]
    pub fn analyze(&self, records: &[TradeRecord], as_of: DateTime<Utc>) -> InsightsReport {
        let window = AnalysisWindow::build(records, as_of);
        for issue in window.issues() {
            tracing::warn!(record_id = %issue.record_id, kind = ?issue.kind, "Excluded trade record: {}", issue.reason);
        }
        tracing::debug!(
            closed = window.len(),
            open = window.open_positions(),
            "Analysis window built."
        );

        let (performance, behavior, patterns) = self.run_independent_stages(window.trades());

        let required = self.config.min_trades_for_analysis;
        let available = window.len();
        let report = if available < required {
            tracing::info!(available, required, "Not enough closed trades for aggregate metrics.");
            InsightsReport {
                as_of,
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                data_quality: window.data_quality(),
                activity: window.activity(as_of),
                performance: Insight::InsufficientData { required, available },
                behavior: Insight::InsufficientData { required, available },
                patterns,
                predictions: Insight::InsufficientData { required, available },
                coaching: coaching::insufficient_data(required, available),
            }
        } else {
            let predictions = PredictiveGenerator::new(&self.config).generate(
                &performance,
                &behavior,
                &patterns,
                window.recent(self.config.recency_window),
            );
            tracing::debug!(warnings = predictions.risk_warnings.len(), "Predictive stage complete.");

            let coaching = coaching::generate(&CoachingContext {
                performance: &performance,
                behavior: &behavior,
                patterns: &patterns,
                min_group_sample: self.config.min_group_sample,
            });

            InsightsReport {
                as_of,
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                data_quality: window.data_quality(),
                activity: window.activity(as_of),
                performance: Insight::Available(performance),
                behavior: Insight::Available(behavior),
                patterns,
                predictions: Insight::Available(predictions),
                coaching,
            }
        };

        tracing::info!(
            closed_trades = available,
            excluded = window.issues().len(),
            "Insights report generated."
        );
        report
    }

    /// Performance, behaviour and patterns have no data dependency on each other.
    fn run_independent_stages(
        &self,
        trades: &[&TradeRecord],
    ) -> (PerformanceMetrics, BehavioralMetrics, PatternSet) {
        let performance = || PerformanceAnalyzer::new(&self.config).analyze(trades);
        let behavior = || BehaviorAnalyzer::new(&self.config).analyze(trades);
        let patterns = || PatternRecognizer::new(&self.config).recognize(trades);

        if self.config.parallel_stages {
            let (performance, (behavior, patterns)) =
                rayon::join(performance, || rayon::join(behavior, patterns));
            (performance, behavior, patterns)
        } else {
            (performance(), behavior(), patterns())
        }
    }
}
