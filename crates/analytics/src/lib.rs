//! # Trading Analytics Engine
//!
//! This crate turns a trader's journal of closed trades into performance metrics,
//! behavioural scores, recognised trading patterns, forward-looking estimates and
//! coaching notes.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of storage,
//!   presentation or the clock. It depends only on `core-types` and `configuration` (Layer 0).
//! - **Stateless Calculation:** The `AnalyticsEngine` holds nothing but configuration. It
//!   takes trade records and an explicit as-of instant and produces an `InsightsReport`.
//!   The same input always produces the same report.
//! - **Pipeline:** performance, behaviour and patterns are computed independently (in
//!   parallel by default); predictions and coaching are derived from their outputs.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: Runs the whole pipeline.
//! - `InsightsReport`: The serializable result of one run.
//! - The individual stages (`PerformanceAnalyzer`, `BehaviorAnalyzer`, `PatternRecognizer`,
//!   `PredictiveGenerator`, `coaching`) for callers that need only one of them.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod behavior;
pub mod coaching;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod patterns;
pub mod performance;
pub mod predictive;
pub mod report;
pub mod window;

// Re-export the key components to create a clean, public-facing API.
pub use behavior::BehaviorAnalyzer;
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use patterns::PatternRecognizer;
pub use performance::PerformanceAnalyzer;
pub use predictive::PredictiveGenerator;
pub use report::{
    BehavioralMetrics, CoachingNotes, Insight, InsightsReport, IssueKind, PatternSet,
    PerformanceMetrics, PredictiveInsights, Ratio,
};
pub use window::AnalysisWindow;
