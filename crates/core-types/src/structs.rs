use crate::enums::{Direction, InstrumentKind};
use crate::error::CoreError;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single journaled trade, as supplied by the trade store.
///
/// A record is either open (no exit, no realized P&L) or closed (both present).
/// The analytics layer never mutates records; it only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,

    // --- Instrument ---
    pub symbol: String,
    #[serde(default)]
    pub instrument: InstrumentKind,
    #[serde(default)]
    pub direction: Direction,

    // --- Economics ---
    pub entry_price: Decimal,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub target_price: Option<Decimal>,

    // --- Timing ---
    pub entry_time: DateTime<Utc>,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,

    // --- Outcome ---
    #[serde(default)]
    pub profit_loss: Option<Decimal>,

    // --- Journal context ---
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub market_condition: Option<String>,
    #[serde(default)]
    pub setup: Option<String>,
    #[serde(default)]
    pub pre_emotion: Option<String>,
    #[serde(default)]
    pub post_emotion: Option<String>,
    /// Self-reported confidence on a 1-10 scale.
    #[serde(default)]
    pub confidence: Option<u8>,
    /// Self-reported execution quality on a 1-10 scale.
    #[serde(default)]
    pub quality_rating: Option<u8>,
}

/// Largest absolute price, quantity, P&L or notional a record may carry.
pub const MAX_MAGNITUDE: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Whether a validated record carries a realized outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Open,
    Closed,
}

impl TradeRecord {
    /// Creates a new open position with a fresh id and no journal context.
    pub fn open(
        symbol: impl Into<String>,
        direction: Direction,
        entry_price: Decimal,
        quantity: Decimal,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            instrument: InstrumentKind::default(),
            direction,
            entry_price,
            exit_price: None,
            quantity,
            stop_loss: None,
            target_price: None,
            entry_time,
            exit_time: None,
            profit_loss: None,
            strategy: None,
            market_condition: None,
            setup: None,
            pre_emotion: None,
            post_emotion: None,
            confidence: None,
            quality_rating: None,
        }
    }

    /// Closes the record at the given price and time, recording the realized P&L.
    pub fn closed_at(mut self, exit_price: Decimal, exit_time: DateTime<Utc>, profit_loss: Decimal) -> Self {
        self.exit_price = Some(exit_price);
        self.exit_time = Some(exit_time);
        self.profit_loss = Some(profit_loss);
        self
    }

    pub fn with_stop_loss(mut self, stop_loss: Decimal) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn with_market_condition(mut self, condition: impl Into<String>) -> Self {
        self.market_condition = Some(condition.into());
        self
    }

    pub fn with_setup(mut self, setup: impl Into<String>) -> Self {
        self.setup = Some(setup.into());
        self
    }

    pub fn with_emotions(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.pre_emotion = Some(pre.into());
        self.post_emotion = Some(post.into());
        self
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// The capital committed at entry: `quantity * entry_price`.
    pub fn notional(&self) -> Decimal {
        self.quantity.saturating_mul(self.entry_price)
    }

    /// Time between entry and exit, if the position has been closed.
    pub fn holding_period(&self) -> Option<Duration> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }

    /// Checks the structural invariants of a record.
    ///
    /// P&L must be present exactly when an exit timestamp is present, the exit
    /// cannot precede the entry, and price and quantity must be positive. Monetary
    /// amounts are bounded by [`MAX_MAGNITUDE`] and ratings must lie on the 1-10 scale.
    pub fn validate(&self) -> Result<RecordStatus, CoreError> {
        let malformed = |reason: &str| CoreError::MalformedRecord {
            id: self.id,
            reason: reason.to_string(),
        };

        if self.quantity <= Decimal::ZERO {
            return Err(malformed("quantity must be positive"));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(malformed("entry price must be positive"));
        }

        let notional = self
            .quantity
            .checked_mul(self.entry_price)
            .ok_or_else(|| malformed("notional overflows"))?;
        let amounts = [
            ("quantity", Some(self.quantity)),
            ("entry price", Some(self.entry_price)),
            ("exit price", self.exit_price),
            ("stop-loss", self.stop_loss),
            ("target price", self.target_price),
            ("profit/loss", self.profit_loss),
            ("notional", Some(notional)),
        ];
        for (name, amount) in amounts {
            if amount.is_some_and(|a| a.abs() > MAX_MAGNITUDE) {
                return Err(malformed(&format!("{name} exceeds {MAX_MAGNITUDE}")));
            }
        }

        for (name, rating) in [("confidence", self.confidence), ("quality rating", self.quality_rating)] {
            if rating.is_some_and(|r| !(1..=10).contains(&r)) {
                return Err(malformed(&format!("{name} must be between 1 and 10")));
            }
        }

        match (self.profit_loss, self.exit_time) {
            (Some(_), Some(exit)) => {
                if exit < self.entry_time {
                    return Err(malformed("exit timestamp precedes entry timestamp"));
                }
                Ok(RecordStatus::Closed)
            }
            (None, None) => Ok(RecordStatus::Open),
            (Some(_), None) => Err(malformed("profit/loss recorded without an exit timestamp")),
            (None, Some(_)) => Err(malformed("exit timestamp recorded without a profit/loss")),
        }
    }
}
