pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Direction, InstrumentKind};
pub use error::CoreError;
pub use structs::{MAX_MAGNITUDE, RecordStatus, TradeRecord};
