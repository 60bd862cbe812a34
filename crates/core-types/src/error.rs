use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Malformed trade record {id}: {reason}")]
    MalformedRecord { id: Uuid, reason: String },
}
