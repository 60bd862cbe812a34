use configuration::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid analytics configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),
}
