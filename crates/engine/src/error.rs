use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid bar: {0}")]
    InvalidBar(#[from] core_types::CoreError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Risk management error: {0}")]
    Risk(#[from] risk::RiskError),

    #[error("Order gateway error: {0}")]
    Gateway(#[from] executor::ExecutorError),

    #[error("Event error: {0}")]
    Events(#[from] events::EventsError),
}

impl From<configuration::ConfigError> for EngineError {
    fn from(e: configuration::ConfigError) -> Self {
        EngineError::Configuration(e.to_string())
    }
}
