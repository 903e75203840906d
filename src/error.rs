use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Store Error: {0}")]
    Store(String),
    #[error(transparent)]
    Ed(#[from] ed::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Decimal(#[from] rust_decimal::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Bech32(#[from] bech32::Error),
    #[error("Overflow")]
    Overflow,
    #[error("Divide by zero")]
    DivideByZero,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Unknown denom: {0}")]
    UnknownDenom(String),
    #[error("Aggregate vote has invalid exchange rate: {0}")]
    AggregateVoteInvalidRate(String),
    #[error("Invalid exchange rate: {0}")]
    InvalidExchangeRate(String),
    #[error("Unauthorized voter: {0}")]
    NoVotingPermission(String),
    #[error("Validator not found: {0}")]
    NoValidatorFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Twap lookback seconds is greater than max lookback duration or equal to 0")]
    InvalidTwapLookback,
    #[error("No data for the twap calculation")]
    NoTwapData,
    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),
}

/// A result type bound to the standard oracle error type.
pub type Result<T> = std::result::Result<T, Error>;
