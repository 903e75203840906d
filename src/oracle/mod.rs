//! Validator-submitted price oracle.
//!
//! Bonded validators (or their delegated feeders) submit aggregate votes of
//! exchange rates. At the last block of each vote period the votes are
//! organized into per-denom ballots, tallied into power-weighted medians and
//! stored as the canonical exchange rates. Validators who keep failing to vote
//! inside the reward band are slashed and jailed at the end of each slash
//! window.

pub mod abci;
pub mod ante;
pub mod ballot;
pub mod genesis;
pub mod keeper;
pub mod msg;
pub mod params;
pub mod period;
pub mod query;
pub mod slash;
pub mod tally;
pub mod twap;
pub mod types;

pub use abci::{begin_blocker, end_blocker};
pub use ballot::{Claim, ClaimMap, ExchangeRateBallot, VoteForTally};
pub use genesis::GenesisState;
pub use keeper::Keeper;
pub use msg::{Msg, MsgAggregateExchangeRateVote, MsgDelegateFeedConsent, MsgUpdateParams};
pub use params::Params;
pub use types::*;

pub const MODULE_NAME: &str = "oracle";

pub const EVENT_TYPE_EXCHANGE_RATE_UPDATE: &str = "exchange_rate_update";
pub const EVENT_TYPE_AGGREGATE_VOTE: &str = "aggregate_vote";
pub const EVENT_TYPE_FEED_DELEGATE: &str = "feed_delegate";
pub const EVENT_TYPE_END_SLASH_WINDOW: &str = "end_slash_window";
pub const EVENT_TYPE_MESSAGE: &str = "message";

pub const ATTRIBUTE_KEY_DENOM: &str = "denom";
pub const ATTRIBUTE_KEY_EXCHANGE_RATE: &str = "exchange_rate";
pub const ATTRIBUTE_KEY_EXCHANGE_RATES: &str = "exchange_rates";
pub const ATTRIBUTE_KEY_VOTER: &str = "voter";
pub const ATTRIBUTE_KEY_FEEDER: &str = "feeder";
pub const ATTRIBUTE_KEY_OPERATOR: &str = "operator";
pub const ATTRIBUTE_KEY_MISS_COUNT: &str = "miss_count";
pub const ATTRIBUTE_KEY_ABSTAIN_COUNT: &str = "abstain_count";
pub const ATTRIBUTE_KEY_SUCCESS_COUNT: &str = "success_count";
pub const ATTRIBUTE_KEY_MODULE: &str = "module";
pub const ATTRIBUTE_KEY_SENDER: &str = "sender";
