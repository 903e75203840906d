use log::debug;
use serde::{Deserialize, Serialize};

use super::keeper::Keeper;
use super::params::Params;
use super::types::{parse_exchange_rate_tuples, AggregateExchangeRateVote};
use super::{
    ATTRIBUTE_KEY_EXCHANGE_RATES, ATTRIBUTE_KEY_FEEDER, ATTRIBUTE_KEY_MODULE,
    ATTRIBUTE_KEY_SENDER, ATTRIBUTE_KEY_VOTER, EVENT_TYPE_AGGREGATE_VOTE,
    EVENT_TYPE_FEED_DELEGATE, EVENT_TYPE_MESSAGE, MODULE_NAME,
};
use crate::address::{AccAddress, ValAddress};
use crate::context::Context;
use crate::staking::{BankKeeper, StakingKeeper};
use crate::store::{Read, Write};
use crate::{Error, Result};

/// Longest accepted exchange rates string, in bytes.
pub const MAX_EXCHANGE_RATES_LENGTH: usize = 4096;

/// Submits the feeder's current exchange rates on behalf of a validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAggregateExchangeRateVote {
    /// Comma-separated `<rate><denom>` items.
    pub exchange_rates: String,
    pub feeder: String,
    pub validator: String,
}

impl MsgAggregateExchangeRateVote {
    pub fn new(exchange_rates: impl Into<String>, feeder: AccAddress, validator: ValAddress) -> Self {
        MsgAggregateExchangeRateVote {
            exchange_rates: exchange_rates.into(),
            feeder: feeder.to_string(),
            validator: validator.to_string(),
        }
    }

    /// Stateless checks, run before the message reaches the keeper.
    pub fn validate_basic(&self) -> Result<()> {
        parse_feeder(&self.feeder)?;
        parse_validator(&self.validator)?;

        if self.exchange_rates.is_empty() {
            return Err(Error::InvalidRequest(
                "must provide at least one oracle exchange rate".into(),
            ));
        }
        if self.exchange_rates.len() > MAX_EXCHANGE_RATES_LENGTH {
            return Err(Error::InvalidRequest(format!(
                "exchange rates string can not exceed {} characters",
                MAX_EXCHANGE_RATES_LENGTH
            )));
        }

        parse_exchange_rate_tuples(&self.exchange_rates)?;
        Ok(())
    }
}

/// Delegates the right to vote for a validator to another account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegateFeedConsent {
    pub operator: String,
    pub delegate: String,
}

impl MsgDelegateFeedConsent {
    pub fn new(operator: ValAddress, delegate: AccAddress) -> Self {
        MsgDelegateFeedConsent {
            operator: operator.to_string(),
            delegate: delegate.to_string(),
        }
    }

    pub fn validate_basic(&self) -> Result<()> {
        parse_validator(&self.operator)?;
        parse_feeder(&self.delegate)?;
        Ok(())
    }
}

/// Replaces the module params. Only accepted from the governance authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub authority: String,
    pub params: Params,
}

impl MsgUpdateParams {
    pub fn validate_basic(&self) -> Result<()> {
        parse_feeder(&self.authority)?;
        self.params.validate()
    }
}

/// A message as seen by the oracle's admission checks and router. Messages of
/// other modules are only carried by their type URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    AggregateExchangeRateVote(MsgAggregateExchangeRateVote),
    DelegateFeedConsent(MsgDelegateFeedConsent),
    UpdateParams(MsgUpdateParams),
    Other(String),
}

impl Msg {
    pub fn validate_basic(&self) -> Result<()> {
        match self {
            Msg::AggregateExchangeRateVote(msg) => msg.validate_basic(),
            Msg::DelegateFeedConsent(msg) => msg.validate_basic(),
            Msg::UpdateParams(msg) => msg.validate_basic(),
            Msg::Other(type_url) => Err(Error::InvalidRequest(format!(
                "unrecognized {} message type: {}",
                MODULE_NAME, type_url
            ))),
        }
    }
}

fn parse_feeder(address: &str) -> Result<AccAddress> {
    address
        .parse()
        .map_err(|err| Error::InvalidAddress(format!("invalid account address ({})", err)))
}

fn parse_validator(address: &str) -> Result<ValAddress> {
    address
        .parse()
        .map_err(|err| Error::InvalidAddress(format!("invalid operator address ({})", err)))
}

impl<SK, BK, S> Keeper<SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    /// Validates and routes a message to its handler.
    pub fn handle(&mut self, ctx: &mut Context, msg: &Msg) -> Result<()> {
        msg.validate_basic()?;
        match msg {
            Msg::AggregateExchangeRateVote(msg) => self.aggregate_exchange_rate_vote(ctx, msg),
            Msg::DelegateFeedConsent(msg) => self.delegate_feed_consent(ctx, msg),
            Msg::UpdateParams(msg) => self.update_params(msg),
            Msg::Other(_) => Ok(()),
        }
    }

    /// Stores the validator's vote for the current period, replacing any
    /// earlier vote in the same period.
    pub fn aggregate_exchange_rate_vote(
        &mut self,
        ctx: &mut Context,
        msg: &MsgAggregateExchangeRateVote,
    ) -> Result<()> {
        let validator = parse_validator(&msg.validator)?;
        let feeder = parse_feeder(&msg.feeder)?;
        self.validate_feeder(&feeder, &validator)?;

        let tuples = parse_exchange_rate_tuples(&msg.exchange_rates)?;
        for tuple in tuples.iter() {
            if !self.is_vote_target(&tuple.denom)? {
                return Err(Error::UnknownDenom(tuple.denom.clone()));
            }
        }
        for tuple in tuples.iter() {
            if !tuple.exchange_rate.is_positive() {
                return Err(Error::AggregateVoteInvalidRate(format!(
                    "{}{}",
                    tuple.exchange_rate, tuple.denom
                )));
            }
        }

        debug!("Vote of {} for {} denoms", validator, tuples.len());
        self.set_aggregate_vote(validator, AggregateExchangeRateVote::new(tuples, validator))?;

        ctx.emit_event(
            EVENT_TYPE_AGGREGATE_VOTE,
            &[
                (ATTRIBUTE_KEY_VOTER, msg.validator.clone()),
                (ATTRIBUTE_KEY_EXCHANGE_RATES, msg.exchange_rates.clone()),
            ],
        );
        ctx.emit_event(
            EVENT_TYPE_MESSAGE,
            &[
                (ATTRIBUTE_KEY_MODULE, MODULE_NAME.to_string()),
                (ATTRIBUTE_KEY_SENDER, msg.feeder.clone()),
            ],
        );

        Ok(())
    }

    pub fn delegate_feed_consent(
        &mut self,
        ctx: &mut Context,
        msg: &MsgDelegateFeedConsent,
    ) -> Result<()> {
        let operator = parse_validator(&msg.operator)?;
        let delegate = parse_feeder(&msg.delegate)?;

        if self.staking.validator(&operator)?.is_none() {
            return Err(Error::NoValidatorFound(msg.operator.clone()));
        }
        self.set_feeder_delegation(operator, delegate)?;

        ctx.emit_event(
            EVENT_TYPE_FEED_DELEGATE,
            &[(ATTRIBUTE_KEY_FEEDER, msg.delegate.clone())],
        );
        ctx.emit_event(
            EVENT_TYPE_MESSAGE,
            &[
                (ATTRIBUTE_KEY_MODULE, MODULE_NAME.to_string()),
                (ATTRIBUTE_KEY_SENDER, msg.operator.clone()),
            ],
        );

        Ok(())
    }

    pub fn update_params(&mut self, msg: &MsgUpdateParams) -> Result<()> {
        let authority = parse_feeder(&msg.authority)?;
        if authority != self.authority() {
            return Err(Error::Unauthorized(format!(
                "invalid authority; expected {}, got {}",
                self.authority(),
                msg.authority
            )));
        }

        self.set_params(&msg.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feeder() -> AccAddress {
        AccAddress::new([1; 20])
    }

    fn validator() -> ValAddress {
        ValAddress::new([1; 20])
    }

    #[test]
    fn vote_validate_basic() -> Result<()> {
        MsgAggregateExchangeRateVote::new("1700uatom,0.2ueth", feeder(), validator())
            .validate_basic()?;
        // abstentions pass stateless checks
        MsgAggregateExchangeRateVote::new("0.0atom,123.12eth", feeder(), validator())
            .validate_basic()?;

        let empty = MsgAggregateExchangeRateVote::new("", feeder(), validator());
        assert!(matches!(empty.validate_basic(), Err(Error::InvalidRequest(_))));

        let long = format!("{}uatom", "1".repeat(MAX_EXCHANGE_RATES_LENGTH));
        let long = MsgAggregateExchangeRateVote::new(long, feeder(), validator());
        assert!(matches!(long.validate_basic(), Err(Error::InvalidRequest(_))));

        let malformed = MsgAggregateExchangeRateVote::new("a,b", feeder(), validator());
        assert!(matches!(
            malformed.validate_basic(),
            Err(Error::InvalidRequest(_))
        ));

        let overflow = format!("{}.0atom,123.13eth", "1".repeat(100));
        let overflow = MsgAggregateExchangeRateVote::new(overflow, feeder(), validator());
        assert!(matches!(
            overflow.validate_basic(),
            Err(Error::InvalidExchangeRate(_))
        ));
        Ok(())
    }

    #[test]
    fn vote_validate_addresses() {
        let mut msg = MsgAggregateExchangeRateVote::new("1uatom", feeder(), validator());
        msg.validator = feeder().to_string();
        assert!(matches!(msg.validate_basic(), Err(Error::InvalidAddress(_))));

        let mut msg = MsgAggregateExchangeRateVote::new("1uatom", feeder(), validator());
        msg.feeder = "".into();
        assert!(matches!(msg.validate_basic(), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn delegate_validate_basic() -> Result<()> {
        MsgDelegateFeedConsent::new(validator(), feeder()).validate_basic()?;
        let msg = MsgDelegateFeedConsent {
            operator: feeder().to_string(),
            delegate: feeder().to_string(),
        };
        assert!(matches!(msg.validate_basic(), Err(Error::InvalidAddress(_))));
        Ok(())
    }

    #[test]
    fn other_messages_are_not_routed() {
        let msg = Msg::Other("/cosmos.bank.v1beta1.MsgSend".into());
        assert!(matches!(msg.validate_basic(), Err(Error::InvalidRequest(_))));
    }
}
