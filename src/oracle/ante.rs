//! Admission checks run on transactions before their messages execute.

use super::keeper::Keeper;
use super::msg::Msg;
use crate::address::{AccAddress, ValAddress};
use crate::context::{Context, ExecMode};
use crate::staking::{BankKeeper, StakingKeeper};
use crate::store::{Read, Write};
use crate::{Error, Result};

pub trait AnteDecorator {
    fn ante_handle(&mut self, ctx: &Context, msgs: &[Msg]) -> Result<()>;
}

/// Rejects a second oracle vote from the same validator within one block
/// height while transactions are admitted to the mempool.
pub struct SpamPreventionDecorator<'a, SK, BK, S> {
    keeper: &'a mut Keeper<SK, BK, S>,
}

impl<'a, SK, BK, S> SpamPreventionDecorator<'a, SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    pub fn new(keeper: &'a mut Keeper<SK, BK, S>) -> Self {
        SpamPreventionDecorator { keeper }
    }

    fn check_oracle_spamming(&mut self, ctx: &Context, msgs: &[Msg]) -> Result<()> {
        for msg in msgs {
            let vote = match msg {
                Msg::AggregateExchangeRateVote(vote) => vote,
                _ => continue,
            };

            let feeder: AccAddress = vote
                .feeder
                .parse()
                .map_err(|err| Error::InvalidAddress(format!("{}", err)))?;
            let validator: ValAddress = vote
                .validator
                .parse()
                .map_err(|err| Error::InvalidAddress(format!("{}", err)))?;
            self.keeper.validate_feeder(&feeder, &validator)?;

            if self.keeper.spam_prevention_counter(&validator)? == Some(ctx.height) {
                return Err(Error::Conflict(format!(
                    "the validator has already submitted a vote at the current height={}",
                    ctx.height
                )));
            }
            self.keeper.set_spam_prevention_counter(ctx, validator)?;
        }

        Ok(())
    }
}

impl<'a, SK, BK, S> AnteDecorator for SpamPreventionDecorator<'a, SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    fn ante_handle(&mut self, ctx: &Context, msgs: &[Msg]) -> Result<()> {
        match ctx.mode {
            ExecMode::Check => self.check_oracle_spamming(ctx, msgs),
            ExecMode::Deliver | ExecMode::ReCheck | ExecMode::Simulate => Ok(()),
        }
    }
}

/// Rejects transactions which bundle an oracle vote with any other message.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoteAloneDecorator;

impl AnteDecorator for VoteAloneDecorator {
    fn ante_handle(&mut self, _ctx: &Context, msgs: &[Msg]) -> Result<()> {
        let oracle_vote = msgs
            .iter()
            .any(|msg| matches!(msg, Msg::AggregateExchangeRateVote(_)));
        let other = msgs
            .iter()
            .any(|msg| !matches!(msg, Msg::AggregateExchangeRateVote(_)));

        if oracle_vote && other {
            return Err(Error::InvalidRequest(
                "oracle votes cannot be in the same tx as other messages".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAccounts, MockBank, MockStaking};
    use crate::oracle::msg::{MsgAggregateExchangeRateVote, MsgDelegateFeedConsent};
    use crate::oracle::params::Params;
    use crate::oracle::MODULE_NAME;
    use crate::store::{MapStore, Shared, Store};

    type TestKeeper = Keeper<MockStaking, MockBank>;

    fn setup() -> Result<(TestKeeper, ValAddress)> {
        let staking = MockStaking::with_bonded(&[10]);
        let validator = staking.operators()[0];
        let accounts = MockAccounts::with_module(MODULE_NAME, AccAddress::new([99; 20]));
        let mut keeper = Keeper::new(
            Store::new(Shared::new(MapStore::new())),
            &accounts,
            MockBank::new(),
            staking,
            AccAddress::new([100; 20]),
        );
        keeper.set_params(&Params::default())?;
        Ok((keeper, validator))
    }

    fn vote(validator: ValAddress) -> Msg {
        Msg::AggregateExchangeRateVote(MsgAggregateExchangeRateVote::new(
            "1ubtc",
            validator.into(),
            validator,
        ))
    }

    #[test]
    fn second_vote_at_same_height_conflicts() -> Result<()> {
        let (mut keeper, validator) = setup()?;
        let msgs = vec![vote(validator)];
        let ctx = Context::new(10, 0).with_mode(ExecMode::Check);

        let mut decorator = SpamPreventionDecorator::new(&mut keeper);
        decorator.ante_handle(&ctx, &msgs)?;
        assert!(matches!(
            decorator.ante_handle(&ctx, &msgs),
            Err(Error::Conflict(_))
        ));

        let next = Context::new(11, 0).with_mode(ExecMode::Check);
        decorator.ante_handle(&next, &msgs)?;
        assert_eq!(keeper.spam_prevention_counter(&validator)?, Some(11));
        Ok(())
    }

    #[test]
    fn skipped_outside_check_mode() -> Result<()> {
        let (mut keeper, validator) = setup()?;
        let msgs = vec![vote(validator)];

        for mode in [ExecMode::ReCheck, ExecMode::Simulate, ExecMode::Deliver] {
            let ctx = Context::new(10, 0).with_mode(mode);
            let mut decorator = SpamPreventionDecorator::new(&mut keeper);
            decorator.ante_handle(&ctx, &msgs)?;
            decorator.ante_handle(&ctx, &msgs)?;
        }
        assert_eq!(keeper.spam_prevention_counter(&validator)?, None);
        Ok(())
    }

    #[test]
    fn unauthorized_feeder_rejected() -> Result<()> {
        let (mut keeper, validator) = setup()?;
        let msgs = vec![Msg::AggregateExchangeRateVote(
            MsgAggregateExchangeRateVote::new("1ubtc", AccAddress::new([42; 20]), validator),
        )];
        let ctx = Context::new(10, 0).with_mode(ExecMode::Check);
        let mut decorator = SpamPreventionDecorator::new(&mut keeper);
        assert!(matches!(
            decorator.ante_handle(&ctx, &msgs),
            Err(Error::NoVotingPermission(_))
        ));
        Ok(())
    }

    #[test]
    fn vote_alone() -> Result<()> {
        let validator = ValAddress::new([1; 20]);
        let delegate = Msg::DelegateFeedConsent(MsgDelegateFeedConsent::new(
            validator,
            AccAddress::new([2; 20]),
        ));
        let ctx = Context::default();

        VoteAloneDecorator.ante_handle(&ctx, &[vote(validator), vote(validator)])?;
        VoteAloneDecorator.ante_handle(&ctx, &[delegate.clone()])?;
        assert!(matches!(
            VoteAloneDecorator.ante_handle(&ctx, &[vote(validator), delegate]),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            VoteAloneDecorator.ante_handle(&ctx, &[vote(validator), Msg::Other("/x.y.Msg".into())]),
            Err(Error::InvalidRequest(_))
        ));
        Ok(())
    }
}
