use std::collections::BTreeSet;

use log::{error, info};

use super::keeper::Keeper;
use super::{
    ATTRIBUTE_KEY_ABSTAIN_COUNT, ATTRIBUTE_KEY_MISS_COUNT, ATTRIBUTE_KEY_OPERATOR,
    ATTRIBUTE_KEY_SUCCESS_COUNT, EVENT_TYPE_END_SLASH_WINDOW,
};
use crate::context::Context;
use crate::decimal::Decimal;
use crate::staking::{BankKeeper, StakingKeeper};
use crate::store::{Read, Write};
use crate::Result;

/// Blocks between a validator set change and it taking effect.
pub const VALIDATOR_UPDATE_DELAY: i64 = 1;

impl<SK, BK, S> Keeper<SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    /// Evaluates every penalty counter of the ending slash window, slashing
    /// and jailing bonded validators whose valid vote rate fell below
    /// `min_valid_per_window`, then deletes all counters.
    pub fn slash_and_reset_counters(&mut self, ctx: &mut Context) -> Result<()> {
        let params = self.params()?;
        let distribution_height = ctx.height - VALIDATOR_UPDATE_DELAY - 1;

        for (operator, counter) in self.vote_penalty_counters()? {
            let total = counter.total();
            if total == 0 {
                error!(
                    "Zero votes in penalty counter of {}, this should never happen",
                    operator
                );
                self.delete_vote_penalty_counter(&operator)?;
                continue;
            }

            let valid_vote_rate =
                Decimal::from(counter.success_count).checked_div(Decimal::from(total))?;

            if valid_vote_rate < params.min_valid_per_window {
                if let Some(validator) = self.staking.validator(&operator)? {
                    if validator.is_bonded() && !validator.is_jailed() {
                        let burned = self.staking.slash(
                            &operator,
                            distribution_height,
                            validator.consensus_power,
                            params.slash_fraction,
                        )?;
                        self.staking.jail(&operator)?;
                        info!(
                            "Slashed and jailed {} for a valid vote rate of {} ({} burned)",
                            operator, valid_vote_rate, burned
                        );
                    }
                }
            }

            ctx.emit_event(
                EVENT_TYPE_END_SLASH_WINDOW,
                &[
                    (ATTRIBUTE_KEY_OPERATOR, operator.to_string()),
                    (ATTRIBUTE_KEY_MISS_COUNT, counter.miss_count.to_string()),
                    (ATTRIBUTE_KEY_ABSTAIN_COUNT, counter.abstain_count.to_string()),
                    (ATTRIBUTE_KEY_SUCCESS_COUNT, counter.success_count.to_string()),
                ],
            );

            self.delete_vote_penalty_counter(&operator)?;
        }

        Ok(())
    }

    /// Deletes stored exchange rates for denoms which are no longer vote
    /// targets.
    pub fn remove_excess_feeds(&mut self) -> Result<()> {
        let targets: BTreeSet<String> = self.vote_targets()?.into_iter().collect();
        let excess: Vec<String> = self
            .exchange_rates()?
            .into_iter()
            .map(|(denom, _)| denom)
            .filter(|denom| !targets.contains(denom))
            .collect();

        for denom in excess {
            info!("Removing exchange rate of retired denom {}", denom);
            self.delete_exchange_rate(&denom)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccAddress;
    use crate::context::attribute;
    use crate::mock::{MockAccounts, MockBank, MockStaking};
    use crate::oracle::params::Params;
    use crate::oracle::types::{Denom, VotePenaltyCounter};
    use crate::oracle::MODULE_NAME;
    use crate::store::{MapStore, Shared, Store};
    use rust_decimal_macros::dec;

    type TestKeeper = Keeper<MockStaking, MockBank>;

    fn setup(staking: MockStaking) -> Result<TestKeeper> {
        let accounts = MockAccounts::with_module(MODULE_NAME, AccAddress::new([99; 20]));
        let mut keeper = Keeper::new(
            Store::new(Shared::new(MapStore::new())),
            &accounts,
            MockBank::new(),
            staking,
            AccAddress::new([100; 20]),
        );
        let params = Params {
            min_valid_per_window: dec!(0.5).into(),
            slash_fraction: dec!(0.01).into(),
            ..Default::default()
        };
        keeper.set_params(&params)?;
        Ok(keeper)
    }

    fn counter(success_count: u64, abstain_count: u64, miss_count: u64) -> VotePenaltyCounter {
        VotePenaltyCounter {
            miss_count,
            abstain_count,
            success_count,
        }
    }

    #[test]
    fn slashing_boundary() -> Result<()> {
        let staking = MockStaking::with_bonded(&[10, 20]);
        let operators = staking.operators();
        let mut keeper = setup(staking.clone())?;

        // exactly at the minimum valid rate
        keeper.set_vote_penalty_counter(operators[0], counter(5, 3, 2))?;
        // one success fewer
        keeper.set_vote_penalty_counter(operators[1], counter(4, 3, 3))?;

        let mut ctx = Context::new(100, 0);
        keeper.slash_and_reset_counters(&mut ctx)?;

        let slashes = staking.slashes();
        assert_eq!(slashes.len(), 1);
        assert_eq!(slashes[0].operator, operators[1]);
        assert_eq!(slashes[0].infraction_height, 98);
        assert_eq!(slashes[0].power, 20);
        assert_eq!(slashes[0].fraction, dec!(0.01).into());
        assert!(staking.is_jailed(&operators[1]));
        assert!(!staking.is_jailed(&operators[0]));

        let events = ctx.events_of(EVENT_TYPE_END_SLASH_WINDOW);
        assert_eq!(events.len(), 2);
        assert_eq!(attribute(events[1], ATTRIBUTE_KEY_SUCCESS_COUNT), Some("4"));
        assert_eq!(attribute(events[1], ATTRIBUTE_KEY_MISS_COUNT), Some("3"));

        assert!(keeper.vote_penalty_counters()?.is_empty());
        Ok(())
    }

    #[test]
    fn unbonded_or_jailed_not_slashed() -> Result<()> {
        let mut staking = MockStaking::with_bonded(&[10, 10]);
        let operators = staking.operators();
        staking.set_bonded(&operators[0], false);
        staking.jail(&operators[1])?;
        let mut keeper = setup(staking.clone())?;

        keeper.set_vote_penalty_counter(operators[0], counter(0, 1, 0))?;
        keeper.set_vote_penalty_counter(operators[1], counter(0, 0, 1))?;

        let mut ctx = Context::new(100, 0);
        keeper.slash_and_reset_counters(&mut ctx)?;
        assert!(staking.slashes().is_empty());
        assert_eq!(ctx.events_of(EVENT_TYPE_END_SLASH_WINDOW).len(), 2);
        assert!(keeper.vote_penalty_counters()?.is_empty());
        Ok(())
    }

    #[test]
    fn zero_counter_is_skipped() -> Result<()> {
        let staking = MockStaking::with_bonded(&[10]);
        let operator = staking.operators()[0];
        let mut keeper = setup(staking.clone())?;
        keeper.set_vote_penalty_counter(operator, VotePenaltyCounter::default())?;

        let mut ctx = Context::new(100, 0);
        keeper.slash_and_reset_counters(&mut ctx)?;
        assert!(staking.slashes().is_empty());
        assert!(ctx.events.is_empty());
        assert!(keeper.vote_penalty_counters()?.is_empty());
        Ok(())
    }

    #[test]
    fn counters_reset_for_every_validator() -> Result<()> {
        let staking = MockStaking::with_bonded(&[10, 10, 10]);
        let mut keeper = setup(staking.clone())?;
        for (i, operator) in staking.operators().into_iter().enumerate() {
            keeper.set_vote_penalty_counter(operator, counter(i as u64 + 1, i as u64, 0))?;
        }
        keeper.slash_and_reset_counters(&mut Context::new(10, 0))?;
        for operator in staking.operators() {
            assert_eq!(keeper.vote_penalty_counter(&operator)?, Default::default());
        }
        Ok(())
    }

    #[test]
    fn excess_feeds_removed() -> Result<()> {
        let mut keeper = setup(MockStaking::new())?;
        let ctx = Context::new(1, 0);
        keeper.set_vote_target(Denom::new("uatom"))?;
        keeper.set_exchange_rate(&ctx, "uatom", Decimal::one())?;
        keeper.set_exchange_rate(&ctx, "uold", Decimal::one())?;

        keeper.remove_excess_feeds()?;
        let denoms: Vec<_> = keeper
            .exchange_rates()?
            .into_iter()
            .map(|(denom, _)| denom)
            .collect();
        assert_eq!(denoms, vec!["uatom"]);
        Ok(())
    }
}
