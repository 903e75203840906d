use serde::{Deserialize, Serialize};

use super::keeper::Keeper;
use super::params::Params;
use super::types::{AggregateExchangeRateVote, OracleExchangeRate, OracleTwap, PriceSnapshot, VotePenaltyCounter};
use crate::address::{AccAddress, ValAddress};
use crate::context::Context;
use crate::staking::{BankKeeper, StakingKeeper};
use crate::store::{Read, Write};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomOracleExchangeRate {
    pub denom: String,
    pub oracle_exchange_rate: OracleExchangeRate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashWindowProgress {
    /// Vote periods elapsed in the current slash window.
    pub window_progress: u64,
}

fn parse_validator(address: &str) -> Result<ValAddress> {
    address
        .parse()
        .map_err(|err| Error::InvalidAddress(format!("{}", err)))
}

/// Read-only entry points for query adapters. Validator addresses arrive in
/// their bech32 form.
impl<SK, BK, S> Keeper<SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    pub fn query_exchange_rate(&self, denom: &str) -> Result<OracleExchangeRate> {
        if denom.is_empty() {
            return Err(Error::InvalidRequest("empty denom".into()));
        }
        self.exchange_rate(denom)
    }

    pub fn query_exchange_rates(&self) -> Result<Vec<DenomOracleExchangeRate>> {
        Ok(self
            .exchange_rates()?
            .into_iter()
            .map(|(denom, oracle_exchange_rate)| DenomOracleExchangeRate {
                denom,
                oracle_exchange_rate,
            })
            .collect())
    }

    /// Denoms which currently have an exchange rate.
    pub fn query_actives(&self) -> Result<Vec<String>> {
        Ok(self
            .exchange_rates()?
            .into_iter()
            .map(|(denom, _)| denom)
            .collect())
    }

    pub fn query_vote_targets(&self) -> Result<Vec<String>> {
        self.vote_targets()
    }

    pub fn query_twaps(&self, ctx: &Context, lookback_seconds: u64) -> Result<Vec<OracleTwap>> {
        self.calculate_twaps(ctx, lookback_seconds)
    }

    pub fn query_price_snapshot_history(&self) -> Result<Vec<PriceSnapshot>> {
        self.price_snapshots()
    }

    pub fn query_feeder_delegation(&self, validator: &str) -> Result<AccAddress> {
        self.feeder_delegation(&parse_validator(validator)?)
    }

    pub fn query_vote_penalty_counter(&self, validator: &str) -> Result<VotePenaltyCounter> {
        self.vote_penalty_counter(&parse_validator(validator)?)
    }

    pub fn query_aggregate_vote(&self, validator: &str) -> Result<AggregateExchangeRateVote> {
        self.aggregate_vote(&parse_validator(validator)?)?
            .ok_or_else(|| Error::NotFound(format!("aggregate vote of {}", validator)))
    }

    pub fn query_aggregate_votes(&self) -> Result<Vec<AggregateExchangeRateVote>> {
        Ok(self
            .aggregate_votes()?
            .into_iter()
            .map(|(_, vote)| vote)
            .collect())
    }

    pub fn query_slash_window(&self, ctx: &Context) -> Result<SlashWindowProgress> {
        let params = self.params()?;
        let height = ctx.height.max(0) as u64;
        Ok(SlashWindowProgress {
            window_progress: (height % params.slash_window) / params.vote_period,
        })
    }

    pub fn query_params(&self) -> Result<Params> {
        self.params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAccounts, MockBank, MockStaking};
    use crate::oracle::MODULE_NAME;
    use crate::store::{MapStore, Shared, Store};
    use rust_decimal_macros::dec;

    fn setup() -> Result<Keeper<MockStaking, MockBank>> {
        let accounts = MockAccounts::with_module(MODULE_NAME, AccAddress::new([99; 20]));
        let mut keeper = Keeper::new(
            Store::new(Shared::new(MapStore::new())),
            &accounts,
            MockBank::new(),
            MockStaking::new(),
            AccAddress::new([100; 20]),
        );
        keeper.set_params(&Params {
            vote_period: 10,
            slash_window: 100,
            ..Default::default()
        })?;
        Ok(keeper)
    }

    #[test]
    fn exchange_rates_sorted() -> Result<()> {
        let mut keeper = setup()?;
        let ctx = Context::new(1, 0);
        keeper.set_exchange_rate(&ctx, "ueth", dec!(2).into())?;
        keeper.set_exchange_rate(&ctx, "uatom", dec!(1).into())?;

        let denoms: Vec<_> = keeper
            .query_exchange_rates()?
            .into_iter()
            .map(|r| r.denom)
            .collect();
        assert_eq!(denoms, vec!["uatom", "ueth"]);
        assert_eq!(keeper.query_actives()?, vec!["uatom", "ueth"]);
        assert!(matches!(
            keeper.query_exchange_rate("ubtc"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            keeper.query_exchange_rate(""),
            Err(Error::InvalidRequest(_))
        ));
        Ok(())
    }

    #[test]
    fn slash_window_progress() -> Result<()> {
        let keeper = setup()?;
        let progress = keeper.query_slash_window(&Context::new(235, 0))?;
        assert_eq!(progress.window_progress, 3);
        Ok(())
    }

    #[test]
    fn penalty_counter_defaults_to_zero() -> Result<()> {
        let keeper = setup()?;
        let validator = ValAddress::new([3; 20]).to_string();
        assert_eq!(
            keeper.query_vote_penalty_counter(&validator)?,
            VotePenaltyCounter::default()
        );
        assert!(matches!(
            keeper.query_vote_penalty_counter("bogus"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            keeper.query_aggregate_vote(&validator),
            Err(Error::NotFound(_))
        ));
        Ok(())
    }
}
