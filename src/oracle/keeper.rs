use std::collections::BTreeSet;

use log::{debug, info};

use super::params::Params;
use super::types::{
    AggregateExchangeRateVote, Denom, OracleExchangeRate, PriceSnapshot, VotePenaltyCounter,
};
use super::{
    ATTRIBUTE_KEY_DENOM, ATTRIBUTE_KEY_EXCHANGE_RATE, EVENT_TYPE_EXCHANGE_RATE_UPDATE,
    MODULE_NAME,
};
use crate::address::{AccAddress, ValAddress};
use crate::collections::{Map, Value};
use crate::context::Context;
use crate::decimal::Decimal;
use crate::staking::{AccountKeeper, BankKeeper, Metadata, StakingKeeper};
use crate::store::{DefaultBackingStore, Read, Store, Write};
use crate::{Error, Result};

const PARAMS_PREFIX: u8 = 0;
const EXCHANGE_RATE_PREFIX: u8 = 1;
const FEEDER_DELEGATION_PREFIX: u8 = 2;
const VOTE_PENALTY_COUNTER_PREFIX: u8 = 3;
const AGGREGATE_VOTE_PREFIX: u8 = 4;
const VOTE_TARGET_PREFIX: u8 = 5;
const PRICE_SNAPSHOT_PREFIX: u8 = 6;
const SPAM_PREVENTION_PREFIX: u8 = 7;

/// Owns the oracle's state and the staking and bank capabilities it consumes.
///
/// Every table lives under its own one-byte prefix of the backing store.
pub struct Keeper<SK, BK, S = DefaultBackingStore> {
    pub(super) params: Value<Params, S>,
    pub(super) exchange_rates: Map<Denom, OracleExchangeRate, S>,
    pub(super) feeder_delegations: Map<ValAddress, AccAddress, S>,
    pub(super) vote_penalty_counters: Map<ValAddress, VotePenaltyCounter, S>,
    pub(super) aggregate_votes: Map<ValAddress, AggregateExchangeRateVote, S>,
    pub(super) vote_targets: Map<Denom, (), S>,
    pub(super) price_snapshots: Map<i64, PriceSnapshot, S>,
    pub(super) spam_prevention: Map<ValAddress, i64, S>,

    pub(super) staking: SK,
    pub(super) bank: BK,
    authority: AccAddress,
}

impl<SK, BK, S> Keeper<SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    /// Creates a keeper over `store`.
    ///
    /// # Panics
    ///
    /// Panics if the oracle module account has not been created.
    pub fn new<AK: AccountKeeper>(
        store: Store<S>,
        accounts: &AK,
        bank: BK,
        staking: SK,
        authority: AccAddress,
    ) -> Self {
        if accounts.module_address(MODULE_NAME).is_none() {
            panic!("{} module account has not been set", MODULE_NAME);
        }

        Keeper {
            params: Value::new(store.sub(&[PARAMS_PREFIX])),
            exchange_rates: Map::new(store.sub(&[EXCHANGE_RATE_PREFIX])),
            feeder_delegations: Map::new(store.sub(&[FEEDER_DELEGATION_PREFIX])),
            vote_penalty_counters: Map::new(store.sub(&[VOTE_PENALTY_COUNTER_PREFIX])),
            aggregate_votes: Map::new(store.sub(&[AGGREGATE_VOTE_PREFIX])),
            vote_targets: Map::new(store.sub(&[VOTE_TARGET_PREFIX])),
            price_snapshots: Map::new(store.sub(&[PRICE_SNAPSHOT_PREFIX])),
            spam_prevention: Map::new(store.sub(&[SPAM_PREVENTION_PREFIX])),
            staking,
            bank,
            authority,
        }
    }

    /// The governance account allowed to update params.
    pub fn authority(&self) -> AccAddress {
        self.authority
    }

    pub fn staking(&self) -> &SK {
        &self.staking
    }

    pub fn params(&self) -> Result<Params> {
        self.params
            .maybe_get()?
            .ok_or_else(|| Error::NotFound("params".into()))
    }

    pub fn set_params(&mut self, params: &Params) -> Result<()> {
        params.validate()?;
        self.params.set(params)
    }

    // exchange rates

    pub fn exchange_rate(&self, denom: &str) -> Result<OracleExchangeRate> {
        self.exchange_rates
            .get(&Denom::new(denom))?
            .ok_or_else(|| Error::NotFound(format!("exchange rate for {}", denom)))
    }

    /// Stores `exchange_rate` for `denom`, stamped with the current block.
    pub fn set_exchange_rate(
        &mut self,
        ctx: &Context,
        denom: &str,
        exchange_rate: Decimal,
    ) -> Result<()> {
        let rate = OracleExchangeRate {
            exchange_rate,
            last_update: ctx.height,
            last_update_timestamp: ctx.time_millis,
        };
        self.exchange_rates.insert(Denom::new(denom), rate)
    }

    pub fn set_exchange_rate_with_event(
        &mut self,
        ctx: &mut Context,
        denom: &str,
        exchange_rate: Decimal,
    ) -> Result<()> {
        self.set_exchange_rate(ctx, denom, exchange_rate)?;
        debug!("Exchange rate of {} updated to {}", denom, exchange_rate);
        ctx.emit_event(
            EVENT_TYPE_EXCHANGE_RATE_UPDATE,
            &[
                (ATTRIBUTE_KEY_DENOM, denom.to_string()),
                (ATTRIBUTE_KEY_EXCHANGE_RATE, exchange_rate.to_string()),
            ],
        );
        Ok(())
    }

    pub fn delete_exchange_rate(&mut self, denom: &str) -> Result<()> {
        self.exchange_rates.remove(&Denom::new(denom))?;
        Ok(())
    }

    /// Every stored exchange rate, sorted by denom.
    pub fn exchange_rates(&self) -> Result<Vec<(String, OracleExchangeRate)>> {
        self.exchange_rates
            .iter()
            .map(|entry| entry.map(|(denom, rate)| (denom.name, rate)))
            .collect()
    }

    // feeder delegation

    /// The account allowed to vote for `validator`, defaulting to the
    /// validator's own account.
    pub fn feeder_delegation(&self, validator: &ValAddress) -> Result<AccAddress> {
        Ok(self
            .feeder_delegations
            .get(validator)?
            .unwrap_or_else(|| (*validator).into()))
    }

    pub fn set_feeder_delegation(
        &mut self,
        validator: ValAddress,
        feeder: AccAddress,
    ) -> Result<()> {
        self.feeder_delegations.insert(validator, feeder)
    }

    pub fn feeder_delegations(&self) -> Result<Vec<(ValAddress, AccAddress)>> {
        self.feeder_delegations.iter().collect()
    }

    /// Checks that `feeder` may vote for `validator` and that the validator
    /// is bonded.
    pub fn validate_feeder(&self, feeder: &AccAddress, validator: &ValAddress) -> Result<()> {
        if feeder.bytes() != validator.bytes() {
            let delegate = self.feeder_delegation(validator)?;
            if delegate != *feeder {
                return Err(Error::NoVotingPermission(feeder.to_string()));
            }
        }

        match self.staking.validator(validator)? {
            Some(v) if v.is_bonded() => Ok(()),
            Some(_) => Err(Error::NoValidatorFound(format!(
                "validator {} is not in the active set",
                validator
            ))),
            None => Err(Error::NoValidatorFound(format!(
                "validator {} not found",
                validator
            ))),
        }
    }

    // vote penalty counters

    pub fn vote_penalty_counter(&self, operator: &ValAddress) -> Result<VotePenaltyCounter> {
        Ok(self
            .vote_penalty_counters
            .get(operator)?
            .unwrap_or_default())
    }

    pub fn set_vote_penalty_counter(
        &mut self,
        operator: ValAddress,
        counter: VotePenaltyCounter,
    ) -> Result<()> {
        self.vote_penalty_counters.insert(operator, counter)
    }

    fn update_vote_penalty_counter(
        &mut self,
        operator: ValAddress,
        f: impl FnOnce(&mut VotePenaltyCounter),
    ) -> Result<()> {
        let mut counter = self.vote_penalty_counter(&operator)?;
        f(&mut counter);
        self.set_vote_penalty_counter(operator, counter)
    }

    pub fn increment_miss_count(&mut self, operator: ValAddress) -> Result<()> {
        self.update_vote_penalty_counter(operator, |c| c.miss_count += 1)
    }

    pub fn increment_abstain_count(&mut self, operator: ValAddress) -> Result<()> {
        self.update_vote_penalty_counter(operator, |c| c.abstain_count += 1)
    }

    pub fn increment_success_count(&mut self, operator: ValAddress) -> Result<()> {
        self.update_vote_penalty_counter(operator, |c| c.success_count += 1)
    }

    pub fn delete_vote_penalty_counter(&mut self, operator: &ValAddress) -> Result<()> {
        self.vote_penalty_counters.remove(operator)?;
        Ok(())
    }

    pub fn vote_penalty_counters(&self) -> Result<Vec<(ValAddress, VotePenaltyCounter)>> {
        self.vote_penalty_counters.iter().collect()
    }

    // aggregate votes

    pub fn aggregate_vote(&self, voter: &ValAddress) -> Result<Option<AggregateExchangeRateVote>> {
        self.aggregate_votes.get(voter)
    }

    pub fn set_aggregate_vote(
        &mut self,
        voter: ValAddress,
        vote: AggregateExchangeRateVote,
    ) -> Result<()> {
        self.aggregate_votes.insert(voter, vote)
    }

    pub fn delete_aggregate_vote(&mut self, voter: &ValAddress) -> Result<()> {
        self.aggregate_votes.remove(voter)?;
        Ok(())
    }

    pub fn aggregate_votes(&self) -> Result<Vec<(ValAddress, AggregateExchangeRateVote)>> {
        self.aggregate_votes.iter().collect()
    }

    pub fn clear_aggregate_votes(&mut self) -> Result<()> {
        self.aggregate_votes.clear()
    }

    // vote targets

    /// Current vote targets, sorted.
    pub fn vote_targets(&self) -> Result<Vec<String>> {
        Ok(self
            .vote_targets
            .keys()?
            .into_iter()
            .map(|denom| denom.name)
            .collect())
    }

    pub fn is_vote_target(&self, denom: &str) -> Result<bool> {
        self.vote_targets.contains_key(&Denom::new(denom))
    }

    pub fn set_vote_target(&mut self, denom: Denom) -> Result<()> {
        self.vote_targets.insert(denom, ())
    }

    /// Rewrites the vote targets from `whitelist` if they differ from
    /// `vote_targets`, registering bank metadata for denoms which have none.
    pub fn apply_whitelist(
        &mut self,
        whitelist: &[Denom],
        vote_targets: &BTreeSet<String>,
    ) -> Result<()> {
        let update_required = vote_targets.len() != whitelist.len()
            || whitelist
                .iter()
                .any(|denom| !vote_targets.contains(&denom.name));
        if !update_required {
            return Ok(());
        }

        info!("Applying oracle whitelist of {} denoms", whitelist.len());
        self.vote_targets.clear()?;
        for denom in whitelist {
            self.set_vote_target(denom.clone())?;
            if self.bank.denom_metadata(&denom.name)?.is_none() {
                self.bank
                    .set_denom_metadata(Metadata::for_base_denom(&denom.name))?;
            }
        }

        Ok(())
    }

    // price snapshots

    pub fn price_snapshot(&self, timestamp: i64) -> Result<Option<PriceSnapshot>> {
        self.price_snapshots.get(&timestamp)
    }

    /// Stores a snapshot, then prunes every snapshot which has fallen out of
    /// the lookback window relative to the block time.
    pub fn add_price_snapshot(&mut self, ctx: &Context, snapshot: PriceSnapshot) -> Result<()> {
        let lookback_duration = self.params()?.lookback_duration;
        let lookback = i64::try_from(lookback_duration).map_err(|_| {
            Error::InvalidParams(format!(
                "lookback_duration {} does not fit in an i64",
                lookback_duration
            ))
        })?;
        let now = ctx.unix_seconds();

        self.price_snapshots
            .insert(snapshot.snapshot_timestamp, snapshot)?;

        let mut expired = Vec::new();
        for entry in self.price_snapshots.iter() {
            let (timestamp, _) = entry?;
            if timestamp.saturating_add(lookback) >= now {
                break;
            }
            expired.push(timestamp);
        }
        for timestamp in expired {
            self.price_snapshots.remove(&timestamp)?;
        }

        Ok(())
    }

    /// Every retained snapshot, oldest first.
    pub fn price_snapshots(&self) -> Result<Vec<PriceSnapshot>> {
        self.price_snapshots
            .iter()
            .map(|entry| entry.map(|(_, snapshot)| snapshot))
            .collect()
    }

    // spam prevention

    pub fn spam_prevention_counter(&self, validator: &ValAddress) -> Result<Option<i64>> {
        self.spam_prevention.get(validator)
    }

    /// Records that `validator` voted at the current block height.
    pub fn set_spam_prevention_counter(
        &mut self,
        ctx: &Context,
        validator: ValAddress,
    ) -> Result<()> {
        self.spam_prevention.insert(validator, ctx.height)
    }
}
