use serde::{Deserialize, Serialize};

use super::keeper::Keeper;
use super::params::Params;
use super::types::{
    AggregateExchangeRateVote, ExchangeRateTuple, PriceSnapshot, VotePenaltyCounter,
};
use crate::address::{AccAddress, ValAddress};
use crate::context::Context;
use crate::staking::{BankKeeper, StakingKeeper};
use crate::store::{Read, Write};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeederDelegation {
    pub validator_address: ValAddress,
    pub feeder_address: AccAddress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyCounter {
    pub validator_address: ValAddress,
    pub vote_penalty_counter: VotePenaltyCounter,
}

/// The oracle's state at chain start or export, in JSON form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisState {
    pub params: Params,
    pub exchange_rates: Vec<ExchangeRateTuple>,
    pub feeder_delegations: Vec<FeederDelegation>,
    pub penalty_counters: Vec<PenaltyCounter>,
    pub aggregate_exchange_rate_votes: Vec<AggregateExchangeRateVote>,
    pub price_snapshots: Vec<PriceSnapshot>,
}

impl GenesisState {
    pub fn validate(&self) -> Result<()> {
        self.params
            .validate()
            .map_err(|err| Error::InvalidGenesis(err.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<SK, BK, S> Keeper<SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    /// Loads `genesis` into an empty store. The whitelist becomes the initial
    /// set of vote targets.
    pub fn init_genesis(&mut self, ctx: &Context, genesis: &GenesisState) -> Result<()> {
        genesis.validate()?;
        self.set_params(&genesis.params)?;

        for denom in genesis.params.whitelist.iter() {
            self.set_vote_target(denom.clone())?;
        }

        for delegation in genesis.feeder_delegations.iter() {
            self.set_feeder_delegation(delegation.validator_address, delegation.feeder_address)?;
        }

        for tuple in genesis.exchange_rates.iter() {
            self.set_exchange_rate(ctx, &tuple.denom, tuple.exchange_rate)?;
        }

        for counter in genesis.penalty_counters.iter() {
            self.set_vote_penalty_counter(counter.validator_address, counter.vote_penalty_counter)?;
        }

        for vote in genesis.aggregate_exchange_rate_votes.iter() {
            self.set_aggregate_vote(vote.voter, vote.clone())?;
        }

        for snapshot in genesis.price_snapshots.iter() {
            self.add_price_snapshot(ctx, snapshot.clone())?;
        }

        Ok(())
    }

    pub fn export_genesis(&self) -> Result<GenesisState> {
        let feeder_delegations = self
            .feeder_delegations()?
            .into_iter()
            .map(|(validator_address, feeder_address)| FeederDelegation {
                validator_address,
                feeder_address,
            })
            .collect();

        let exchange_rates = self
            .exchange_rates()?
            .into_iter()
            .map(|(denom, rate)| ExchangeRateTuple::new(denom, rate.exchange_rate))
            .collect();

        let penalty_counters = self
            .vote_penalty_counters()?
            .into_iter()
            .map(|(validator_address, vote_penalty_counter)| PenaltyCounter {
                validator_address,
                vote_penalty_counter,
            })
            .collect();

        let aggregate_exchange_rate_votes = self
            .aggregate_votes()?
            .into_iter()
            .map(|(_, vote)| vote)
            .collect();

        Ok(GenesisState {
            params: self.params()?,
            exchange_rates,
            feeder_delegations,
            penalty_counters,
            aggregate_exchange_rate_votes,
            price_snapshots: self.price_snapshots()?,
        })
    }
}
