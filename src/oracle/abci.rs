use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::ballot::{Claim, ClaimMap};
use super::keeper::Keeper;
use super::period::is_period_last_block;
use super::tally::{pick_reference_denom, tally, threshold_votes};
use super::types::{PriceSnapshot, PriceSnapshotItem};
use crate::context::Context;
use crate::staking::{BankKeeper, StakingKeeper};
use crate::store::{Read, Write};
use crate::Result;

/// Runs at the end of every block. At the last block of a vote period it
/// tallies the stored votes into exchange rates, updates penalty counters,
/// clears the votes, applies the whitelist and snapshots the current rates.
pub fn end_blocker<SK, BK, S>(keeper: &mut Keeper<SK, BK, S>, ctx: &mut Context) -> Result<()>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    let params = keeper.params()?;
    if !is_period_last_block(ctx.height, params.vote_period) {
        return Ok(());
    }

    let mut claims = ClaimMap::new();
    for validator in keeper.staking.validators_by_power()? {
        if validator.is_bonded() {
            claims.insert(
                validator.operator,
                Claim::new(validator.consensus_power, validator.operator),
            );
        }
    }

    let vote_targets: BTreeSet<String> = keeper.vote_targets()?.into_iter().collect();
    let mut ballots = keeper.organize_ballot_by_denom(&claims)?;

    let total_bonded_power = keeper.staking.total_bonded_power()?;
    let threshold = threshold_votes(params.vote_threshold, total_bonded_power)?;
    let (reference_denom, below_threshold) =
        pick_reference_denom(&vote_targets, &mut ballots, threshold);

    match reference_denom {
        Some(reference_denom) => {
            let reference_ballot = ballots
                .get(&reference_denom)
                .cloned()
                .unwrap_or_default();
            let reference_rates = reference_ballot.to_map();
            let reference_rate = reference_ballot.weighted_median();

            for (denom, ballot) in ballots.iter() {
                let is_reference = *denom == reference_denom;
                let ballot = if is_reference {
                    ballot.clone()
                } else {
                    ballot.to_cross_rate_with_sort(&reference_rates)
                };

                let mut exchange_rate = tally(&ballot, params.reward_band, &mut claims);
                if exchange_rate.is_zero() {
                    debug!("Skipping {}: tally produced a zero rate", denom);
                    continue;
                }

                if !is_reference {
                    exchange_rate = match reference_rate.checked_div(exchange_rate) {
                        Ok(rate) => rate,
                        Err(err) => {
                            warn!("Skipping {}: {}", denom, err);
                            continue;
                        }
                    };
                }

                keeper.set_exchange_rate_with_event(ctx, denom, exchange_rate)?;
            }
        }
        None => info!(
            "No ballot reached the threshold of {} votes at height {}",
            threshold, ctx.height
        ),
    }

    // below-threshold ballots are not priced but still count toward claims
    for ballot in below_threshold.values() {
        tally(ballot, params.reward_band, &mut claims);
    }

    let target_count = vote_targets.len() as i64;
    for claim in claims.values() {
        if claim.win_count == target_count {
            keeper.increment_success_count(claim.recipient)?;
        } else if !claim.did_vote {
            keeper.increment_abstain_count(claim.recipient)?;
        } else {
            keeper.increment_miss_count(claim.recipient)?;
        }
    }

    keeper.clear_aggregate_votes()?;
    keeper.apply_whitelist(&params.whitelist, &vote_targets)?;

    let items: Vec<PriceSnapshotItem> = keeper
        .exchange_rates()?
        .into_iter()
        .map(|(denom, oracle_exchange_rate)| PriceSnapshotItem {
            denom,
            oracle_exchange_rate,
        })
        .collect();
    if !items.is_empty() {
        keeper.add_price_snapshot(ctx, PriceSnapshot::new(ctx.unix_seconds(), items))?;
    }

    Ok(())
}

/// Runs at the beginning of every block. At the last block of a slash window
/// it slashes unreliable validators, resets all penalty counters and drops
/// exchange rates of retired denoms.
pub fn begin_blocker<SK, BK, S>(keeper: &mut Keeper<SK, BK, S>, ctx: &mut Context) -> Result<()>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    let params = keeper.params()?;
    if is_period_last_block(ctx.height, params.slash_window) {
        keeper.slash_and_reset_counters(ctx)?;
        keeper.remove_excess_feeds()?;
    }

    Ok(())
}
