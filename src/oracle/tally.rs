use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::ballot::{ClaimMap, ExchangeRateBallot};
use crate::decimal::Decimal;
use crate::Result;

/// Minimum ballot power for a denom to be priced:
/// `vote_threshold * total_bonded_power`, rounded half to even.
pub fn threshold_votes(vote_threshold: Decimal, total_bonded_power: i64) -> Result<i64> {
    vote_threshold.mul_int(total_bonded_power)?.round_to_i64()
}

/// Returns the ballot's power and whether it is non-zero and reaches the
/// threshold.
pub fn ballot_is_passing(ballot: &ExchangeRateBallot, threshold_votes: i64) -> (i64, bool) {
    let power = ballot.power();
    (power, power != 0 && power >= threshold_votes)
}

/// Picks the passing denom with the greatest ballot power as the reference
/// denom, breaking ties in favor of the lexicographically smaller denom.
///
/// Ballots for denoms which are not vote targets are dropped from `ballots`.
/// Ballots below the threshold are moved out of `ballots` into the returned
/// map, so after this call `ballots` only holds passing ballots.
pub fn pick_reference_denom(
    vote_targets: &BTreeSet<String>,
    ballots: &mut BTreeMap<String, ExchangeRateBallot>,
    threshold_votes: i64,
) -> (Option<String>, BTreeMap<String, ExchangeRateBallot>) {
    let mut below_threshold = BTreeMap::new();
    let mut reference: Option<(String, i64)> = None;

    let denoms: Vec<String> = ballots.keys().cloned().collect();
    for denom in denoms {
        if !vote_targets.contains(&denom) {
            ballots.remove(&denom);
            continue;
        }

        let (power, passing) = match ballots.get(&denom) {
            Some(ballot) => ballot_is_passing(ballot, threshold_votes),
            None => continue,
        };
        if !passing {
            if let Some(ballot) = ballots.remove(&denom) {
                below_threshold.insert(denom, ballot);
            }
            continue;
        }

        // denoms are visited in ascending order, so a tie keeps the earlier one
        let replace = match &reference {
            None => true,
            Some((_, highest)) => power > *highest,
        };
        if replace {
            reference = Some((denom, power));
        }
    }

    (reference.map(|(denom, _)| denom), below_threshold)
}

/// Computes the weighted median of a sorted ballot and credits every voter
/// whose rate lies within the reward spread of it.
///
/// The spread is the greater of the ballot's standard deviation and
/// `median * reward_band / 2`. Every voter in the ballot is marked as having
/// voted.
///
/// # Panics
///
/// Panics if the ballot is not sorted.
pub fn tally(ballot: &ExchangeRateBallot, reward_band: Decimal, claims: &mut ClaimMap) -> Decimal {
    let median = ballot.weighted_median();

    let standard_deviation = ballot.standard_deviation(median);
    let band_spread = reward_band
        .quo_int(2)
        .and_then(|half| median.checked_mul(half))
        .unwrap_or_default();
    let spread = standard_deviation.max(band_spread);

    for vote in ballot.votes() {
        let claim = match claims.get_mut(&vote.voter) {
            Some(claim) => claim,
            None => continue,
        };

        let within_band = vote
            .exchange_rate
            .checked_sub(median)
            .map(|deviation| deviation.abs() <= spread)
            .unwrap_or(false);
        if within_band {
            claim.weight += vote.power;
            claim.win_count += 1;
        }
        claim.did_vote = true;
    }

    debug!(
        "Tallied {} votes: median {}, spread {}",
        ballot.len(),
        median,
        spread
    );

    median
}
