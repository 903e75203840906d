use std::collections::BTreeMap;

use log::debug;

use super::keeper::Keeper;
use crate::address::ValAddress;
use crate::decimal::Decimal;
use crate::staking::{BankKeeper, StakingKeeper};
use crate::store::{Read, Write};
use crate::Result;

/// Per-validator bookkeeping for one tally pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub power: i64,
    /// Power of votes which landed inside a reward band.
    pub weight: i64,
    pub win_count: i64,
    pub did_vote: bool,
    pub recipient: ValAddress,
}

impl Claim {
    pub fn new(power: i64, recipient: ValAddress) -> Self {
        Claim {
            power,
            weight: 0,
            win_count: 0,
            did_vote: false,
            recipient,
        }
    }
}

/// Claims of every bonded validator, keyed by operator address.
pub type ClaimMap = BTreeMap<ValAddress, Claim>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteForTally {
    pub denom: String,
    pub exchange_rate: Decimal,
    pub voter: ValAddress,
    pub power: i64,
}

impl VoteForTally {
    pub fn new(exchange_rate: Decimal, denom: impl Into<String>, voter: ValAddress, power: i64) -> Self {
        VoteForTally {
            denom: denom.into(),
            exchange_rate,
            voter,
            power,
        }
    }
}

/// All votes for one denom in the current vote period.
///
/// Most operations require the ballot to be sorted ascending by rate. Sorting
/// is stable, so votes with equal rates keep their organization order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExchangeRateBallot {
    votes: Vec<VoteForTally>,
}

impl From<Vec<VoteForTally>> for ExchangeRateBallot {
    fn from(votes: Vec<VoteForTally>) -> Self {
        ExchangeRateBallot { votes }
    }
}

impl ExchangeRateBallot {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, vote: VoteForTally) {
        self.votes.push(vote);
    }

    pub fn votes(&self) -> &[VoteForTally] {
        self.votes.as_slice()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn sort(&mut self) {
        self.votes.sort_by(|a, b| a.exchange_rate.cmp(&b.exchange_rate));
    }

    pub fn is_sorted(&self) -> bool {
        self.votes
            .windows(2)
            .all(|pair| pair[0].exchange_rate <= pair[1].exchange_rate)
    }

    /// Total voting power in the ballot.
    pub fn power(&self) -> i64 {
        self.votes.iter().map(|vote| vote.power).sum()
    }

    /// Voters with a strictly positive rate, mapped to that rate.
    pub fn to_map(&self) -> BTreeMap<ValAddress, Decimal> {
        self.votes
            .iter()
            .filter(|vote| vote.exchange_rate.is_positive())
            .map(|vote| (vote.voter, vote.exchange_rate))
            .collect()
    }

    /// Returns the rate of the first vote at which the accumulated power
    /// reaches half of the total power (floored), or zero for an empty ballot.
    ///
    /// # Panics
    ///
    /// Panics if the ballot is not sorted.
    pub fn weighted_median(&self) -> Decimal {
        if !self.is_sorted() {
            panic!("ballot must be sorted");
        }

        let total_power = self.power();
        let mut pivot = 0;
        for vote in self.votes.iter() {
            pivot += vote.power;
            if pivot >= total_power / 2 {
                return vote.exchange_rate;
            }
        }

        Decimal::zero()
    }

    /// Population standard deviation of the rates around `median`, weighting
    /// every vote equally. Degrades to zero if the computation overflows.
    pub fn standard_deviation(&self, median: Decimal) -> Decimal {
        if self.votes.is_empty() {
            return Decimal::zero();
        }

        let variance = || -> Result<Decimal> {
            let mut sum = Decimal::zero();
            for vote in self.votes.iter() {
                let deviation = vote.exchange_rate.checked_sub(median)?;
                sum = sum.checked_add(deviation.checked_mul(deviation)?)?;
            }
            sum.quo_int(self.votes.len() as i64)
        };

        match variance() {
            Ok(variance) => variance.sqrt().unwrap_or_default(),
            Err(err) => {
                debug!("Standard deviation fell back to zero: {}", err);
                Decimal::zero()
            }
        }
    }

    /// Re-expresses every vote relative to the voter's rate in `bases`, as
    /// `base / rate`. Votes without a base, with a non-positive rate or whose
    /// division overflows become abstentions with zero rate and power.
    pub fn to_cross_rate(&self, bases: &BTreeMap<ValAddress, Decimal>) -> ExchangeRateBallot {
        let votes = self
            .votes
            .iter()
            .map(|vote| {
                let mut vote = vote.clone();
                let cross_rate = match bases.get(&vote.voter) {
                    Some(base) if vote.exchange_rate.is_positive() => {
                        base.checked_div(vote.exchange_rate).ok()
                    }
                    _ => None,
                };
                match cross_rate {
                    Some(rate) => vote.exchange_rate = rate,
                    None => {
                        vote.exchange_rate = Decimal::zero();
                        vote.power = 0;
                    }
                }
                vote
            })
            .collect();

        ExchangeRateBallot { votes }
    }

    pub fn to_cross_rate_with_sort(
        &self,
        bases: &BTreeMap<ValAddress, Decimal>,
    ) -> ExchangeRateBallot {
        let mut ballot = self.to_cross_rate(bases);
        ballot.sort();
        ballot
    }
}

impl<SK, BK, S> Keeper<SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    /// Groups the stored votes of every claim holder into per-denom ballots,
    /// each sorted ascending by rate. Non-positive rates keep their ballot
    /// membership with zero power.
    pub fn organize_ballot_by_denom(
        &self,
        claims: &ClaimMap,
    ) -> Result<BTreeMap<String, ExchangeRateBallot>> {
        let mut ballots: BTreeMap<String, ExchangeRateBallot> = BTreeMap::new();

        for entry in self.aggregate_votes.iter() {
            let (voter, vote) = entry?;
            let claim = match claims.get(&voter) {
                Some(claim) => claim,
                None => continue,
            };

            for tuple in vote.exchange_rate_tuples {
                let power = if tuple.exchange_rate.is_positive() {
                    claim.power
                } else {
                    0
                };
                ballots
                    .entry(tuple.denom.clone())
                    .or_default()
                    .push(VoteForTally::new(tuple.exchange_rate, tuple.denom, voter, power));
            }
        }

        for ballot in ballots.values_mut() {
            ballot.sort();
        }

        Ok(ballots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn voter(n: u8) -> ValAddress {
        ValAddress::new([n; 20])
    }

    fn ballot(votes: &[(Decimal, i64)]) -> ExchangeRateBallot {
        votes
            .iter()
            .enumerate()
            .map(|(i, (rate, power))| VoteForTally::new(*rate, "uatom", voter(i as u8 + 1), *power))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn weighted_median() {
        let ballot = ballot(&[
            (dec!(1.0).into(), 10),
            (dec!(2.0).into(), 10),
            (dec!(3.0).into(), 100),
        ]);
        assert_eq!(ballot.power(), 120);
        assert_eq!(ballot.weighted_median(), dec!(3.0).into());

        let ballot = ballot_of_equal_powers();
        // pivot reaches floor(30 / 2) = 15 at the second vote
        assert_eq!(ballot.weighted_median(), dec!(2.0).into());
    }

    fn ballot_of_equal_powers() -> ExchangeRateBallot {
        ballot(&[
            (dec!(1.0).into(), 10),
            (dec!(2.0).into(), 10),
            (dec!(3.0).into(), 10),
        ])
    }

    #[test]
    fn weighted_median_of_empty_ballot_is_zero() {
        assert_eq!(ExchangeRateBallot::new().weighted_median(), Decimal::zero());
    }

    #[test]
    #[should_panic(expected = "ballot must be sorted")]
    fn weighted_median_unsorted_panics() {
        let ballot = ballot(&[(dec!(2.0).into(), 10), (dec!(1.0).into(), 10)]);
        ballot.weighted_median();
    }

    #[test]
    fn sort_orders_by_rate() {
        let mut ballot = ballot(&[
            (dec!(3.0).into(), 1),
            (dec!(1.0).into(), 2),
            (dec!(2.0).into(), 3),
        ]);
        assert!(!ballot.is_sorted());
        ballot.sort();
        assert!(ballot.is_sorted());
        let powers: Vec<_> = ballot.votes().iter().map(|v| v.power).collect();
        assert_eq!(powers, vec![2, 3, 1]);
    }

    #[test]
    fn standard_deviation() {
        let ballot = ballot(&[(dec!(1.0).into(), 1), (dec!(3.0).into(), 1)]);
        // mean squared deviation around 2 is 1
        assert_eq!(ballot.standard_deviation(dec!(2.0).into()), Decimal::one());

        let flat = ballot_of_equal_powers();
        assert!(flat.standard_deviation(dec!(2.0).into()).is_positive());
        assert!(ExchangeRateBallot::new()
            .standard_deviation(Decimal::one())
            .is_zero());
    }

    #[test]
    fn standard_deviation_overflow_is_zero() {
        let max: Decimal = rust_decimal::Decimal::MAX.into();
        let ballot = ballot(&[(max, 1)]);
        assert!(ballot.standard_deviation(Decimal::zero()).is_zero());
    }

    #[test]
    fn to_map_skips_non_positive() {
        let ballot = ballot(&[(Decimal::zero(), 10), (dec!(2.0).into(), 10)]);
        let map = ballot.to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&voter(2)), Some(&dec!(2.0).into()));
    }

    #[test]
    fn cross_rate_identity() {
        let reference = ballot(&[(dec!(100).into(), 10), (dec!(100).into(), 10)]);
        let bases = reference.to_map();

        let mut votes = ballot(&[
            (dec!(4).into(), 10),
            (dec!(4).into(), 10),
            (dec!(4).into(), 10),
        ]);
        votes.sort();

        let cross = votes.to_cross_rate(&bases);
        let expected: Decimal = dec!(25).into();
        assert_eq!(cross.votes()[0].exchange_rate, expected);
        assert_eq!(cross.votes()[1].exchange_rate, expected);
        assert_eq!(cross.votes()[0].power, 10);

        // the third voter has no reference rate
        assert!(cross.votes()[2].exchange_rate.is_zero());
        assert_eq!(cross.votes()[2].power, 0);
    }

    #[test]
    fn cross_rate_zero_rate_abstains() {
        let bases: BTreeMap<_, _> = vec![(voter(1), Decimal::one())].into_iter().collect();
        let votes = ballot(&[(Decimal::zero(), 10)]);
        let cross = votes.to_cross_rate_with_sort(&bases);
        assert!(cross.votes()[0].exchange_rate.is_zero());
        assert_eq!(cross.votes()[0].power, 0);
    }

    #[test]
    fn cross_rate_overflow_abstains() {
        let max: Decimal = rust_decimal::Decimal::MAX.into();
        let bases: BTreeMap<_, _> = vec![(voter(1), max)].into_iter().collect();
        let votes = ballot(&[(dec!(0.0001).into(), 10)]);
        let cross = votes.to_cross_rate_with_sort(&bases);
        assert!(cross.votes()[0].exchange_rate.is_zero());
        assert_eq!(cross.votes()[0].power, 0);
        assert!(cross.is_sorted());
    }
}
