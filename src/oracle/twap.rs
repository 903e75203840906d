use std::collections::{BTreeMap, BTreeSet};

use super::keeper::Keeper;
use super::types::OracleTwap;
use crate::context::Context;
use crate::decimal::Decimal;
use crate::staking::{BankKeeper, StakingKeeper};
use crate::store::{Read, Write};
use crate::{Error, Result};

#[derive(Default)]
struct Accumulator {
    weighted_sum: Decimal,
    duration: i64,
}

impl<SK, BK, S> Keeper<SK, BK, S>
where
    SK: StakingKeeper,
    BK: BankKeeper,
    S: Read + Write,
{
    /// Lookbacks must be non-zero and no longer than the retained history.
    pub fn validate_lookback_seconds(&self, lookback_seconds: u64) -> Result<()> {
        let params = self.params()?;
        if lookback_seconds == 0 || lookback_seconds > params.lookback_duration {
            return Err(Error::InvalidTwapLookback);
        }
        Ok(())
    }

    /// Time-weighted average price of every vote target over the last
    /// `lookback_seconds`, sorted by denom.
    ///
    /// Snapshots are walked from newest to oldest. Each snapshot's rate is
    /// weighted by the time between it and the next newer snapshot of the same
    /// denom (or the block time for the newest). The first snapshot older than
    /// the window is clamped to the window boundary and ends the walk.
    pub fn calculate_twaps(&self, ctx: &Context, lookback_seconds: u64) -> Result<Vec<OracleTwap>> {
        self.validate_lookback_seconds(lookback_seconds)?;

        let now = ctx.unix_seconds();
        let lookback = i64::try_from(lookback_seconds).map_err(|_| Error::InvalidTwapLookback)?;
        let window_start = now.saturating_sub(lookback);
        let targets: BTreeSet<String> = self.vote_targets()?.into_iter().collect();
        let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

        for entry in self.price_snapshots.iter_rev() {
            let (_, snapshot) = entry?;

            let mut timestamp = snapshot.snapshot_timestamp;
            let older_than_window = timestamp < window_start;
            if older_than_window {
                timestamp = window_start;
            }
            let time_traversed = now - timestamp;

            for item in snapshot.price_snapshot_items {
                if !targets.contains(&item.denom) {
                    continue;
                }

                let acc = accumulators.entry(item.denom).or_default();
                let weight = item
                    .oracle_exchange_rate
                    .exchange_rate
                    .mul_int(time_traversed - acc.duration)?;
                acc.weighted_sum = acc.weighted_sum.checked_add(weight)?;
                acc.duration = time_traversed;
            }

            if older_than_window {
                break;
            }
        }

        if accumulators.is_empty() {
            return Err(Error::NoTwapData);
        }

        accumulators
            .into_iter()
            .map(|(denom, acc)| {
                let twap = if acc.duration == 0 {
                    Decimal::zero()
                } else {
                    acc.weighted_sum.quo_int(acc.duration)?
                };
                Ok(OracleTwap {
                    denom,
                    twap,
                    lookback_seconds: acc.duration,
                })
            })
            .collect()
    }
}
