use std::collections::BTreeSet;

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::period::BLOCKS_PER_DAY;
use super::types::Denom;
use crate::decimal::Decimal;
use crate::encoding::{Decode, Encode};
use crate::{Error, Result};

pub const DEFAULT_VOTE_PERIOD: u64 = 2;
pub const DEFAULT_SLASH_WINDOW: u64 = BLOCKS_PER_DAY * 2;
pub const DEFAULT_LOOKBACK_DURATION: u64 = 3600;
pub const DEFAULT_WHITELIST: [&str; 7] =
    ["ubtc", "ueth", "usol", "uxrp", "ubnb", "uusdt", "uusdc"];

/// Oracle module parameters. Only changed through a governance-authorized
/// update, and always validated before being stored.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Params {
    /// Blocks per vote period.
    pub vote_period: u64,
    /// Fraction of total bonded power a ballot needs to be priced.
    pub vote_threshold: Decimal,
    /// Width of the reward interval around the weighted median, as a
    /// fraction of the median.
    pub reward_band: Decimal,
    pub slash_fraction: Decimal,
    /// Blocks per slash window. A multiple of `vote_period`.
    pub slash_window: u64,
    pub min_valid_per_window: Decimal,
    /// Seconds of price snapshots to retain.
    pub lookback_duration: u64,
    pub whitelist: Vec<Denom>,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            vote_period: DEFAULT_VOTE_PERIOD,
            vote_threshold: dec!(0.667).into(),
            reward_band: dec!(0.02).into(),
            slash_fraction: Decimal::zero(),
            slash_window: DEFAULT_SLASH_WINDOW,
            min_valid_per_window: dec!(0.05).into(),
            lookback_duration: DEFAULT_LOOKBACK_DURATION,
            whitelist: DEFAULT_WHITELIST.iter().copied().map(Denom::new).collect(),
        }
    }
}

fn check_unit_interval(name: &str, value: Decimal) -> Result<()> {
    if value.is_negative() || value > Decimal::one() {
        return Err(Error::InvalidParams(format!(
            "{} must be between [0, 1], is {}",
            name, value
        )));
    }
    Ok(())
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        if self.vote_period == 0 {
            return Err(Error::InvalidParams("vote_period must be > 0".into()));
        }

        let min_threshold: Decimal = dec!(0.33).into();
        if self.vote_threshold <= min_threshold || self.vote_threshold > Decimal::one() {
            return Err(Error::InvalidParams(format!(
                "vote_threshold must be greater than 33 percent and at most 1, is {}",
                self.vote_threshold
            )));
        }

        check_unit_interval("reward_band", self.reward_band)?;
        check_unit_interval("slash_fraction", self.slash_fraction)?;

        if self.slash_window < self.vote_period {
            return Err(Error::InvalidParams(
                "slash_window must be greater than or equal to vote_period".into(),
            ));
        }
        if self.slash_window % self.vote_period != 0 {
            return Err(Error::InvalidParams(
                "slash_window must be divisible by vote_period".into(),
            ));
        }

        check_unit_interval("min_valid_per_window", self.min_valid_per_window)?;

        if self.lookback_duration == 0 {
            return Err(Error::InvalidParams("lookback_duration must be > 0".into()));
        }
        if i64::try_from(self.lookback_duration).is_err() {
            return Err(Error::InvalidParams(format!(
                "lookback_duration must fit in an i64, is {}",
                self.lookback_duration
            )));
        }

        let mut names = BTreeSet::new();
        for denom in self.whitelist.iter() {
            if denom.name.is_empty() {
                return Err(Error::InvalidParams("whitelist denom must have name".into()));
            }
            if denom.name.contains('\0') {
                return Err(Error::InvalidParams(format!(
                    "whitelist denom {:?} contains a NUL byte",
                    denom.name
                )));
            }
            if !names.insert(denom.name.as_str()) {
                return Err(Error::InvalidParams(format!(
                    "duplicated whitelist denom {}",
                    denom.name
                )));
            }
        }

        Ok(())
    }
}
