use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::ValAddress;
use crate::decimal::Decimal;
use crate::encoding::{decode_str, encode_str, str_encoding_length, Decode, Encode, Terminated};
use crate::{Error, Result};

/// A whitelisted asset which validators are expected to price.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Denom {
    pub name: String,
}

impl Encode for Denom {
    fn encode_into<W: Write>(&self, dest: &mut W) -> ed::Result<()> {
        encode_str(&self.name, dest)
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(str_encoding_length(&self.name))
    }
}

impl Decode for Denom {
    fn decode<R: Read>(input: R) -> ed::Result<Self> {
        Ok(Denom {
            name: decode_str(input)?,
        })
    }
}

impl Terminated for Denom {}

impl Denom {
    pub fn new(name: impl Into<String>) -> Self {
        Denom { name: name.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateTuple {
    pub denom: String,
    pub exchange_rate: Decimal,
}

impl Encode for ExchangeRateTuple {
    fn encode_into<W: Write>(&self, dest: &mut W) -> ed::Result<()> {
        encode_str(&self.denom, dest)?;
        self.exchange_rate.encode_into(dest)
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(str_encoding_length(&self.denom) + self.exchange_rate.encoding_length()?)
    }
}

impl Decode for ExchangeRateTuple {
    fn decode<R: Read>(mut input: R) -> ed::Result<Self> {
        Ok(ExchangeRateTuple {
            denom: decode_str(&mut input)?,
            exchange_rate: Decimal::decode(input)?,
        })
    }
}

impl Terminated for ExchangeRateTuple {}

impl ExchangeRateTuple {
    pub fn new(denom: impl Into<String>, exchange_rate: Decimal) -> Self {
        ExchangeRateTuple {
            denom: denom.into(),
            exchange_rate,
        }
    }
}

/// Parses a comma-separated list of `<rate><denom>` items, e.g.
/// `"1700.5uatom,0.2ueth"`.
///
/// Rates are not sign-checked here. A numeral too large for a decimal is
/// reported as `InvalidExchangeRate`, any other malformed input as
/// `InvalidRequest`.
pub fn parse_exchange_rate_tuples(rates: &str) -> Result<Vec<ExchangeRateTuple>> {
    let rates = rates.trim();
    if rates.is_empty() {
        return Err(Error::InvalidRequest("empty exchange rates".into()));
    }

    let mut tuples = Vec::new();
    let mut seen = BTreeSet::new();
    for item in rates.split(',') {
        let item = item.trim();
        let split = item
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| Error::InvalidRequest(format!("missing denom in {:?}", item)))?;
        let (amount, denom) = item.split_at(split);
        if amount.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "missing exchange rate in {:?}",
                item
            )));
        }

        let exchange_rate = Decimal::from_str(amount).map_err(|_| {
            let numeral = amount
                .trim_start_matches(['-', '+'])
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.');
            if numeral {
                Error::InvalidExchangeRate(format!("overflow exchange rate {}", amount))
            } else {
                Error::InvalidRequest(format!("invalid exchange rate {:?}", amount))
            }
        })?;

        if !seen.insert(denom.to_string()) {
            return Err(Error::InvalidRequest(format!("duplicated denom {}", denom)));
        }
        tuples.push(ExchangeRateTuple::new(denom, exchange_rate));
    }

    Ok(tuples)
}

/// One validator's submission for the current vote period.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AggregateExchangeRateVote {
    pub voter: ValAddress,
    pub exchange_rate_tuples: Vec<ExchangeRateTuple>,
}

impl AggregateExchangeRateVote {
    pub fn new(exchange_rate_tuples: Vec<ExchangeRateTuple>, voter: ValAddress) -> Self {
        AggregateExchangeRateVote {
            exchange_rate_tuples,
            voter,
        }
    }
}

/// The canonical price of a denom and when it was last set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct OracleExchangeRate {
    pub exchange_rate: Decimal,
    /// Block height of the last update.
    pub last_update: i64,
    /// Block time of the last update, in Unix milliseconds.
    pub last_update_timestamp: i64,
}


#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshotItem {
    pub denom: String,
    pub oracle_exchange_rate: OracleExchangeRate,
}

impl Encode for PriceSnapshotItem {
    fn encode_into<W: Write>(&self, dest: &mut W) -> ed::Result<()> {
        encode_str(&self.denom, dest)?;
        self.oracle_exchange_rate.encode_into(dest)
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(str_encoding_length(&self.denom) + self.oracle_exchange_rate.encoding_length()?)
    }
}

impl Decode for PriceSnapshotItem {
    fn decode<R: Read>(mut input: R) -> ed::Result<Self> {
        Ok(PriceSnapshotItem {
            denom: decode_str(&mut input)?,
            oracle_exchange_rate: OracleExchangeRate::decode(input)?,
        })
    }
}

impl Terminated for PriceSnapshotItem {}

/// Every stored exchange rate at one block time, in Unix seconds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub snapshot_timestamp: i64,
    pub price_snapshot_items: Vec<PriceSnapshotItem>,
}

impl PriceSnapshot {
    pub fn new(snapshot_timestamp: i64, price_snapshot_items: Vec<PriceSnapshotItem>) -> Self {
        PriceSnapshot {
            snapshot_timestamp,
            price_snapshot_items,
        }
    }
}

/// Per-validator vote outcomes over the current slash window. A zero counter
/// is equivalent to an absent one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct VotePenaltyCounter {
    pub miss_count: u64,
    pub abstain_count: u64,
    pub success_count: u64,
}

impl VotePenaltyCounter {
    pub fn total(&self) -> u64 {
        self.miss_count + self.abstain_count + self.success_count
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleTwap {
    pub denom: String,
    pub twap: Decimal,
    pub lookback_seconds: i64,
}
