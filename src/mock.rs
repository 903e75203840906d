//! In-memory staking, bank and account implementations for tests.

use std::collections::BTreeMap;

use crate::address::{AccAddress, ValAddress};
use crate::decimal::Decimal;
use crate::staking::{AccountKeeper, BankKeeper, Metadata, StakingKeeper, Validator};
use crate::store::Shared;
use crate::{Error, Result};

/// A recorded call to `StakingKeeper::slash`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashRecord {
    pub operator: ValAddress,
    pub infraction_height: i64,
    pub power: i64,
    pub fraction: Decimal,
}

#[derive(Default)]
struct StakingState {
    validators: BTreeMap<ValAddress, Validator>,
    slashes: Vec<SlashRecord>,
}

/// A staking module stand-in. Clones share state, so a test can keep a handle
/// after moving one into the keeper.
#[derive(Clone, Default)]
pub struct MockStaking {
    state: Shared<StakingState>,
}

impl MockStaking {
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a staking mock with one bonded validator per power, with
    /// operator bytes `[i; 20]` for the i-th power (starting at 1).
    pub fn with_bonded(powers: &[i64]) -> Self {
        let mut staking = Self::new();
        for (i, power) in powers.iter().enumerate() {
            staking.add_validator(ValAddress::new([i as u8 + 1; 20]), *power, true);
        }
        staking
    }

    pub fn add_validator(&mut self, operator: ValAddress, consensus_power: i64, bonded: bool) {
        self.state.with_mut(|state| {
            state.validators.insert(
                operator,
                Validator {
                    operator,
                    consensus_power,
                    bonded,
                    jailed: false,
                },
            );
        });
    }

    pub fn set_bonded(&mut self, operator: &ValAddress, bonded: bool) {
        self.state.with_mut(|state| {
            if let Some(validator) = state.validators.get_mut(operator) {
                validator.bonded = bonded;
            }
        });
    }

    pub fn slashes(&self) -> Vec<SlashRecord> {
        self.state.with(|state| state.slashes.clone())
    }

    pub fn is_jailed(&self, operator: &ValAddress) -> bool {
        self.state.with(|state| {
            state
                .validators
                .get(operator)
                .map(|v| v.jailed)
                .unwrap_or(false)
        })
    }

    pub fn operators(&self) -> Vec<ValAddress> {
        self.state
            .with(|state| state.validators.keys().copied().collect())
    }
}

impl StakingKeeper for MockStaking {
    fn validator(&self, operator: &ValAddress) -> Result<Option<Validator>> {
        Ok(self
            .state
            .with(|state| state.validators.get(operator).cloned()))
    }

    fn validators_by_power(&self) -> Result<Vec<Validator>> {
        let mut validators: Vec<_> = self
            .state
            .with(|state| state.validators.values().cloned().collect());
        validators.sort_by(|a, b| {
            b.consensus_power
                .cmp(&a.consensus_power)
                .then(a.operator.cmp(&b.operator))
        });
        Ok(validators)
    }

    fn total_bonded_power(&self) -> Result<i64> {
        Ok(self.state.with(|state| {
            state
                .validators
                .values()
                .filter(|v| v.bonded)
                .map(|v| v.consensus_power)
                .sum()
        }))
    }

    fn slash(
        &mut self,
        operator: &ValAddress,
        infraction_height: i64,
        power: i64,
        fraction: Decimal,
    ) -> Result<u64> {
        self.state.with_mut(|state| {
            if !state.validators.contains_key(operator) {
                return Err(Error::NoValidatorFound(operator.to_string()));
            }
            state.slashes.push(SlashRecord {
                operator: *operator,
                infraction_height,
                power,
                fraction,
            });
            let burned = Decimal::from(power).checked_mul(fraction)?.round_to_i64()?;
            Ok(burned.max(0) as u64)
        })
    }

    fn jail(&mut self, operator: &ValAddress) -> Result<()> {
        self.state.with_mut(|state| match state.validators.get_mut(operator) {
            Some(validator) => {
                validator.jailed = true;
                Ok(())
            }
            None => Err(Error::NoValidatorFound(operator.to_string())),
        })
    }
}

#[derive(Clone, Default)]
pub struct MockBank {
    metadata: Shared<BTreeMap<String, Metadata>>,
}

impl MockBank {
    pub fn new() -> Self {
        Default::default()
    }
}

impl BankKeeper for MockBank {
    fn denom_metadata(&self, denom: &str) -> Result<Option<Metadata>> {
        Ok(self.metadata.with(|map| map.get(denom).cloned()))
    }

    fn set_denom_metadata(&mut self, metadata: Metadata) -> Result<()> {
        self.metadata.with_mut(|map| {
            map.insert(metadata.base.clone(), metadata);
        });
        Ok(())
    }
}

/// An account keeper which knows a fixed set of module accounts.
#[derive(Clone, Default)]
pub struct MockAccounts {
    modules: BTreeMap<String, AccAddress>,
}

impl MockAccounts {
    pub fn with_module(name: &str, address: AccAddress) -> Self {
        let mut modules = BTreeMap::new();
        modules.insert(name.to_string(), address);
        MockAccounts { modules }
    }
}

impl AccountKeeper for MockAccounts {
    fn module_address(&self, name: &str) -> Option<AccAddress> {
        self.modules.get(name).copied()
    }
}
