//! Narrow capabilities the oracle consumes from the staking and bank modules.
//!
//! The oracle never depends on a staking or bank implementation, only on
//! these contracts. Implementations are injected into the keeper.

use crate::address::{AccAddress, ValAddress};
use crate::decimal::Decimal;
use crate::Result;
use serde::{Deserialize, Serialize};

/// A snapshot of a validator as seen by the oracle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validator {
    pub operator: ValAddress,
    pub consensus_power: i64,
    pub bonded: bool,
    pub jailed: bool,
}

impl Validator {
    pub fn is_bonded(&self) -> bool {
        self.bonded
    }

    pub fn is_jailed(&self) -> bool {
        self.jailed
    }
}

pub trait StakingKeeper {
    /// Looks up a validator by operator address.
    fn validator(&self, operator: &ValAddress) -> Result<Option<Validator>>;

    /// Validators in the power index, highest power first.
    fn validators_by_power(&self) -> Result<Vec<Validator>>;

    /// Total consensus power of all bonded validators.
    fn total_bonded_power(&self) -> Result<i64>;

    /// Slashes `fraction` of the stake backing `power` at `infraction_height`,
    /// returning the amount burned.
    fn slash(
        &mut self,
        operator: &ValAddress,
        infraction_height: i64,
        power: i64,
        fraction: Decimal,
    ) -> Result<u64>;

    fn jail(&mut self, operator: &ValAddress) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
    pub aliases: Vec<String>,
}

/// Display metadata for a denom, registered for every new vote target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub description: String,
    pub denom_units: Vec<DenomUnit>,
    pub base: String,
    pub display: String,
    pub name: String,
    pub symbol: String,
}

impl Metadata {
    /// Builds micro/milli/whole unit metadata for a base denom, e.g. `ukii`
    /// becomes display `kii` with units `ukii` (0), `mkii` (3) and `kii` (6).
    pub fn for_base_denom(base: &str) -> Self {
        let display: String = base.chars().skip(1).collect();
        let symbol = display.to_uppercase();
        Metadata {
            description: display.clone(),
            denom_units: vec![
                DenomUnit {
                    denom: format!("u{}", display),
                    exponent: 0,
                    aliases: vec![format!("micro{}", display)],
                },
                DenomUnit {
                    denom: format!("m{}", display),
                    exponent: 3,
                    aliases: vec![format!("mili{}", display)],
                },
                DenomUnit {
                    denom: display.clone(),
                    exponent: 6,
                    aliases: vec![],
                },
            ],
            base: base.to_string(),
            display,
            name: symbol.clone(),
            symbol,
        }
    }
}

pub trait BankKeeper {
    fn denom_metadata(&self, denom: &str) -> Result<Option<Metadata>>;
    fn set_denom_metadata(&mut self, metadata: Metadata) -> Result<()>;
}

pub trait AccountKeeper {
    /// The address of a module account, or `None` if it was never created.
    fn module_address(&self, name: &str) -> Option<AccAddress>;
}
